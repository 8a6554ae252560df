//! Turn scheduling

pub mod queue;

pub use queue::{ActorQueue, Scheduled};
