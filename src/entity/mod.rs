pub mod actor;
pub mod mind;

pub use actor::{ActorState, ActorTemplate, ActorTrait, Placement};
pub use mind::{IdleMind, Mind, Request, Turn};
