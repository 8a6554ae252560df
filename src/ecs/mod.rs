pub mod world;

pub use world::{World, HOME_SHARD};
