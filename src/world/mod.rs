//! Levels and the connector graph between them

pub mod builder;
pub mod graph;
pub mod level;

pub use builder::{BuiltLevels, CancelFlag, LevelBuilder};
pub use graph::{Hop, Link, WorldGraph};
pub use level::{GridLevel, Level};
