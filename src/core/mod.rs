pub mod config;
pub mod error;
pub mod types;

pub use config::{RaidTuning, SimulationConfig};
pub use error::{DelveError, Result};
