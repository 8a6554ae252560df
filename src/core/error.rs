use thiserror::Error;

use crate::core::types::{ActorId, FactionId, LevelId, Time};

#[derive(Error, Debug)]
pub enum DelveError {
    #[error("Actor not found: {0:?}")]
    UnknownActor(ActorId),

    #[error("Actor {0:?} is not scheduled")]
    NotScheduled(ActorId),

    #[error("Actor {0:?} is already scheduled")]
    AlreadyScheduled(ActorId),

    #[error("Invalid time {time} for actor {actor:?}")]
    InvalidTime { actor: ActorId, time: Time },

    #[error("Cannot advance to non-finite time {0}")]
    InvalidTarget(Time),

    #[error("Level not found: {0:?}")]
    UnknownLevel(LevelId),

    #[error("Faction not found: {0:?}")]
    UnknownFaction(FactionId),

    #[error("No route from {from:?} to {to:?}")]
    NoRoute { from: LevelId, to: LevelId },

    #[error("Topology error: {0}")]
    Topology(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Placement error: {0}")]
    Placement(String),

    #[error("Level construction failed: {0}")]
    Build(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, DelveError>;
