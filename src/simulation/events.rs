//! World events recorded for the host

use serde::{Deserialize, Serialize};

use crate::core::types::{ActorId, FactionId, LevelId, TeamId, Time};
use crate::faction::raid::CancelReason;

/// A recorded event
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorldEvent {
    pub time: Time,
    pub kind: EventKind,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    // Raids
    RaidLaunched {
        attacker: FactionId,
        target: FactionId,
        team: TeamId,
        members: Vec<ActorId>,
    },
    RaidCancelled {
        faction: FactionId,
        team: TeamId,
        reason: CancelReason,
    },
    RansomDemanded {
        attacker: FactionId,
        target: FactionId,
        amount: u32,
    },
    RansomPaid {
        attacker: FactionId,
        target: FactionId,
        amount: u32,
    },

    // Messages to the player
    Welcome { faction: FactionId, actor: ActorId, text: String },
    TheftWarning { faction: FactionId, thief: ActorId },

    // Actors
    ActorDied { actor: ActorId, killer: Option<ActorId> },
    LevelChanged { actor: ActorId, from: Option<LevelId>, to: LevelId },
    PossessionChanged { from: Option<ActorId>, to: Option<ActorId> },
}

/// Append-only buffer the host drains between `advance` calls
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EventLog {
    events: Vec<WorldEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, time: Time, kind: EventKind) {
        self.events.push(WorldEvent { time, kind });
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorldEvent> {
        self.events.iter()
    }

    pub fn drain(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }
}
