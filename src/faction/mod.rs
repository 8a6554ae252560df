//! Village controllers and their raid AI

pub mod collective;
pub mod engine;
pub mod raid;
pub mod state;
pub mod trigger;
pub mod villain;

use serde::{Deserialize, Serialize};

use crate::core::types::{FactionId, LevelId, TribeId};

pub use collective::Collective;
pub use raid::{CancelReason, IncomingAttack, RaidStatus, RaidTask, RaidTeam, TeamRoster};
pub use state::FactionState;
pub use trigger::Trigger;
pub use villain::{RaidBehavior, Ransom, SpawnGroup, Villain, WelcomeMessage};

/// A village: a collective of actors with an optional raiding villain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Faction {
    pub id: FactionId,
    pub name: String,
    pub tribe: TribeId,
    pub home_level: LevelId,
    pub collective: Collective,
    pub state: FactionState,
    pub villain: Option<Villain>,
    /// The faction raids are aimed at
    pub enemy: Option<FactionId>,
    pub teams: TeamRoster,
    /// Raids launched against this faction that the host has not resolved
    pub incoming: Vec<IncomingAttack>,
}

impl Faction {
    pub fn new(id: FactionId, name: impl Into<String>, tribe: TribeId, home_level: LevelId) -> Self {
        Self {
            id,
            name: name.into(),
            tribe,
            home_level,
            collective: Collective::new(),
            state: FactionState::new(),
            villain: None,
            enemy: None,
            teams: TeamRoster::new(),
            incoming: Vec::new(),
        }
    }
}
