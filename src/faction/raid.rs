//! Raid teams and their lifecycle
//!
//! A team is `Formed` when the decision engine launches it and becomes
//! `Active` once its members have been given their tasks. It ends in one of
//! the `CancelReason` states, at which point the roster entry is removed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::types::{ActorId, FactionId, TeamId, Time};
use crate::faction::villain::SpawnGroup;

/// Task handed to every member of a raid team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RaidTask {
    AttackLeader {
        target: FactionId,
    },
    KillFighters {
        target: FactionId,
        count: u32,
    },
    /// Take gold from the target and carry it back home
    StealFrom {
        target: FactionId,
        deliver_to: FactionId,
    },
    /// Set up a camp near the target and send waves of spawned attackers
    CampAndSpawn {
        target: FactionId,
        spawns: SpawnGroup,
        camp_size: u32,
        wave_size: (u32, u32),
        waves: u32,
    },
}

impl RaidTask {
    pub fn target(&self) -> FactionId {
        match self {
            RaidTask::AttackLeader { target }
            | RaidTask::KillFighters { target, .. }
            | RaidTask::StealFrom { target, .. }
            | RaidTask::CampAndSpawn { target, .. } => *target,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaidStatus {
    Formed,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CancelReason {
    /// Too few members left standing
    Attrition,
    /// The enemy paid the ransom
    Ransom,
    /// Every member completed or lost its task
    Abandoned,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RaidTeam {
    pub id: TeamId,
    pub members: Vec<ActorId>,
    /// Size at launch, the baseline for attrition
    pub initial_size: usize,
    pub enemy: FactionId,
    pub ransom: Option<u32>,
    pub formed_at: Time,
    pub status: RaidStatus,
}

impl RaidTeam {
    /// Fewer than half of the original members are among `surviving`
    ///
    /// A lone survivor that is seriously wounded also counts as broken; the
    /// caller supplies that check since wounds live on the actor.
    pub fn below_half(&self, surviving: usize) -> bool {
        surviving < (self.initial_size + 1) / 2
    }
}

/// An attack the enemy is told about, so its host can offer the ransom
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingAttack {
    pub attacker: FactionId,
    pub team: TeamId,
    pub members: Vec<ActorId>,
    pub ransom: Option<u32>,
}

/// All teams a faction has in the field
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamRoster {
    teams: BTreeMap<TeamId, RaidTeam>,
    next_id: u32,
}

impl TeamRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &mut self,
        members: Vec<ActorId>,
        enemy: FactionId,
        ransom: Option<u32>,
        now: Time,
    ) -> TeamId {
        let id = TeamId(self.next_id);
        self.next_id += 1;
        let initial_size = members.len();
        self.teams.insert(
            id,
            RaidTeam {
                id,
                members,
                initial_size,
                enemy,
                ransom,
                formed_at: now,
                status: RaidStatus::Formed,
            },
        );
        id
    }

    pub fn activate(&mut self, team: TeamId) {
        if let Some(t) = self.teams.get_mut(&team) {
            t.status = RaidStatus::Active;
        }
    }

    /// Remove a team, returning it if it existed; cancelling twice is a no-op
    pub fn cancel(&mut self, team: TeamId) -> Option<RaidTeam> {
        self.teams.remove(&team)
    }

    pub fn get(&self, team: TeamId) -> Option<&RaidTeam> {
        self.teams.get(&team)
    }

    pub fn ids(&self) -> Vec<TeamId> {
        self.teams.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RaidTeam> {
        self.teams.values()
    }

    pub fn members(&self, team: TeamId) -> &[ActorId] {
        self.teams
            .get(&team)
            .map(|t| t.members.as_slice())
            .unwrap_or(&[])
    }

    pub fn contains_member(&self, actor: ActorId) -> bool {
        self.teams.values().any(|t| t.members.contains(&actor))
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    /// Drop members the predicate reports dead; returns how many were pruned
    pub fn prune_dead(&mut self, mut is_dead: impl FnMut(ActorId) -> bool) -> usize {
        let mut pruned = 0;
        for team in self.teams.values_mut() {
            let before = team.members.len();
            team.members.retain(|m| !is_dead(*m));
            pruned += before - team.members.len();
        }
        pruned
    }
}
