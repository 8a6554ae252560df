//! Roster, treasury, territory and task board of a faction

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::types::{ActorId, Position, RoomKind};
use crate::faction::raid::RaidTask;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Collective {
    members: Vec<ActorId>,
    leader: Option<ActorId>,
    gold: u32,
    /// Tiles on the home level
    territory: BTreeSet<Position>,
    rooms: BTreeMap<RoomKind, u32>,
    tasks: BTreeMap<ActorId, RaidTask>,
}

impl Collective {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn members(&self) -> &[ActorId] {
        &self.members
    }

    pub fn add_member(&mut self, actor: ActorId) {
        if !self.members.contains(&actor) {
            self.members.push(actor);
        }
    }

    pub fn remove_member(&mut self, actor: ActorId) {
        self.members.retain(|m| *m != actor);
        self.tasks.remove(&actor);
        if self.leader == Some(actor) {
            self.leader = None;
        }
    }

    pub fn leader(&self) -> Option<ActorId> {
        self.leader
    }

    pub fn set_leader(&mut self, actor: ActorId) {
        self.add_member(actor);
        self.leader = Some(actor);
    }

    pub fn gold(&self) -> u32 {
        self.gold
    }

    pub fn add_gold(&mut self, amount: u32) {
        self.gold = self.gold.saturating_add(amount);
    }

    /// Remove up to `amount` gold, returning what was actually taken
    pub fn take_gold(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.gold);
        self.gold -= taken;
        taken
    }

    pub fn add_territory(&mut self, tiles: impl IntoIterator<Item = Position>) {
        self.territory.extend(tiles);
    }

    pub fn in_territory(&self, pos: Position) -> bool {
        self.territory.contains(&pos)
    }

    pub fn territory(&self) -> &BTreeSet<Position> {
        &self.territory
    }

    pub fn add_room(&mut self, kind: RoomKind) {
        *self.rooms.entry(kind).or_insert(0) += 1;
    }

    pub fn rooms(&self) -> &BTreeMap<RoomKind, u32> {
        &self.rooms
    }

    pub fn room_count(&self, kind: RoomKind) -> u32 {
        self.rooms.get(&kind).copied().unwrap_or(0)
    }

    pub fn set_task(&mut self, actor: ActorId, task: RaidTask) {
        self.tasks.insert(actor, task);
    }

    pub fn cancel_task(&mut self, actor: ActorId) -> Option<RaidTask> {
        self.tasks.remove(&actor)
    }

    pub fn has_task(&self, actor: ActorId) -> bool {
        self.tasks.contains_key(&actor)
    }

    pub fn task_of(&self, actor: ActorId) -> Option<&RaidTask> {
        self.tasks.get(&actor)
    }

    /// Drop members the predicate rejects, along with their tasks
    pub fn retain_members(&mut self, mut keep: impl FnMut(ActorId) -> bool) -> usize {
        let before = self.members.len();
        let dropped: Vec<ActorId> = self.members.iter().copied().filter(|m| !keep(*m)).collect();
        for actor in dropped {
            self.remove_member(actor);
        }
        before - self.members.len()
    }
}
