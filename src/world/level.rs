//! Level collaborator interface and a grid-backed reference level
//!
//! The scheduler never looks inside a level. It only needs to tick it, ask
//! where connectors land and place or remove actors by id.

use std::collections::BTreeMap;

use ahash::AHashMap;

use crate::core::error::{DelveError, Result};
use crate::core::types::{ActorId, ConnectorKey, Direction, Position, Time};

/// A sub-map of the world, simulated independently of the others
pub trait Level: Send {
    fn name(&self) -> &str;

    /// Periodic logic, called once per tick boundary
    fn tick(&mut self, _now: Time) {}

    /// Every connector key this level exposes, without duplicates
    fn connector_keys(&self) -> Vec<ConnectorKey>;

    fn has_connector(&self, key: ConnectorKey) -> bool {
        self.connector_keys().contains(&key)
    }

    /// Where an actor arriving through `(direction, key)` may be placed
    fn landing_positions(&self, direction: Direction, key: ConnectorKey) -> Vec<Position>;

    /// Where actors transferred from another shard may be placed
    fn arrival_positions(&self) -> Vec<Position>;

    fn place_actor(&mut self, position: Position, actor: ActorId) -> Result<()>;

    fn remove_actor(&mut self, actor: ActorId);

    fn actor_at(&self, position: Position) -> Option<ActorId>;

    fn position_of(&self, actor: ActorId) -> Option<Position>;

    fn move_actor(&mut self, actor: ActorId, to: Position) -> Result<()> {
        let from = self
            .position_of(actor)
            .ok_or_else(|| DelveError::Placement(format!("{:?} is not on {}", actor, self.name())))?;
        self.remove_actor(actor);
        if let Err(e) = self.place_actor(to, actor) {
            self.place_actor(from, actor)?;
            return Err(e);
        }
        Ok(())
    }
}

/// Rectangular level with at most one actor per tile
#[derive(Debug, Clone)]
pub struct GridLevel {
    name: String,
    width: i32,
    height: i32,
    connectors: BTreeMap<(Direction, ConnectorKey), Vec<Position>>,
    occupants: AHashMap<Position, ActorId>,
    positions: AHashMap<ActorId, Position>,
    ticks: u64,
}

impl GridLevel {
    pub fn new(name: impl Into<String>, width: i32, height: i32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            connectors: BTreeMap::new(),
            occupants: AHashMap::new(),
            positions: AHashMap::new(),
            ticks: 0,
        }
    }

    /// Add a connector end (for example the down staircase of `key`)
    pub fn with_connector(mut self, direction: Direction, key: ConnectorKey, at: Position) -> Self {
        self.connectors.entry((direction, key)).or_default().push(at);
        self
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    /// Number of tick boundaries this level has seen
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn actor_count(&self) -> usize {
        self.positions.len()
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width && pos.y < self.height
    }

    /// Free tiles nearest to `around`, ring by ring
    fn free_tiles_near(&self, around: Position) -> Vec<Position> {
        let radius = self.width.max(self.height);
        for r in 1..=radius {
            let ring: Vec<Position> = (-r..=r)
                .flat_map(|dx| (-r..=r).map(move |dy| (dx, dy)))
                .filter(|(dx, dy)| dx.abs() == r || dy.abs() == r)
                .map(|(dx, dy)| Position::new(around.x + dx, around.y + dy))
                .filter(|p| self.in_bounds(*p) && !self.occupants.contains_key(p))
                .collect();
            if !ring.is_empty() {
                return ring;
            }
        }
        Vec::new()
    }
}

impl Level for GridLevel {
    fn name(&self) -> &str {
        &self.name
    }

    fn tick(&mut self, _now: Time) {
        self.ticks += 1;
    }

    fn connector_keys(&self) -> Vec<ConnectorKey> {
        let mut keys: Vec<ConnectorKey> = self.connectors.keys().map(|(_, key)| *key).collect();
        keys.sort();
        keys.dedup();
        keys
    }

    fn landing_positions(&self, direction: Direction, key: ConnectorKey) -> Vec<Position> {
        let Some(stairs) = self.connectors.get(&(direction, key)) else {
            return Vec::new();
        };
        let free: Vec<Position> = stairs
            .iter()
            .copied()
            .filter(|p| !self.occupants.contains_key(p))
            .collect();
        if !free.is_empty() {
            return free;
        }
        // Staircase blocked: land next to it
        stairs
            .first()
            .map(|s| self.free_tiles_near(*s))
            .unwrap_or_default()
    }

    fn arrival_positions(&self) -> Vec<Position> {
        (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| Position::new(x, y)))
            .filter(|p| !self.occupants.contains_key(p))
            .take(64)
            .collect()
    }

    fn place_actor(&mut self, position: Position, actor: ActorId) -> Result<()> {
        if !self.in_bounds(position) {
            return Err(DelveError::Placement(format!(
                "{:?} is outside {} ({}x{})",
                position, self.name, self.width, self.height
            )));
        }
        if let Some(other) = self.occupants.get(&position) {
            return Err(DelveError::Placement(format!(
                "{:?} on {} is occupied by {:?}",
                position, self.name, other
            )));
        }
        if self.positions.contains_key(&actor) {
            return Err(DelveError::Placement(format!(
                "{:?} is already placed on {}",
                actor, self.name
            )));
        }
        self.occupants.insert(position, actor);
        self.positions.insert(actor, position);
        Ok(())
    }

    fn remove_actor(&mut self, actor: ActorId) {
        if let Some(pos) = self.positions.remove(&actor) {
            self.occupants.remove(&pos);
        }
    }

    fn actor_at(&self, position: Position) -> Option<ActorId> {
        self.occupants.get(&position).copied()
    }

    fn position_of(&self, actor: ActorId) -> Option<Position> {
        self.positions.get(&actor).copied()
    }
}
