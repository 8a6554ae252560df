//! Save and restore
//!
//! A snapshot keeps ids, times, faction state, raid teams, connectors, the
//! clock and the rng stream. Levels and minds are not serialized: the host
//! rebuilds them and hands them back on restore, and the reachability table
//! is recomputed from the saved connectors.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::config::SimulationConfig;
use crate::core::error::{DelveError, Result};
use crate::core::types::{ActorId, ShardCoord, ShardId, Time, TribeId};
use crate::ecs::world::World;
use crate::entity::actor::{ActorState, Placement};
use crate::entity::mind::Mind;
use crate::faction::Faction;
use crate::simulation::clock::WorldClock;
use crate::simulation::events::EventLog;
use crate::world::graph::Link;
use crate::world::level::Level;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub config: SimulationConfig,
    pub current_time: Time,
    pub clock: WorldClock,
    pub next_actor_id: u64,
    /// Living actors; their `local_time` is their place in the queue
    pub actors: Vec<ActorState>,
    pub dead: Vec<ActorState>,
    pub factions: Vec<Faction>,
    pub links: Vec<Link>,
    pub level_shards: Vec<ShardId>,
    pub shards: Vec<(ShardId, ShardCoord)>,
    pub active_shard: Option<ShardId>,
    pub hostile_tribes: Vec<(TribeId, TribeId)>,
    pub possessed: Option<ActorId>,
    pub events: EventLog,
    pub rng: ChaCha8Rng,
}

impl WorldSnapshot {
    /// Capture the world between two `advance` calls
    pub fn capture(world: &World) -> Self {
        Self {
            config: world.config.clone(),
            current_time: world.current_time,
            clock: world.clock.clone(),
            next_actor_id: world.next_actor_id,
            actors: world.actors.values().cloned().collect(),
            dead: world.dead.values().cloned().collect(),
            factions: world.factions.clone(),
            links: world.graph.links().to_vec(),
            level_shards: world.level_shards.clone(),
            shards: world.shards.iter().map(|(id, coord)| (*id, *coord)).collect(),
            active_shard: world.active_shard,
            hostile_tribes: world.hostile_tribes.iter().copied().collect(),
            possessed: world.possessed,
            events: world.events.clone(),
            rng: world.rng.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        info!("Saved world at time {} to {}", self.current_time, path.display());
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        debug!("Loading world snapshot from {}", path.display());
        Self::from_json(&json)
    }

    /// Rebuild a world from this snapshot
    ///
    /// `levels` must be the same levels, in the same order, as when the
    /// snapshot was taken. Actors the host has not already placed are put
    /// back on their saved tiles. `mind_for` supplies each living actor's
    /// turn logic.
    pub fn restore(
        self,
        levels: Vec<Box<dyn Level>>,
        mut mind_for: impl FnMut(&ActorState) -> Box<dyn Mind>,
    ) -> Result<World> {
        if levels.len() != self.level_shards.len() {
            return Err(DelveError::Config(format!(
                "snapshot has {} levels, {} supplied",
                self.level_shards.len(),
                levels.len()
            )));
        }

        let mut world = World::with_rng(self.config, self.rng)?;
        world.shards = self.shards.into_iter().collect::<BTreeMap<_, _>>();
        for (level, shard) in levels.into_iter().zip(self.level_shards) {
            world.add_level(level, shard)?;
        }
        for link in &self.links {
            world
                .graph
                .add_connector(link.direction, link.key, link.from, link.to)?;
        }
        world.graph.build_reachability()?;

        for actor in self.actors {
            if let Placement::OnLevel { level, position } = actor.placement {
                let target = world.level_mut(level)?;
                match target.position_of(actor.id) {
                    Some(at) if at == position => {}
                    Some(at) => {
                        return Err(DelveError::Placement(format!(
                            "{:?} is at {:?} on restored level, saved at {:?}",
                            actor.id, at, position
                        )))
                    }
                    None => target.place_actor(position, actor.id)?,
                }
            }
            world.queue.insert(actor.id, actor.local_time)?;
            world.minds.insert(actor.id, mind_for(&actor));
            world.actors.insert(actor.id, actor);
        }
        world.dead = self.dead.into_iter().map(|a| (a.id, a)).collect();
        world.factions = self.factions;
        world.hostile_tribes = self.hostile_tribes.into_iter().collect();
        world.active_shard = self.active_shard;
        world.possessed = self.possessed;
        world.events = self.events;
        world.clock = self.clock;
        world.current_time = self.current_time;
        world.next_actor_id = self.next_actor_id;
        Ok(world)
    }
}
