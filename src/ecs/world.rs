//! World - arena owning every actor, level and faction
//!
//! Everything is addressed by stable ids. The scheduler queue only holds ids
//! and times; the `actors` map owns actor state and a level owns the tile an
//! actor stands on. An actor between levels is `InTransit` and owned by
//! nothing but the arena.

use std::collections::{BTreeMap, BTreeSet};

use ahash::AHashMap;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::core::config::SimulationConfig;
use crate::core::error::{DelveError, Result};
use crate::core::types::{
    ActorId, ConnectorKey, Direction, FactionId, ItemId, LevelId, Position, ShardCoord, ShardId,
    Time, TribeId,
};
use crate::entity::actor::{ActorState, ActorTemplate, ActorTrait, Placement};
use crate::entity::mind::Mind;
use crate::faction::raid::CancelReason;
use crate::faction::trigger::Trigger;
use crate::faction::villain::Villain;
use crate::faction::{engine, Faction};
use crate::schedule::queue::ActorQueue;
use crate::simulation::clock::WorldClock;
use crate::simulation::events::{EventKind, EventLog, WorldEvent};
use crate::simulation::tick::TickHook;
use crate::world::builder::BuiltLevels;
use crate::world::graph::{Hop, WorldGraph};
use crate::world::level::Level;

/// The shard every world starts with
pub const HOME_SHARD: ShardId = ShardId(0);

pub struct World {
    pub(crate) config: SimulationConfig,
    pub(crate) actors: BTreeMap<ActorId, ActorState>,
    pub(crate) minds: AHashMap<ActorId, Box<dyn Mind>>,
    /// Cemetery: dead actors are kept for inspection, never rescheduled
    pub(crate) dead: BTreeMap<ActorId, ActorState>,
    pub(crate) levels: Vec<Box<dyn Level>>,
    pub(crate) level_shards: Vec<ShardId>,
    pub(crate) shards: BTreeMap<ShardId, ShardCoord>,
    /// Shard the player is currently in, if the world is being played
    pub(crate) active_shard: Option<ShardId>,
    pub(crate) graph: WorldGraph,
    pub(crate) queue: ActorQueue,
    pub(crate) factions: Vec<Faction>,
    /// Unordered pairs, stored with the smaller tribe first
    pub(crate) hostile_tribes: BTreeSet<(TribeId, TribeId)>,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) events: EventLog,
    pub(crate) next_actor_id: u64,
    pub(crate) current_time: Time,
    pub(crate) clock: WorldClock,
    /// Level of the actor whose turn is running
    pub(crate) acting_level: Option<LevelId>,
    pub(crate) possessed: Option<ActorId>,
    pub(crate) hooks: Vec<Box<dyn TickHook>>,
}

impl World {
    pub fn new(config: SimulationConfig, seed: u64) -> Result<Self> {
        Self::with_rng(config, ChaCha8Rng::seed_from_u64(seed))
    }

    pub(crate) fn with_rng(config: SimulationConfig, rng: ChaCha8Rng) -> Result<Self> {
        config.validate().map_err(DelveError::Config)?;
        let mut shards = BTreeMap::new();
        shards.insert(HOME_SHARD, ShardCoord::default());
        Ok(Self {
            clock: WorldClock::new(config.tick_interval),
            config,
            actors: BTreeMap::new(),
            minds: AHashMap::new(),
            dead: BTreeMap::new(),
            levels: Vec::new(),
            level_shards: Vec::new(),
            shards,
            active_shard: None,
            graph: WorldGraph::new(),
            queue: ActorQueue::new(),
            factions: Vec::new(),
            hostile_tribes: BTreeSet::new(),
            rng,
            events: EventLog::new(),
            next_actor_id: 0,
            current_time: 0.0,
            acting_level: None,
            possessed: None,
            hooks: Vec::new(),
        })
    }

    // ---- construction -------------------------------------------------

    pub fn add_shard(&mut self, shard: ShardId, coord: ShardCoord) -> Result<()> {
        if self.shards.contains_key(&shard) {
            return Err(DelveError::Config(format!("shard {:?} registered twice", shard)));
        }
        self.shards.insert(shard, coord);
        Ok(())
    }

    pub fn add_level(&mut self, level: Box<dyn Level>, shard: ShardId) -> Result<LevelId> {
        if !self.shards.contains_key(&shard) {
            return Err(DelveError::Config(format!("unknown shard {:?}", shard)));
        }
        let id = LevelId(self.levels.len() as u32);
        debug!("Adding level {} as {:?} in {:?}", level.name(), id, shard);
        self.levels.push(level);
        self.level_shards.push(shard);
        self.graph.add_level(id);
        Ok(id)
    }

    /// Register levels handed back by a `LevelBuilder`
    pub fn install_levels(&mut self, levels: BuiltLevels, shard: ShardId) -> Result<Vec<LevelId>> {
        levels
            .into_iter()
            .map(|level| self.add_level(level, shard))
            .collect()
    }

    /// Connect two levels; both must expose `key`
    pub fn link_levels(
        &mut self,
        direction: Direction,
        key: ConnectorKey,
        from: LevelId,
        to: LevelId,
    ) -> Result<()> {
        for level in [from, to] {
            let l = self.level(level).ok_or(DelveError::UnknownLevel(level))?;
            if !l.has_connector(key) {
                return Err(DelveError::Config(format!(
                    "level {} has no connector {:?}",
                    l.name(),
                    key
                )));
            }
        }
        self.graph.add_connector(direction, key, from, to)
    }

    /// Close the level graph; must run after the last `link_levels`
    pub fn finish_construction(&mut self) -> Result<()> {
        self.graph.build_reachability()
    }

    pub fn add_faction(
        &mut self,
        name: impl Into<String>,
        tribe: TribeId,
        home_level: LevelId,
    ) -> Result<FactionId> {
        if self.level(home_level).is_none() {
            return Err(DelveError::UnknownLevel(home_level));
        }
        let id = FactionId(self.factions.len() as u32);
        self.factions.push(Faction::new(id, name, tribe, home_level));
        Ok(id)
    }

    pub fn set_villain(&mut self, faction: FactionId, villain: Villain) -> Result<()> {
        villain.validate(&self.config.raid)?;
        self.faction_mut(faction)?.villain = Some(villain);
        Ok(())
    }

    pub fn set_enemy(&mut self, faction: FactionId, enemy: FactionId) -> Result<()> {
        if faction == enemy {
            return Err(DelveError::Config(format!("{:?} cannot be its own enemy", faction)));
        }
        self.faction(enemy)?;
        self.faction_mut(faction)?.enemy = Some(enemy);
        Ok(())
    }

    pub fn declare_hostile(&mut self, a: TribeId, b: TribeId) {
        self.hostile_tribes.insert((a.min(b), a.max(b)));
    }

    pub fn is_hostile(&self, a: TribeId, b: TribeId) -> bool {
        self.hostile_tribes.contains(&(a.min(b), a.max(b)))
    }

    pub fn set_active_shard(&mut self, shard: Option<ShardId>) {
        self.active_shard = shard;
    }

    pub fn add_tick_hook(&mut self, hook: Box<dyn TickHook>) {
        self.hooks.push(hook);
    }

    // ---- actors -------------------------------------------------------

    /// Place a new actor; its first turn comes `spawn_delay` after now
    pub fn spawn_actor(
        &mut self,
        template: ActorTemplate,
        level: LevelId,
        position: Position,
        mind: Box<dyn Mind>,
    ) -> Result<ActorId> {
        if let Some(faction) = template.faction {
            self.faction(faction)?;
        }
        let id = ActorId(self.next_actor_id);
        let time = self.current_time + self.config.spawn_delay;
        self.level_mut(level)?.place_actor(position, id)?;
        self.next_actor_id += 1;

        let mut actor = ActorState::from_template(id, template, time);
        actor.placement = Placement::OnLevel { level, position };
        if let Some(faction) = actor.faction {
            let is_leader = actor.has_trait(ActorTrait::Leader);
            let collective = &mut self.faction_mut(faction)?.collective;
            collective.add_member(id);
            if is_leader {
                collective.set_leader(id);
            }
        }
        debug!("Spawned {} as {:?} at {:?}, first turn at {}", actor.name, id, position, time);
        self.actors.insert(id, actor);
        self.minds.insert(id, mind);
        self.queue.insert(id, time)?;
        Ok(id)
    }

    pub fn actor(&self, id: ActorId) -> Option<&ActorState> {
        self.actors.get(&id)
    }

    pub(crate) fn actor_mut(&mut self, id: ActorId) -> Result<&mut ActorState> {
        self.actors.get_mut(&id).ok_or(DelveError::UnknownActor(id))
    }

    pub fn dead_actor(&self, id: ActorId) -> Option<&ActorState> {
        self.dead.get(&id)
    }

    pub fn is_alive(&self, id: ActorId) -> bool {
        self.actors.contains_key(&id)
    }

    /// Living actors in id order
    pub fn actors(&self) -> impl Iterator<Item = &ActorState> {
        self.actors.values()
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    pub fn dead_count(&self) -> usize {
        self.dead.len()
    }

    pub fn set_wounded(&mut self, actor: ActorId, wounded: bool) -> Result<()> {
        self.actor_mut(actor)?.seriously_wounded = wounded;
        Ok(())
    }

    /// Move a living actor's next turn to `time`
    ///
    /// Only actors in the queue can be moved; the dead and unknown get
    /// `NotScheduled`.
    pub fn set_local_time(&mut self, actor: ActorId, time: Time) -> Result<()> {
        self.queue.reschedule(actor, time)?;
        self.actor_mut(actor)?.local_time = time;
        Ok(())
    }

    /// Move an actor within its level
    pub fn move_actor(&mut self, actor: ActorId, to: Position) -> Result<()> {
        let level = self
            .actor(actor)
            .ok_or(DelveError::UnknownActor(actor))?
            .level()
            .ok_or_else(|| DelveError::Placement(format!("{:?} is in transit", actor)))?;
        self.level_mut(level)?.move_actor(actor, to)?;
        self.actor_mut(actor)?.placement = Placement::OnLevel { level, position: to };
        Ok(())
    }

    /// Take a connector out of the actor's current level
    pub fn change_level(&mut self, actor: ActorId, hop: Hop) -> Result<LevelId> {
        let from = self
            .actor(actor)
            .ok_or(DelveError::UnknownActor(actor))?
            .level()
            .ok_or_else(|| DelveError::Placement(format!("{:?} is in transit", actor)))?;
        let to = self.graph.follow(from, hop).ok_or_else(|| {
            DelveError::Topology(format!("{:?} has no connector {:?} {:?}", from, hop.direction, hop.key))
        })?;
        // Arrive at the other end of the same connector
        let landing = self.graph.landing_positions(&self.levels, to, hop.reversed())?;
        self.relocate(actor, from, to, landing)?;
        Ok(to)
    }

    /// Take the next connector on the way to `destination`
    ///
    /// Returns the level the actor ended up on. Already being there is not
    /// an error.
    pub fn travel_toward(&mut self, actor: ActorId, destination: LevelId) -> Result<LevelId> {
        let from = self
            .actor(actor)
            .ok_or(DelveError::UnknownActor(actor))?
            .level()
            .ok_or_else(|| DelveError::Placement(format!("{:?} is in transit", actor)))?;
        match self.graph.resolve_hop(from, destination)? {
            None => Ok(from),
            Some(hop) => self.change_level(actor, hop),
        }
    }

    /// Move an actor to another shard, onto any free arrival tile of `level`
    pub fn transfer_actor(&mut self, actor: ActorId, level: LevelId) -> Result<()> {
        let from = self
            .actor(actor)
            .ok_or(DelveError::UnknownActor(actor))?
            .level()
            .ok_or_else(|| DelveError::Placement(format!("{:?} is in transit", actor)))?;
        if from == level {
            return Ok(());
        }
        let landing = self
            .level(level)
            .ok_or(DelveError::UnknownLevel(level))?
            .arrival_positions();
        self.relocate(actor, from, level, landing)
    }

    /// Lift an actor off `from` and place it on the first free candidate tile
    /// of `to`; on failure it goes back where it was
    pub(crate) fn relocate(&mut self, actor: ActorId, from: LevelId, to: LevelId, candidates: Vec<Position>) -> Result<()> {
        let origin = self
            .actor(actor)
            .and_then(|a| a.position())
            .ok_or(DelveError::UnknownActor(actor))?;
        self.level_mut(from)?.remove_actor(actor);
        self.actor_mut(actor)?.placement = Placement::InTransit;

        let target = self.level_mut(to)?;
        let landed = candidates
            .into_iter()
            .find(|pos| target.place_actor(*pos, actor).is_ok());
        let Some(position) = landed else {
            self.level_mut(from)?.place_actor(origin, actor)?;
            self.actor_mut(actor)?.placement = Placement::OnLevel {
                level: from,
                position: origin,
            };
            return Err(DelveError::Placement(format!(
                "no free landing tile for {:?} on {:?}",
                actor, to
            )));
        };

        self.actor_mut(actor)?.placement = Placement::OnLevel { level: to, position };
        if self.acting_level == Some(from) {
            self.acting_level = Some(to);
        }
        self.events.push(
            self.current_time,
            EventKind::LevelChanged {
                actor,
                from: Some(from),
                to,
            },
        );
        debug!("{:?} moved from {:?} to {:?} at {:?}", actor, from, to, position);
        Ok(())
    }

    /// Resolve an attack; a non-lethal strike leaves the victim seriously wounded
    pub fn strike(&mut self, attacker: ActorId, victim: ActorId, lethal: bool) -> Result<()> {
        let Some(target) = self.actors.get_mut(&victim) else {
            warn!("{:?} struck {:?}, which is not alive", attacker, victim);
            return Ok(());
        };
        target.last_attacker = Some(attacker);
        if lethal {
            self.kill(victim, Some(attacker))
        } else {
            target.seriously_wounded = true;
            Ok(())
        }
    }

    /// Remove an actor from play and move it to the cemetery
    ///
    /// Factions whose enemy did the killing record a victim. Killing the dead
    /// is a no-op.
    pub fn kill(&mut self, victim: ActorId, killer: Option<ActorId>) -> Result<()> {
        let Some(mut state) = self.actors.remove(&victim) else {
            warn!("Tried to kill {:?}, which is not alive", victim);
            return Ok(());
        };
        if let Some(level) = state.level() {
            self.level_mut(level)?.remove_actor(victim);
        }
        if self.queue.contains(victim) {
            self.queue.remove(victim)?;
        }
        self.minds.remove(&victim);
        state.alive = false;

        let killer_faction = killer.and_then(|k| self.faction_of(k));
        if let Some(killer_faction) = killer_faction {
            let weight = self.config.raid.other_victim_weight;
            for faction in &mut self.factions {
                if faction.enemy != Some(killer_faction) {
                    continue;
                }
                if state.faction == Some(faction.id) {
                    faction.state.record_member_killed();
                } else if state.tribe == faction.tribe {
                    faction.state.record_kin_killed(weight);
                }
            }
        }

        if self.possessed == Some(victim) {
            self.possessed = None;
            self.events.push(
                self.current_time,
                EventKind::PossessionChanged {
                    from: Some(victim),
                    to: None,
                },
            );
        }
        self.events
            .push(self.current_time, EventKind::ActorDied { actor: victim, killer });
        debug!("{} ({:?}) died at {}", state.name, victim, self.current_time);
        self.dead.insert(victim, state);
        Ok(())
    }

    /// An actor picked items up; villages watching their stores may notice
    pub fn pick_up(&mut self, actor: ActorId, items: Vec<ItemId>) -> Result<()> {
        let (faction, level, position) = {
            let state = self.actor(actor).ok_or(DelveError::UnknownActor(actor))?;
            (state.faction, state.level(), state.position())
        };
        self.actor_mut(actor)?.items.extend(items.iter().copied());

        let (Some(thief_faction), Some(level), Some(position)) = (faction, level, position) else {
            return Ok(());
        };
        let now = self.current_time;
        for village in &mut self.factions {
            let watches = village
                .villain
                .as_ref()
                .is_some_and(|v| v.triggers.contains(&Trigger::StolenItems));
            if !watches
                || village.enemy != Some(thief_faction)
                || village.home_level != level
                || !village.collective.in_territory(position)
            {
                continue;
            }
            let stolen = village.state.record_theft(&items);
            if stolen > 0 && village.collective.leader().is_some() {
                info!("{}: \"You are going to regret this\" ({:?})", village.name, actor);
                self.events.push(
                    now,
                    EventKind::TheftWarning {
                        faction: village.id,
                        thief: actor,
                    },
                );
            }
        }
        Ok(())
    }

    /// Hand player control to `actor`, taking it from whoever had it
    pub fn possess(&mut self, actor: ActorId) -> Result<()> {
        if !self.actors.contains_key(&actor) {
            return Err(DelveError::UnknownActor(actor));
        }
        let previous = self.possessed.replace(actor);
        if let Some(prev) = previous {
            if let Some(state) = self.actors.get_mut(&prev) {
                state.possessed = false;
            }
        }
        self.actor_mut(actor)?.possessed = true;
        if previous != Some(actor) {
            self.events.push(
                self.current_time,
                EventKind::PossessionChanged {
                    from: previous,
                    to: Some(actor),
                },
            );
        }
        Ok(())
    }

    pub fn unpossess(&mut self) {
        if let Some(prev) = self.possessed.take() {
            if let Some(state) = self.actors.get_mut(&prev) {
                state.possessed = false;
            }
            self.events.push(
                self.current_time,
                EventKind::PossessionChanged {
                    from: Some(prev),
                    to: None,
                },
            );
        }
    }

    pub fn possessed(&self) -> Option<ActorId> {
        self.possessed
    }

    // ---- factions -----------------------------------------------------

    pub fn faction(&self, id: FactionId) -> Result<&Faction> {
        self.factions.get(id.index()).ok_or(DelveError::UnknownFaction(id))
    }

    pub fn faction_mut(&mut self, id: FactionId) -> Result<&mut Faction> {
        self.factions
            .get_mut(id.index())
            .ok_or(DelveError::UnknownFaction(id))
    }

    pub fn factions(&self) -> &[Faction] {
        &self.factions
    }

    pub fn faction_of(&self, actor: ActorId) -> Option<FactionId> {
        self.actors
            .get(&actor)
            .or_else(|| self.dead.get(&actor))
            .and_then(|a| a.faction)
    }

    /// The enemy pays off every raid `attacker` has sent against it
    ///
    /// Returns the gold paid, or `None` when no ransom was demanded.
    pub fn pay_ransom(&mut self, attacker: FactionId) -> Result<Option<u32>> {
        let target = self
            .faction(attacker)?
            .enemy
            .ok_or_else(|| DelveError::Config(format!("{:?} has no enemy", attacker)))?;
        let demand = self
            .faction(target)?
            .incoming
            .iter()
            .filter(|a| a.attacker == attacker)
            .find_map(|a| a.ransom);
        let Some(demand) = demand else {
            return Ok(None);
        };

        let paid = self.faction_mut(target)?.collective.take_gold(demand);
        self.faction_mut(attacker)?.collective.add_gold(paid);
        for team in self.faction(attacker)?.teams.ids() {
            engine::cancel_team(self, attacker, team, CancelReason::Ransom)?;
        }
        self.faction_mut(target)?
            .incoming
            .retain(|a| a.attacker != attacker);
        info!("{:?} paid {} gold ransom to {:?}", target, paid, attacker);
        self.events.push(
            self.current_time,
            EventKind::RansomPaid {
                attacker,
                target,
                amount: paid,
            },
        );
        Ok(Some(paid))
    }

    // ---- levels and shards --------------------------------------------

    pub fn level(&self, id: LevelId) -> Option<&dyn Level> {
        self.levels.get(id.index()).map(|l| l.as_ref())
    }

    pub fn level_mut(&mut self, id: LevelId) -> Result<&mut Box<dyn Level>> {
        self.levels.get_mut(id.index()).ok_or(DelveError::UnknownLevel(id))
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn shard_of(&self, level: LevelId) -> Option<ShardId> {
        self.level_shards.get(level.index()).copied()
    }

    pub fn shard_coord(&self, shard: ShardId) -> Option<ShardCoord> {
        self.shards.get(&shard).copied()
    }

    pub fn is_single_shard(&self) -> bool {
        self.shards.len() <= 1
    }

    pub fn active_shard(&self) -> Option<ShardId> {
        self.active_shard
    }

    pub fn graph(&self) -> &WorldGraph {
        &self.graph
    }

    pub fn acting_level(&self) -> Option<LevelId> {
        self.acting_level
    }

    // ---- time and bookkeeping -----------------------------------------

    pub fn now(&self) -> Time {
        self.current_time
    }

    pub fn ticks(&self) -> u64 {
        self.clock.ticks()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn queue(&self) -> &ActorQueue {
        &self.queue
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        self.events.drain()
    }

    pub fn rng_mut(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::mind::IdleMind;
    use crate::world::level::GridLevel;

    const STAIRS: ConnectorKey = ConnectorKey(1);

    fn two_floor_world() -> (World, LevelId, LevelId) {
        let mut world = World::new(SimulationConfig::default(), 3).unwrap();
        let top = world
            .add_level(
                Box::new(GridLevel::new("Top", 8, 8).with_connector(Direction::Down, STAIRS, Position::new(7, 7))),
                HOME_SHARD,
            )
            .unwrap();
        let bottom = world
            .add_level(
                Box::new(GridLevel::new("Bottom", 8, 8).with_connector(Direction::Up, STAIRS, Position::new(0, 0))),
                HOME_SHARD,
            )
            .unwrap();
        world.link_levels(Direction::Down, STAIRS, top, bottom).unwrap();
        world.finish_construction().unwrap();
        (world, top, bottom)
    }

    fn idle() -> Box<dyn Mind> {
        Box::new(IdleMind::default())
    }

    #[test]
    fn test_spawn_schedules_after_delay() {
        let (mut world, top, _) = two_floor_world();
        let id = world
            .spawn_actor(ActorTemplate::new("Imp", TribeId(0)), top, Position::new(1, 1), idle())
            .unwrap();
        assert_eq!(world.queue().time_of(id), Some(1.0));
        assert_eq!(world.level(top).unwrap().actor_at(Position::new(1, 1)), Some(id));
    }

    #[test]
    fn test_spawn_on_occupied_tile_fails_cleanly() {
        let (mut world, top, _) = two_floor_world();
        world
            .spawn_actor(ActorTemplate::new("Imp", TribeId(0)), top, Position::new(1, 1), idle())
            .unwrap();
        let err = world.spawn_actor(ActorTemplate::new("Imp", TribeId(0)), top, Position::new(1, 1), idle());
        assert!(matches!(err, Err(DelveError::Placement(_))));
        assert_eq!(world.actor_count(), 1);
        assert_eq!(world.queue().len(), 1);
    }

    #[test]
    fn test_change_level_lands_on_matching_stairs() {
        let (mut world, top, bottom) = two_floor_world();
        let id = world
            .spawn_actor(ActorTemplate::new("Imp", TribeId(0)), top, Position::new(7, 7), idle())
            .unwrap();
        let arrived = world.change_level(id, Hop::new(Direction::Down, STAIRS)).unwrap();
        assert_eq!(arrived, bottom);
        assert_eq!(world.actor(id).unwrap().position(), Some(Position::new(0, 0)));
        assert_eq!(world.level(top).unwrap().position_of(id), None);

        let back = world.travel_toward(id, top).unwrap();
        assert_eq!(back, top);
        assert_eq!(world.actor(id).unwrap().position(), Some(Position::new(7, 7)));
    }

    #[test]
    fn test_set_local_time_reorders_turns() {
        let (mut world, top, _) = two_floor_world();
        let first = world
            .spawn_actor(ActorTemplate::new("First", TribeId(0)), top, Position::new(1, 1), idle())
            .unwrap();
        let second = world
            .spawn_actor(ActorTemplate::new("Second", TribeId(0)), top, Position::new(2, 1), idle())
            .unwrap();
        assert_eq!(world.queue().peek_earliest().unwrap().actor, first);

        world.set_local_time(first, 4.0).unwrap();
        assert_eq!(world.actor(first).unwrap().local_time, 4.0);
        assert_eq!(world.queue().time_of(first), Some(4.0));
        assert_eq!(world.queue().peek_earliest().unwrap().actor, second);
    }

    #[test]
    fn test_set_local_time_needs_a_scheduled_actor() {
        let (mut world, top, _) = two_floor_world();
        let id = world
            .spawn_actor(ActorTemplate::new("Imp", TribeId(0)), top, Position::new(1, 1), idle())
            .unwrap();
        world.kill(id, None).unwrap();
        assert!(matches!(world.set_local_time(id, 2.0), Err(DelveError::NotScheduled(_))));
        assert!(matches!(
            world.set_local_time(ActorId(99), 2.0),
            Err(DelveError::NotScheduled(_))
        ));
    }

    #[test]
    fn test_link_requires_connector_on_both_levels() {
        let (mut world, top, bottom) = two_floor_world();
        let err = world.link_levels(Direction::Down, ConnectorKey(9), top, bottom);
        assert!(matches!(err, Err(DelveError::Config(_))));
    }

    #[test]
    fn test_kill_moves_actor_to_cemetery() {
        let (mut world, top, _) = two_floor_world();
        let id = world
            .spawn_actor(ActorTemplate::new("Imp", TribeId(0)), top, Position::new(2, 2), idle())
            .unwrap();
        world.kill(id, None).unwrap();
        assert!(!world.is_alive(id));
        assert!(world.dead_actor(id).unwrap().is_dead());
        assert!(!world.queue().contains(id));
        assert_eq!(world.level(top).unwrap().actor_at(Position::new(2, 2)), None);

        // Killing twice does nothing
        world.kill(id, None).unwrap();
        assert_eq!(world.dead_count(), 1);
    }

    #[test]
    fn test_kills_feed_enemy_victim_score() {
        let (mut world, top, _) = two_floor_world();
        let village = world.add_faction("Village", TribeId(1), top).unwrap();
        let keeper = world.add_faction("Keeper", TribeId(2), top).unwrap();
        let hamlet = world.add_faction("Hamlet", TribeId(1), top).unwrap();
        world.set_enemy(village, keeper).unwrap();

        let killer = world
            .spawn_actor(ActorTemplate::new("Imp", TribeId(2)).in_faction(keeper), top, Position::new(0, 0), idle())
            .unwrap();
        let member = world
            .spawn_actor(ActorTemplate::new("Guard", TribeId(1)).in_faction(village), top, Position::new(1, 0), idle())
            .unwrap();
        let kin = world
            .spawn_actor(ActorTemplate::new("Farmer", TribeId(1)).in_faction(hamlet), top, Position::new(2, 0), idle())
            .unwrap();

        world.strike(killer, member, true).unwrap();
        world.strike(killer, kin, true).unwrap();
        let victims = world.faction(village).unwrap().state.victims;
        assert!((victims - 1.15).abs() < 1e-9);
    }

    #[test]
    fn test_possession_hand_off() {
        let (mut world, top, _) = two_floor_world();
        let a = world
            .spawn_actor(ActorTemplate::new("A", TribeId(0)), top, Position::new(0, 1), idle())
            .unwrap();
        let b = world
            .spawn_actor(ActorTemplate::new("B", TribeId(0)), top, Position::new(0, 2), idle())
            .unwrap();
        world.possess(a).unwrap();
        world.possess(b).unwrap();
        assert_eq!(world.possessed(), Some(b));
        assert!(!world.actor(a).unwrap().possessed);
        assert!(world.actor(b).unwrap().possessed);
        world.unpossess();
        assert_eq!(world.possessed(), None);
    }

    #[test]
    fn test_hostility_is_symmetric() {
        let (mut world, _, _) = two_floor_world();
        world.declare_hostile(TribeId(4), TribeId(1));
        assert!(world.is_hostile(TribeId(1), TribeId(4)));
        assert!(!world.is_hostile(TribeId(1), TribeId(2)));
    }
}
