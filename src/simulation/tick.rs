//! Tick system - drives actor turns and periodic world ticks
//!
//! `advance` is the only entry point that moves time forward. It pulls the
//! earliest actor off the queue, fires every tick boundary that lies strictly
//! before that actor's time, runs the turn and reschedules the actor. Tick
//! boundary `b` therefore runs after every turn scheduled at or before `b`
//! and before any turn scheduled after it.

use tracing::{debug, trace, warn};

use crate::core::error::{DelveError, Result};
use crate::core::types::{ActorId, FactionId, Time};
use crate::ecs::world::World;
use crate::entity::mind::{Request, Turn};
use crate::faction::engine;

/// Host callback run at every tick boundary, after levels and factions
pub trait TickHook {
    fn on_tick(&mut self, world: &mut World, now: Time) -> Result<()>;
}

impl<F> TickHook for F
where
    F: FnMut(&mut World, Time) -> Result<()>,
{
    fn on_tick(&mut self, world: &mut World, now: Time) -> Result<()> {
        self(world, now)
    }
}

/// Why `advance` returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The next turn lies past the target, or nobody is left
    ReachedTarget,
    /// The player-controlled actor lost possession during its turn
    Unpossessed(ActorId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceReport {
    pub turns: u64,
    pub ticks: u64,
    pub stop: StopReason,
}

impl World {
    /// Run the world up to `target`; see [`advance`]
    pub fn advance(&mut self, target: Time) -> Result<AdvanceReport> {
        advance(self, target)
    }
}

/// Run every turn and tick boundary up to and including `target`
///
/// When the next actor is due after `target` (or there are no actors) the
/// remaining boundaries up to `target` fire and world time becomes `target`.
/// Invariant violations abort the call with an error.
pub fn advance(world: &mut World, target: Time) -> Result<AdvanceReport> {
    if !target.is_finite() {
        return Err(DelveError::InvalidTarget(target));
    }
    let mut report = AdvanceReport {
        turns: 0,
        ticks: 0,
        stop: StopReason::ReachedTarget,
    };

    loop {
        match world.queue.peek_earliest() {
            Some(next) if next.time <= target => {
                // A boundary can kill or move the actor, so look again after each
                if world.clock.due_before(next.time) {
                    fire_boundary(world)?;
                    report.ticks += 1;
                    continue;
                }
                report.turns += 1;
                if let Some(lost) = run_turn(world)? {
                    report.stop = StopReason::Unpossessed(lost);
                    return Ok(report);
                }
            }
            _ => {
                while world.clock.due_by(target) {
                    fire_boundary(world)?;
                    report.ticks += 1;
                }
                world.current_time = world.current_time.max(target);
                return Ok(report);
            }
        }
    }
}

/// Pop the earliest actor and play its turn
///
/// Returns the actor that lost possession during the turn, if any.
fn run_turn(world: &mut World) -> Result<Option<ActorId>> {
    let Some(next) = world.queue.pop_earliest() else {
        return Ok(None);
    };
    let id = next.actor;
    world.current_time = world.current_time.max(next.time);
    let possessed_before = world.possessed;

    let mut mind = world.minds.remove(&id).ok_or(DelveError::UnknownActor(id))?;
    let turn = {
        let me = world.actors.get(&id).ok_or(DelveError::UnknownActor(id))?;
        world.acting_level = me.level();
        mind.make_move(me, world)
    };
    world.minds.insert(id, mind);

    let Turn { elapsed, requests } = turn;
    if !(elapsed > 0.0 && elapsed.is_finite()) {
        world.acting_level = None;
        world.queue.insert(id, next.time)?;
        return Err(DelveError::InvalidTime {
            actor: id,
            time: elapsed,
        });
    }
    trace!("{:?} acts at {} for {}", id, next.time, elapsed);

    // A refused request is skipped; anything else ends the turn, but the
    // actor is rescheduled first so it is never dropped from the queue
    let mut failure = None;
    for request in requests {
        if !world.is_alive(id) {
            break;
        }
        match apply_request(world, id, request) {
            Ok(()) => {}
            Err(e @ (DelveError::Placement(_) | DelveError::UnknownActor(_))) => {
                warn!("{:?}: request refused: {}", id, e)
            }
            Err(e) => {
                failure = Some(e);
                break;
            }
        }
    }

    if let Some(actor) = world.actors.get_mut(&id) {
        let time = next.time + elapsed;
        actor.local_time = time;
        world.queue.insert(id, time)?;
    }
    world.acting_level = None;
    if let Some(e) = failure {
        return Err(e);
    }

    match possessed_before {
        Some(before) if world.possessed.is_none() => Ok(Some(before)),
        _ => Ok(None),
    }
}

fn apply_request(world: &mut World, actor: ActorId, request: Request) -> Result<()> {
    match request {
        Request::MoveTo(position) => world.move_actor(actor, position),
        Request::TakeConnector(hop) => world.change_level(actor, hop).map(|_| ()),
        Request::TravelToward(level) => world.travel_toward(actor, level).map(|_| ()),
        Request::Strike { victim, lethal } => world.strike(actor, victim, lethal),
        Request::PickUp(items) => world.pick_up(actor, items),
        Request::CompleteTask => {
            if let Some(faction) = world.faction_of(actor) {
                world.faction_mut(faction)?.collective.cancel_task(actor);
            }
            Ok(())
        }
        Request::Die => world.kill(actor, None),
        Request::Possess(other) => world.possess(other),
        Request::Unpossess => {
            world.unpossess();
            Ok(())
        }
    }
}

/// Fire the next tick boundary: levels, factions, cemetery, then host hooks
fn fire_boundary(world: &mut World) -> Result<()> {
    let now = world.clock.fire();
    world.current_time = world.current_time.max(now);
    debug!("Tick boundary {} at {}", world.clock.ticks(), now);

    for level in &mut world.levels {
        level.tick(now);
    }
    for index in 0..world.factions.len() {
        engine::update(world, FactionId(index as u32))?;
    }
    bury_dead(world);

    let mut hooks = std::mem::take(&mut world.hooks);
    let result = hooks.iter_mut().try_for_each(|hook| hook.on_tick(world, now));
    // Hooks registered by a hook are kept after the ones already installed
    hooks.append(&mut world.hooks);
    world.hooks = hooks;
    result
}

/// Drop dead actors from rosters and team lists
fn bury_dead(world: &mut World) {
    let World {
        actors, factions, ..
    } = world;
    for faction in factions.iter_mut() {
        let dropped = faction.collective.retain_members(|m| actors.contains_key(&m));
        let pruned = faction.teams.prune_dead(|m| !actors.contains_key(&m));
        if dropped + pruned > 0 {
            trace!("{}: buried {} members, {} raiders", faction.name, dropped, pruned);
        }
    }
}
