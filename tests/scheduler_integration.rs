//! Integration tests for the actor queue and the advance loop
//!
//! These tests verify:
//! - Turn order by (time, id) with lower ids first on ties
//! - Tick boundaries fire exactly once, in order, around turns
//! - Time moves to the target even when nobody acts

use std::cell::RefCell;
use std::rc::Rc;

use delve::core::error::DelveError;
use delve::core::types::{ActorId, LevelId, Position, Time, TribeId};
use delve::core::SimulationConfig;
use delve::ecs::{World, HOME_SHARD};
use delve::entity::{ActorState, ActorTemplate, IdleMind, Mind, Request, Turn};
use delve::schedule::ActorQueue;
use delve::simulation::StopReason;
use delve::world::GridLevel;
use proptest::prelude::*;

fn hall(seed: u64) -> (World, LevelId) {
    let mut world = World::new(SimulationConfig::default(), seed).unwrap();
    let level = world
        .add_level(Box::new(GridLevel::new("Hall", 16, 16)), HOME_SHARD)
        .unwrap();
    world.finish_construction().unwrap();
    (world, level)
}

/// Records `name@time` each time it acts, then waits `speed`
fn recorder(name: &'static str, speed: Time, log: Rc<RefCell<Vec<String>>>) -> Box<dyn Mind> {
    Box::new(move |me: &ActorState, _: &World| {
        log.borrow_mut().push(format!("{}@{}", name, me.local_time));
        Turn::wait(speed)
    })
}

#[test]
fn test_tie_break_scenario() {
    let mut queue = ActorQueue::new();
    queue.insert(ActorId(1), 5.0).unwrap();
    queue.insert(ActorId(3), 3.0).unwrap();
    queue.insert(ActorId(2), 3.0).unwrap();

    let order: Vec<ActorId> = std::iter::from_fn(|| queue.pop_earliest().map(|s| s.actor)).collect();
    assert_eq!(order, vec![ActorId(2), ActorId(3), ActorId(1)]);
}

#[test]
fn test_equal_times_run_in_spawn_order() {
    let (mut world, level) = hall(1);
    let log = Rc::new(RefCell::new(Vec::new()));
    for (i, name) in ["a", "b", "c"].into_iter().enumerate() {
        world
            .spawn_actor(
                ActorTemplate::new(name, TribeId(0)),
                level,
                Position::new(i as i32, 0),
                recorder(name, 1.0, log.clone()),
            )
            .unwrap();
    }
    world.advance(2.0).unwrap();
    assert_eq!(
        *log.borrow(),
        vec!["a@1", "b@1", "c@1", "a@2", "b@2", "c@2"]
    );
}

#[test]
fn test_advance_before_first_turn_only_ticks() {
    let config = SimulationConfig {
        spawn_delay: 12.0,
        ..SimulationConfig::default()
    };
    let mut world = World::new(config, 2).unwrap();
    let level = world
        .add_level(Box::new(GridLevel::new("Hall", 16, 16)), HOME_SHARD)
        .unwrap();
    world.finish_construction().unwrap();
    let late = world
        .spawn_actor(
            ActorTemplate::new("Late", TribeId(0)),
            level,
            Position::new(0, 0),
            Box::new(IdleMind::default()),
        )
        .unwrap();
    assert_eq!(world.queue().time_of(late), Some(12.0));

    let report = world.advance(10.0).unwrap();
    assert_eq!(report.ticks, 10);
    assert_eq!(report.turns, 0);
    assert_eq!(report.stop, StopReason::ReachedTarget);
    assert_eq!(world.now(), 10.0);
    assert_eq!(world.actor(late).unwrap().local_time, 12.0);

    let report = world.advance(12.0).unwrap();
    assert_eq!(report.ticks, 2);
    assert_eq!(report.turns, 1);
}

#[test]
fn test_boundaries_fire_once_across_calls() {
    let (mut world, _) = hall(3);
    let ticks = Rc::new(RefCell::new(Vec::new()));
    let seen = ticks.clone();
    world.add_tick_hook(Box::new(move |_: &mut World, now: Time| -> delve::core::Result<()> {
        seen.borrow_mut().push(now);
        Ok(())
    }));
    world.advance(2.5).unwrap();
    world.advance(2.5).unwrap();
    world.advance(4.0).unwrap();
    assert_eq!(*ticks.borrow(), vec![1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn test_turns_and_ticks_interleave() {
    let (mut world, level) = hall(4);
    let log = Rc::new(RefCell::new(Vec::new()));
    world
        .spawn_actor(
            ActorTemplate::new("slow", TribeId(0)),
            level,
            Position::new(0, 0),
            recorder("slow", 1.5, log.clone()),
        )
        .unwrap();
    let ticks = log.clone();
    world.add_tick_hook(Box::new(move |_: &mut World, now: Time| -> delve::core::Result<()> {
        ticks.borrow_mut().push(format!("tick@{}", now));
        Ok(())
    }));

    world.advance(4.0).unwrap();
    assert_eq!(
        *log.borrow(),
        vec!["slow@1", "tick@1", "tick@2", "slow@2.5", "tick@3", "slow@4", "tick@4"]
    );
}

#[test]
fn test_removed_actor_is_an_error_to_remove_again() {
    let mut queue = ActorQueue::new();
    queue.insert(ActorId(7), 1.0).unwrap();
    queue.remove(ActorId(7)).unwrap();
    assert!(matches!(
        queue.remove(ActorId(7)),
        Err(DelveError::NotScheduled(ActorId(7)))
    ));
    assert!(matches!(
        queue.reschedule(ActorId(7), 2.0),
        Err(DelveError::NotScheduled(ActorId(7)))
    ));
}

#[test]
fn test_possessed_death_stops_advance() {
    let (mut world, level) = hall(5);
    let doomed = |_: &ActorState, _: &World| Turn::wait(1.0).with(Request::Die);
    let hero = world
        .spawn_actor(
            ActorTemplate::new("Hero", TribeId(0)),
            level,
            Position::new(0, 0),
            Box::new(doomed),
        )
        .unwrap();
    world
        .spawn_actor(
            ActorTemplate::new("Bystander", TribeId(0)),
            level,
            Position::new(1, 0),
            Box::new(IdleMind::default()),
        )
        .unwrap();
    world.possess(hero).unwrap();

    let report = world.advance(20.0).unwrap();
    assert_eq!(report.stop, StopReason::Unpossessed(hero));
    assert_eq!(report.turns, 1);
    assert!(world.now() < 20.0);
}

#[test]
fn test_blocked_move_is_skipped_not_fatal() {
    let (mut world, level) = hall(4);
    let blocker = world
        .spawn_actor(
            ActorTemplate::new("Boulder", TribeId(0)),
            level,
            Position::new(3, 3),
            Box::new(IdleMind::new(100.0)),
        )
        .unwrap();
    let log = Rc::new(RefCell::new(Vec::new()));
    let seen = log.clone();
    let pusher = move |me: &ActorState, _: &World| {
        seen.borrow_mut().push(me.local_time);
        // Into the boulder, then off the edge of the map
        Turn::wait(1.0)
            .with(Request::MoveTo(Position::new(3, 3)))
            .with(Request::MoveTo(Position::new(-1, 2)))
    };
    let id = world
        .spawn_actor(ActorTemplate::new("Pusher", TribeId(0)), level, Position::new(2, 3), Box::new(pusher))
        .unwrap();

    let report = world.advance(10.0).unwrap();
    assert_eq!(report.stop, StopReason::ReachedTarget);
    assert_eq!(world.now(), 10.0);
    assert_eq!(log.borrow().len(), 10);
    assert!(world.queue().contains(id));
    assert_eq!(world.actor(id).unwrap().position(), Some(Position::new(2, 3)));
    assert_eq!(world.actor(blocker).unwrap().position(), Some(Position::new(3, 3)));
}

#[test]
fn test_possessing_the_dead_is_skipped_not_fatal() {
    let (mut world, level) = hall(5);
    let ghost = world
        .spawn_actor(ActorTemplate::new("Ghost", TribeId(0)), level, Position::new(0, 0), Box::new(IdleMind::default()))
        .unwrap();
    world.kill(ghost, None).unwrap();

    let medium = move |_: &ActorState, _: &World| Turn::wait(2.0).with(Request::Possess(ghost));
    let id = world
        .spawn_actor(ActorTemplate::new("Medium", TribeId(0)), level, Position::new(1, 0), Box::new(medium))
        .unwrap();

    let report = world.advance(8.0).unwrap();
    assert_eq!(report.stop, StopReason::ReachedTarget);
    assert_eq!(report.turns, 4);
    assert_eq!(world.now(), 8.0);
    assert_eq!(world.possessed(), None);
    assert!(world.queue().contains(id));
    assert_eq!(world.queue().time_of(id), Some(9.0));
}

proptest! {
    #[test]
    fn prop_queue_pops_global_minimum(
        ops in prop::collection::vec((0u64..32, 0u32..1000, any::<bool>()), 1..200)
    ) {
        let mut queue = ActorQueue::new();
        let mut model: std::collections::BTreeMap<ActorId, f64> = Default::default();

        for (id, time, reschedule) in ops {
            let actor = ActorId(id);
            let time = time as f64 / 10.0;
            if model.contains_key(&actor) {
                if reschedule {
                    queue.reschedule(actor, time).unwrap();
                    model.insert(actor, time);
                } else {
                    queue.remove(actor).unwrap();
                    model.remove(&actor);
                }
            } else {
                queue.insert(actor, time).unwrap();
                model.insert(actor, time);
            }

            let expected = model
                .iter()
                .min_by(|a, b| a.1.total_cmp(b.1).then(a.0.cmp(b.0)))
                .map(|(a, t)| (*a, *t));
            let actual = queue.peek_earliest().map(|s| (s.actor, s.time));
            prop_assert_eq!(actual, expected);
            prop_assert_eq!(queue.len(), model.len());
        }

        let mut last: Option<(f64, ActorId)> = None;
        while let Some(next) = queue.pop_earliest() {
            if let Some((t, a)) = last {
                prop_assert!(t < next.time || (t == next.time && a < next.actor));
            }
            last = Some((next.time, next.actor));
        }
    }
}
