//! Delve - demo entry point
//!
//! Builds a two-level world: a village on the surface and a keeper's lair
//! below it. The village is a villain that raids the lair once its triggers
//! fire, and the run prints what happened.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use delve::core::error::Result;
use delve::core::types::{ConnectorKey, Direction, FactionId, Position, RoomKind, TribeId};
use delve::core::SimulationConfig;
use delve::ecs::{World, HOME_SHARD};
use delve::entity::{ActorState, ActorTemplate, ActorTrait, IdleMind, Request, Turn};
use delve::faction::{RaidBehavior, Trigger, Villain};
use delve::simulation::{EventKind, StopReason};
use delve::world::GridLevel;

/// Delve - run a village raiding a keeper's lair
#[derive(Parser, Debug)]
#[command(name = "delve")]
#[command(about = "Run a two-faction dungeon simulation with a raiding village")]
struct Args {
    /// Random seed for reproducible runs
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// World time to simulate up to
    #[arg(long, default_value_t = 300.0)]
    until: f64,

    /// Log every tick boundary and trigger value
    #[arg(long, default_value_t = false)]
    verbose: bool,
}

const STAIRS: ConnectorKey = ConnectorKey(1);

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "delve=debug" } else { "delve=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let mut world = World::new(SimulationConfig::default(), args.seed)?;
    let surface = world.add_level(
        Box::new(GridLevel::new("Surface", 24, 24).with_connector(
            Direction::Down,
            STAIRS,
            Position::new(20, 20),
        )),
        HOME_SHARD,
    )?;
    let lair = world.add_level(
        Box::new(GridLevel::new("Lair", 24, 24).with_connector(
            Direction::Up,
            STAIRS,
            Position::new(1, 1),
        )),
        HOME_SHARD,
    )?;
    world.link_levels(Direction::Down, STAIRS, surface, lair)?;
    world.finish_construction()?;

    let village = world.add_faction("Greenhollow", TribeId(1), surface)?;
    let keeper = world.add_faction("Keeper", TribeId(2), lair)?;
    world.declare_hostile(TribeId(1), TribeId(2));
    world.set_enemy(village, keeper)?;
    world.set_villain(
        village,
        Villain::new(2, 3, RaidBehavior::KillMembers { count: 3 })
            .with_trigger(Trigger::Timer { at: 50.0 })
            .with_trigger(Trigger::Power)
            .with_trigger(Trigger::RoomBuilt {
                room: RoomKind::Throne,
            })
            .with_ransom(0.5, 50),
    )?;
    {
        let home = &mut world.faction_mut(village)?.collective;
        home.add_territory((0..12).flat_map(|x| (0..12).map(move |y| Position::new(x, y))));
    }
    {
        let lair_side = &mut world.faction_mut(keeper)?.collective;
        lair_side.add_gold(400);
        lair_side.add_room(RoomKind::Throne);
    }

    for i in 0..8 {
        world.spawn_actor(
            ActorTemplate::new("Villager", TribeId(1))
                .in_faction(village)
                .with_trait(ActorTrait::Fighter)
                .with_power(2.0),
            surface,
            Position::new(2 + i % 4, 2 + i / 4),
            Box::new(raider_mind(village)),
        )?;
    }
    for i in 0..6 {
        world.spawn_actor(
            ActorTemplate::new("Imp", TribeId(2))
                .in_faction(keeper)
                .with_trait(ActorTrait::Fighter)
                .with_power(3.0),
            lair,
            Position::new(10 + i, 10),
            Box::new(IdleMind::new(1.5)),
        )?;
    }

    let report = world.advance(args.until)?;
    println!("\n=== DELVE ===");
    println!(
        "Simulated to {:.1}: {} turns, {} ticks",
        world.now(),
        report.turns,
        report.ticks
    );
    if let StopReason::Unpossessed(actor) = report.stop {
        println!("Stopped early: {:?} lost control", actor);
    }

    for event in world.drain_events() {
        match &event.kind {
            EventKind::LevelChanged { .. } | EventKind::PossessionChanged { .. } => {}
            kind => println!("[{:>7.1}] {:?}", event.time, kind),
        }
    }
    for faction in world.factions() {
        println!(
            "{}: {} members, {} gold, {} teams in the field, victims {:.2}",
            faction.name,
            faction.collective.members().len(),
            faction.collective.gold(),
            faction.teams.len(),
            faction.state.victims
        );
    }
    Ok(())
}

/// Villagers idle at home; once given a raid task they head for the target's
/// home level and strike the first enemy they can find there
fn raider_mind(home: FactionId) -> impl FnMut(&ActorState, &World) -> Turn {
    move |me: &ActorState, world: &World| {
        let Some(task) = world
            .faction(home)
            .ok()
            .and_then(|f| f.collective.task_of(me.id))
        else {
            return Turn::wait(1.0);
        };
        let Ok(target) = world.faction(task.target()) else {
            return Turn::wait(1.0).with(Request::CompleteTask);
        };
        if !me.is_on(target.home_level) {
            return Turn::wait(1.0).with(Request::TravelToward(target.home_level));
        }
        let victim = target
            .collective
            .members()
            .iter()
            .filter_map(|m| world.actor(*m))
            .find(|a| a.is_on(target.home_level));
        match victim {
            Some(victim) => Turn::wait(1.0).with(Request::Strike {
                victim: victim.id,
                lethal: me.combat_power * 2.0 >= victim.combat_power,
            }),
            None => Turn::wait(1.0).with(Request::CompleteTask),
        }
    }
}
