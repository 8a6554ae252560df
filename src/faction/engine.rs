//! Raid decision engine
//!
//! Runs once per tick boundary for every faction. The update keeps existing
//! raids honest first (welcome message, attrition, entries, power
//! bookkeeping, abandoned teams). Only a faction with no team in the field
//! rolls for a new raid.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, info};

use crate::core::error::{DelveError, Result};
use crate::core::types::{ActorId, FactionId, TeamId};
use crate::ecs::world::World;
use crate::entity::actor::ActorTrait;
use crate::faction::raid::{CancelReason, IncomingAttack};
use crate::faction::trigger::{combine, Trigger, TriggerSignals};
use crate::simulation::events::EventKind;

/// One decision step for `faction`
pub fn update(world: &mut World, faction: FactionId) -> Result<()> {
    world.faction(faction)?;
    consider_welcome_message(world, faction)?;
    consider_cancelling_attacks(world, faction)?;
    check_entries(world, faction)?;
    if let Some(enemy) = world.faction(faction)?.enemy {
        let power = faction_power(world, enemy)?;
        world.faction_mut(faction)?.state.observe_enemy_power(power);
    }
    cancel_abandoned_teams(world, faction)?;
    if !world.faction(faction)?.teams.is_empty() {
        return Ok(());
    }

    if world.faction(faction)?.villain.is_none() || !can_perform_attack(world, faction)? {
        return Ok(());
    }
    let update_freq = world.config.raid.update_freq;
    if !world.rng.gen_bool(update_freq) {
        return Ok(());
    }
    let combined = attack_probability(world, faction)?;
    let prob = (combined / update_freq).min(1.0);
    if prob <= 0.0 || !world.rng.gen_bool(prob) {
        return Ok(());
    }
    if let Some(members) = select_team(world, faction)? {
        launch_raid(world, faction, members)?;
    }
    Ok(())
}

/// Sum of living members' combat power
pub fn faction_power(world: &World, faction: FactionId) -> Result<f64> {
    Ok(world
        .faction(faction)?
        .collective
        .members()
        .iter()
        .filter_map(|m| world.actor(*m))
        .map(|a| a.effective_power())
        .sum())
}

/// Raids are only planned where the player is, or anywhere when the world
/// is not being played or has a single shard
pub fn can_perform_attack(world: &World, faction: FactionId) -> Result<bool> {
    let Some(active) = world.active_shard() else {
        return Ok(true);
    };
    if world.is_single_shard() {
        return Ok(true);
    }
    let home = world.faction(faction)?.home_level;
    Ok(world.shard_of(home) == Some(active))
}

/// Current value of every configured trigger, in declaration order
pub fn trigger_report(world: &World, faction: FactionId) -> Result<Vec<(Trigger, f64)>> {
    let this = world.faction(faction)?;
    let (Some(villain), Some(enemy_id)) = (&this.villain, this.enemy) else {
        return Ok(Vec::new());
    };
    let enemy = world.faction(enemy_id)?;
    let tuning = &world.config.raid;

    let shard_distance = if world.is_single_shard() {
        None
    } else {
        let coord = |level| {
            world
                .shard_of(level)
                .and_then(|s| world.shard_coord(s))
                .ok_or(DelveError::UnknownLevel(level))
        };
        Some(coord(this.home_level)?.distance(&coord(enemy.home_level)?))
    };
    let enemy_fighters = enemy
        .collective
        .members()
        .iter()
        .filter_map(|m| world.actor(*m))
        .filter(|a| a.has_trait(ActorTrait::Fighter))
        .count() as u32;

    let signals = TriggerSignals {
        now: world.now(),
        own_power: faction_power(world, faction)?,
        enemy_power: faction_power(world, enemy_id)?,
        enemy_fighters,
        enemy_gold: enemy.collective.gold(),
        enemy_rooms: enemy.collective.rooms(),
        state: &this.state,
        shard_distance,
    };
    Ok(villain
        .triggers
        .iter()
        .map(|t| (t.clone(), t.value(&signals, tuning)))
        .collect())
}

/// Combined attack probability for this evaluation
pub fn attack_probability(world: &World, faction: FactionId) -> Result<f64> {
    let report = trigger_report(world, faction)?;
    for (trigger, value) in &report {
        debug!("{:?} trigger {:?} = {}", faction, trigger, value);
    }
    Ok(combine(report.into_iter().map(|(_, v)| v)))
}

/// Draft a raid team, or `None` if the village cannot spare one
pub fn select_team(world: &mut World, faction: FactionId) -> Result<Option<Vec<ActorId>>> {
    let this = world.faction(faction)?;
    let Some(villain) = &this.villain else {
        return Ok(None);
    };
    let restrict_to_territory = world.is_single_shard();
    let mut fighters: Vec<ActorId> = this
        .collective
        .members()
        .iter()
        .filter_map(|m| world.actor(*m))
        .filter(|a| a.has_trait(ActorTrait::Fighter) && !a.has_trait(ActorTrait::Summoned))
        .filter(|a| !this.teams.contains_member(a.id))
        .filter(|a| {
            !restrict_to_territory
                || (a.is_on(this.home_level)
                    && a.position().is_some_and(|p| this.collective.in_territory(p)))
        })
        .map(|a| a.id)
        .collect();
    let population = this
        .collective
        .members()
        .iter()
        .filter(|m| world.is_alive(**m))
        .count();

    let min_team = villain.min_team_size as usize;
    let min_population = villain.min_population as usize;
    debug!("{} fighters: {} of {}", this.name, fighters.len(), population);
    if fighters.len() < min_team || population < min_population + min_team {
        return Ok(None);
    }
    let max_team = fighters.len().min(population - min_population);
    let size = world.rng.gen_range(min_team..=max_team);
    fighters.shuffle(&mut world.rng);
    fighters.truncate(size);
    Ok(Some(fighters))
}

/// Send `members` against the faction's enemy
///
/// Members in another shard are moved onto the enemy's home level first. If
/// one of them cannot land, everyone already moved goes back to where they
/// were and no raid is launched.
pub fn launch_raid(world: &mut World, faction: FactionId, members: Vec<ActorId>) -> Result<Option<TeamId>> {
    let this = world.faction(faction)?;
    let enemy = this
        .enemy
        .ok_or_else(|| DelveError::Config(format!("{} has no enemy to raid", this.name)))?;
    let villain = this
        .villain
        .clone()
        .ok_or_else(|| DelveError::Config(format!("{} is not a villain", this.name)))?;
    let target_level = world.faction(enemy)?.home_level;
    let target_shard = world.shard_of(target_level);

    let mut moved = Vec::new();
    for member in &members {
        let actor = world.actor(*member).ok_or(DelveError::UnknownActor(*member))?;
        let (here, origin) = (actor.level(), actor.position());
        if here.and_then(|l| world.shard_of(l)) == target_shard {
            continue;
        }
        match world.transfer_actor(*member, target_level) {
            Ok(()) => moved.push((*member, here, origin)),
            Err(DelveError::Placement(reason)) => {
                info!("{:?} called off its raid on {:?}: {}", faction, enemy, reason);
                for (actor, level, position) in moved.into_iter().rev() {
                    if let (Some(level), Some(position)) = (level, position) {
                        world.relocate(actor, target_level, level, vec![position])?;
                    }
                }
                return Ok(None);
            }
            Err(e) => return Err(e),
        }
    }

    let enemy_gold = world.faction(enemy)?.collective.gold();
    let tuning = world.config.raid.clone();
    let ransom = villain.ransom_demand(enemy_gold, &mut world.rng, &tuning);
    let now = world.now();

    let team = world
        .faction_mut(faction)?
        .teams
        .create(members.clone(), enemy, ransom, now);
    world.faction_mut(enemy)?.incoming.push(IncomingAttack {
        attacker: faction,
        team,
        members: members.clone(),
        ransom,
    });
    for member in &members {
        let task = villain.attack_task(enemy, faction, &mut world.rng, &tuning);
        world.faction_mut(faction)?.collective.set_task(*member, task);
    }
    world.faction_mut(faction)?.teams.activate(team);

    info!(
        "{:?} launched raid {:?} against {:?} with {} members",
        faction,
        team,
        enemy,
        members.len()
    );
    world.events.push(
        now,
        EventKind::RaidLaunched {
            attacker: faction,
            target: enemy,
            team,
            members,
        },
    );
    if let Some(amount) = ransom {
        world.events.push(
            now,
            EventKind::RansomDemanded {
                attacker: faction,
                target: enemy,
                amount,
            },
        );
    }
    Ok(Some(team))
}

/// Recall a team's members and disband it; unknown teams are ignored
pub fn cancel_team(
    world: &mut World,
    faction: FactionId,
    team: TeamId,
    reason: CancelReason,
) -> Result<bool> {
    let this = world.faction_mut(faction)?;
    let Some(cancelled) = this.teams.cancel(team) else {
        return Ok(false);
    };
    for member in &cancelled.members {
        this.collective.cancel_task(*member);
    }
    if let Ok(enemy) = world.faction_mut(cancelled.enemy) {
        enemy
            .incoming
            .retain(|a| !(a.attacker == faction && a.team == team));
    }
    info!("{:?} cancelled raid {:?}: {:?}", faction, team, reason);
    world.events.push(
        world.current_time,
        EventKind::RaidCancelled {
            faction,
            team,
            reason,
        },
    );
    Ok(true)
}

fn consider_welcome_message(world: &mut World, faction: FactionId) -> Result<()> {
    let this = world.faction(faction)?;
    let (Some(leader), Some(message), Some(enemy)) = (
        this.collective.leader(),
        this.villain.as_ref().and_then(|v| v.welcome_message),
        this.enemy,
    ) else {
        return Ok(());
    };
    if !world.actor(leader).is_some_and(|l| l.is_on(this.home_level)) {
        return Ok(());
    }
    let visitor = world.possessed().and_then(|p| world.actor(p)).filter(|a| {
        a.faction == Some(enemy)
            && a.has_trait(ActorTrait::Invisible)
            && a.is_on(this.home_level)
            && a.position().is_some_and(|p| this.collective.in_territory(p))
    });
    let Some(visitor) = visitor.map(|a| a.id) else {
        return Ok(());
    };

    info!("{}: {}", this.name, message.text());
    if let Some(villain) = world.faction_mut(faction)?.villain.as_mut() {
        villain.welcome_message = None;
    }
    world.events.push(
        world.current_time,
        EventKind::Welcome {
            faction,
            actor: visitor,
            text: message.text().to_string(),
        },
    );
    Ok(())
}

fn consider_cancelling_attacks(world: &mut World, faction: FactionId) -> Result<()> {
    let this = world.faction(faction)?;
    let broken: Vec<TeamId> = this
        .teams
        .iter()
        .filter(|team| {
            let alive: Vec<ActorId> = team
                .members
                .iter()
                .copied()
                .filter(|m| world.is_alive(*m))
                .collect();
            let sole_survivor_down = alive.len() == 1
                && world.actor(alive[0]).is_some_and(|a| a.seriously_wounded);
            team.below_half(alive.len()) || sole_survivor_down
        })
        .map(|team| team.id)
        .collect();
    for team in broken {
        cancel_team(world, faction, team, CancelReason::Attrition)?;
    }
    Ok(())
}

fn check_entries(world: &mut World, faction: FactionId) -> Result<()> {
    let this = world.faction(faction)?;
    let watches = this
        .villain
        .as_ref()
        .is_some_and(|v| v.triggers.contains(&Trigger::Entry));
    if !watches || this.state.entries {
        return Ok(());
    }
    let intruded = world.actors().any(|a| {
        a.is_on(this.home_level)
            && world.is_hostile(this.tribe, a.tribe)
            && a.position().is_some_and(|p| this.collective.in_territory(p))
    });
    if intruded {
        debug!("{}: enemy entered the territory", this.name);
        world.faction_mut(faction)?.state.mark_entry();
    }
    Ok(())
}

/// A team whose members all lost their tasks has nothing left to do
fn cancel_abandoned_teams(world: &mut World, faction: FactionId) -> Result<()> {
    let this = world.faction(faction)?;
    let abandoned: Vec<TeamId> = this
        .teams
        .iter()
        .filter(|team| team.members.iter().all(|m| !this.collective.has_task(*m)))
        .map(|team| team.id)
        .collect();
    for team in abandoned {
        cancel_team(world, faction, team, CancelReason::Abandoned)?;
    }
    Ok(())
}
