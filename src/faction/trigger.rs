//! Raid triggers
//!
//! Each trigger maps one unbounded signal to an attack probability through a
//! saturating curve scaled by its `*_max_prob` tuning value. The triggers of a
//! villain are combined by taking the maximum: the single most compelling
//! reason to attack sets the odds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::config::RaidTuning;
use crate::core::types::{RoomKind, Time};
use crate::faction::state::FactionState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Trigger {
    /// Fires once world time reaches `at`
    Timer { at: Time },
    /// Grows with the number of rooms of this kind the enemy has built
    RoomBuilt { room: RoomKind },
    /// The enemy's combat power is close to ours
    Power,
    /// The enemy has lost more than half of its peak power
    FinishOff,
    /// The enemy has been killing our people
    SelfVictims,
    /// The enemy fields more fighters than `minimum`
    EnemyPopulation { minimum: u32 },
    /// The enemy holds more gold than `minimum`
    Gold { minimum: u32 },
    StolenItems,
    /// An enemy walked into our territory
    Entry,
    /// The enemy's shard is next to ours
    Proximity,
}

/// Snapshot of everything trigger curves read
#[derive(Debug, Clone, Copy)]
pub struct TriggerSignals<'a> {
    pub now: Time,
    pub own_power: f64,
    pub enemy_power: f64,
    pub enemy_fighters: u32,
    pub enemy_gold: u32,
    pub enemy_rooms: &'a BTreeMap<RoomKind, u32>,
    pub state: &'a FactionState,
    /// Campaign distance between the two home shards; `None` in a
    /// single-shard world
    pub shard_distance: Option<u32>,
}

impl Trigger {
    pub fn value(&self, signals: &TriggerSignals<'_>, tuning: &RaidTuning) -> f64 {
        match self {
            Trigger::Timer { at } => {
                if signals.now >= *at {
                    tuning.timer_prob
                } else {
                    0.0
                }
            }
            Trigger::RoomBuilt { room } => {
                let count = signals
                    .enemy_rooms
                    .get(room)
                    .copied()
                    .unwrap_or(0)
                    .min(tuning.max_counted_rooms);
                count as f64 * room_prob(*room, tuning).unwrap_or(0.0)
            }
            Trigger::Power => {
                tuning.power_max_prob
                    * power_closeness(signals.own_power, signals.enemy_power, tuning)
            }
            Trigger::FinishOff => {
                tuning.finish_off_max_prob
                    * finish_off(
                        signals.state.max_enemy_power,
                        signals.enemy_power,
                        signals.own_power,
                        tuning,
                    )
            }
            Trigger::SelfVictims => {
                tuning.victims_max_prob * victims_curve(signals.state.victim_count())
            }
            Trigger::EnemyPopulation { minimum } => {
                tuning.population_max_prob * population_curve(signals.enemy_fighters, *minimum)
            }
            Trigger::Gold { minimum } => {
                tuning.gold_max_prob * gold_curve(signals.enemy_gold, *minimum)
            }
            Trigger::StolenItems => {
                tuning.stolen_max_prob * stolen_curve(signals.state.stolen_items)
            }
            Trigger::Entry => {
                if signals.state.entries {
                    tuning.entry_max_prob
                } else {
                    0.0
                }
            }
            Trigger::Proximity => match signals.shard_distance {
                Some(distance) if distance <= 1 => tuning.proximity_max_prob,
                _ => 0.0,
            },
        }
    }
}

/// Per-room probability for the room-built trigger; `None` for rooms the
/// trigger does not support
pub fn room_prob(room: RoomKind, tuning: &RaidTuning) -> Option<f64> {
    match room {
        RoomKind::Throne => Some(tuning.throne_room_prob),
        RoomKind::ImpaledHead => Some(tuning.impaled_head_prob),
        RoomKind::Treasury | RoomKind::Library | RoomKind::Workshop => None,
    }
}

/// Closeness of the two sides' power, in [0, 1]
///
/// With `a = mine / theirs`: silent below the floor ratio, cubic growth up to
/// parity, a slow cubic descent reaching `value_at_two` at twice their power,
/// then a hyperbolic tail toward zero.
pub fn power_closeness(my_power: f64, their_power: f64, tuning: &RaidTuning) -> f64 {
    if my_power <= 0.0 || their_power <= 0.0 {
        return 0.0;
    }
    let a = my_power / their_power;
    let value_at_two = tuning.power_value_at_two;
    if a < tuning.power_floor_ratio {
        0.0
    } else if a < 1.0 {
        a * a * a
    } else if a < 2.0 {
        1.0 - (a - 1.0).powi(3) * value_at_two
    } else {
        value_at_two / (a - 1.0)
    }
}

pub fn victims_curve(victims: u32) -> f64 {
    match victims {
        0 => 0.0,
        1 => 0.1,
        2..=3 => 0.3,
        4..=5 => 0.7,
        _ => 1.0,
    }
}

/// Stepped on the relative excess of enemy fighters over `minimum`
pub fn population_curve(population: u32, minimum: u32) -> f64 {
    if minimum == 0 {
        return if population > 0 { 1.0 } else { 0.0 };
    }
    let diff = (population as f64 - minimum as f64) / minimum as f64;
    if diff < 0.0 {
        0.0
    } else if diff < 0.1 {
        0.1
    } else if diff < 0.2 {
        0.3
    } else if diff < 0.33 {
        0.6
    } else {
        1.0
    }
}

pub fn gold_curve(gold: u32, minimum: u32) -> f64 {
    if minimum == 0 {
        return if gold > 0 { 1.0 } else { 0.0 };
    }
    let diff = (gold as f64 - minimum as f64) / minimum as f64;
    if diff < 0.0 {
        0.0
    } else if diff < 0.1 {
        0.1
    } else if diff < 0.4 {
        0.3
    } else if diff < 1.0 {
        0.6
    } else {
        1.0
    }
}

pub fn stolen_curve(stolen: u32) -> f64 {
    if stolen == 0 {
        0.0
    } else {
        1.0
    }
}

/// Bonus for finishing off an enemy that has fallen below half its peak
///
/// Silent while the enemy's peak is below our own power or while it still
/// holds at least half of that peak; rises linearly as it weakens further.
pub fn finish_off(max_power: f64, current_power: f64, self_power: f64, tuning: &RaidTuning) -> f64 {
    if max_power <= 0.0 || max_power < self_power || current_power * 2.0 >= max_power {
        return 0.0;
    }
    1.0 - 2.0 * (current_power / max_power) * (1.0 - tuning.finish_off_min_prob)
}

/// Combine trigger values by pointwise maximum
///
/// # Panics
///
/// Panics if any value lies outside [0, 1]; that is a bug in a trigger curve
/// and continuing would skew every later decision.
pub fn combine(values: impl IntoIterator<Item = f64>) -> f64 {
    values.into_iter().fold(0.0, |acc, value| {
        assert!(
            (0.0..=1.0).contains(&value),
            "trigger probability {} outside [0, 1]",
            value
        );
        acc.max(value)
    })
}
