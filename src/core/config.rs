//! Simulation configuration with documented constants
//!
//! The raid probabilities are game-balance values. The way they are combined
//! (pointwise maximum) is fixed in `faction::trigger`; everything here is
//! tunable without touching the algorithms.

use serde::{Deserialize, Serialize};

use crate::core::error::{DelveError, Result};

/// Configuration for the scheduler and the raid decision engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// World time between two periodic tick boundaries
    ///
    /// Level ticks, faction updates and the cemetery pass run exactly once
    /// per boundary, no matter how many actor turns fall inside it.
    pub tick_interval: f64,

    /// Delay before a freshly spawned actor takes its first turn
    pub spawn_delay: f64,

    /// Raid decision tuning
    pub raid: RaidTuning,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval: 1.0,
            spawn_delay: 1.0,
            raid: RaidTuning::default(),
        }
    }
}

/// Tunable constants for the raid decision engine
///
/// Each `*_max_prob` scales a trigger curve that saturates at 1.0, so the
/// value is the per-evaluation attack chance when that trigger is the most
/// compelling one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RaidTuning {
    /// Chance that a faction evaluates its triggers at a given boundary
    ///
    /// The combined probability is divided by this value afterwards, so the
    /// expected attack rate per boundary does not depend on it. Keeping it
    /// below 1 stops factions from deciding in lock-step.
    pub update_freq: f64,

    /// Attack chance once a timer trigger has expired
    pub timer_prob: f64,

    /// Rather small chance to attack just because the enemy is comparably strong
    pub power_max_prob: f64,
    pub victims_max_prob: f64,
    pub population_max_prob: f64,
    pub gold_max_prob: f64,
    pub stolen_max_prob: f64,
    pub entry_max_prob: f64,
    pub finish_off_max_prob: f64,
    pub proximity_max_prob: f64,

    /// Power ratio below which the power trigger stays silent
    pub power_floor_ratio: f64,

    /// Power trigger value when we are twice as strong as the enemy
    pub power_value_at_two: f64,

    /// Finish-off curve value when the enemy sits exactly at half its peak
    pub finish_off_min_prob: f64,

    /// Victim score added when a same-tribe actor outside the faction is killed
    pub other_victim_weight: f64,

    /// Ransom demand is `fraction * U(ransom_low, ransom_high) * enemy gold`
    pub ransom_low: f64,
    pub ransom_high: f64,

    /// Per-room attack chance for the room-built trigger
    pub throne_room_prob: f64,
    pub impaled_head_prob: f64,

    /// Rooms beyond this many of one kind add nothing to the room-built
    /// trigger; `max_counted_rooms * room prob` must stay within 1
    pub max_counted_rooms: u32,

    /// Camp-and-spawn raids draw their camp size, wave size and wave count
    /// from this half-open range
    pub camp_min: u32,
    pub camp_max: u32,
}

impl Default for RaidTuning {
    fn default() -> Self {
        Self {
            update_freq: 0.1,
            timer_prob: 0.05,
            power_max_prob: 1.0 / 10000.0,
            victims_max_prob: 1.0 / 500.0,
            population_max_prob: 1.0 / 500.0,
            gold_max_prob: 1.0 / 1000.0,
            stolen_max_prob: 1.0 / 300.0,
            entry_max_prob: 1.0 / 20.0,
            finish_off_max_prob: 1.0 / 1000.0,
            proximity_max_prob: 1.0 / 5000.0,
            power_floor_ratio: 0.4,
            power_value_at_two: 0.5,
            finish_off_min_prob: 0.25,
            other_victim_weight: 0.15,
            ransom_low: 0.6,
            ransom_high: 1.5,
            throne_room_prob: 0.001,
            impaled_head_prob: 0.000125,
            max_counted_rooms: 100,
            camp_min: 3,
            camp_max: 7,
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document; missing keys fall back to defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(content)?;
        config.validate().map_err(DelveError::Config)?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !(self.tick_interval > 0.0 && self.tick_interval.is_finite()) {
            return Err(format!("tick_interval ({}) must be positive", self.tick_interval));
        }
        if !(self.spawn_delay > 0.0 && self.spawn_delay.is_finite()) {
            return Err(format!("spawn_delay ({}) must be positive", self.spawn_delay));
        }
        self.raid.validate()
    }
}

impl RaidTuning {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !(self.update_freq > 0.0 && self.update_freq <= 1.0) {
            return Err(format!("update_freq ({}) must lie in (0, 1]", self.update_freq));
        }

        let probabilities = [
            ("timer_prob", self.timer_prob),
            ("power_max_prob", self.power_max_prob),
            ("victims_max_prob", self.victims_max_prob),
            ("population_max_prob", self.population_max_prob),
            ("gold_max_prob", self.gold_max_prob),
            ("stolen_max_prob", self.stolen_max_prob),
            ("entry_max_prob", self.entry_max_prob),
            ("finish_off_max_prob", self.finish_off_max_prob),
            ("proximity_max_prob", self.proximity_max_prob),
            ("finish_off_min_prob", self.finish_off_min_prob),
            ("throne_room_prob", self.throne_room_prob),
            ("impaled_head_prob", self.impaled_head_prob),
        ];
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{} ({}) must lie in [0, 1]", name, value));
            }
        }

        for (name, value) in [
            ("throne_room_prob", self.throne_room_prob),
            ("impaled_head_prob", self.impaled_head_prob),
        ] {
            if self.max_counted_rooms as f64 * value > 1.0 {
                return Err(format!(
                    "{} ({}) times max_counted_rooms ({}) exceeds 1",
                    name, value, self.max_counted_rooms
                ));
            }
        }

        if !(self.power_value_at_two > 0.0 && self.power_value_at_two <= 1.0) {
            return Err(format!(
                "power_value_at_two ({}) must lie in (0, 1]",
                self.power_value_at_two
            ));
        }
        if self.ransom_low < 0.0 || self.ransom_low > self.ransom_high {
            return Err(format!(
                "ransom range [{}, {}] is empty or negative",
                self.ransom_low, self.ransom_high
            ));
        }
        if self.camp_min == 0 || self.camp_min >= self.camp_max {
            return Err(format!(
                "camp range [{}, {}) must be non-empty and start above zero",
                self.camp_min, self.camp_max
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_toml_overrides_keep_defaults() {
        let config = SimulationConfig::from_toml_str(
            r#"
            tick_interval = 2.0

            [raid]
            update_freq = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(config.tick_interval, 2.0);
        assert_eq!(config.raid.update_freq, 0.5);
        assert_eq!(config.raid.timer_prob, 0.05);
        assert_eq!(config.spawn_delay, 1.0);
    }

    #[test]
    fn test_invalid_probability_is_rejected() {
        let result = SimulationConfig::from_toml_str(
            r#"
            [raid]
            entry_max_prob = 1.5
            "#,
        );
        assert!(matches!(result, Err(DelveError::Config(_))));
    }

    #[test]
    fn test_room_cap_must_keep_probability_in_range() {
        let result = SimulationConfig::from_toml_str(
            r#"
            [raid]
            throne_room_prob = 0.05
            "#,
        );
        assert!(matches!(result, Err(DelveError::Config(_))));

        let mut config = SimulationConfig::default();
        config.raid.throne_room_prob = 0.05;
        config.raid.max_counted_rooms = 20;
        assert!(config.validate().is_ok());
        config.raid.max_counted_rooms = 21;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml_is_rejected() {
        let result = SimulationConfig::from_toml_str("tick_interval = \"soon\"");
        assert!(matches!(result, Err(DelveError::TomlError(_))));
    }

    #[test]
    fn test_zero_update_freq_is_rejected() {
        let mut config = SimulationConfig::default();
        config.raid.update_freq = 0.0;
        assert!(config.validate().is_err());
    }
}
