//! Villain configuration loaded from TOML
//!
//! A villain is what turns a passive village into a raider: population
//! thresholds, the triggers it listens to, what its raids do once launched,
//! and the optional ransom and welcome message.

use std::fs;
use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::RaidTuning;
use crate::core::error::{DelveError, Result};
use crate::core::types::FactionId;
use crate::faction::raid::RaidTask;
use crate::faction::trigger::{room_prob, Trigger};

/// Creatures a camp-and-spawn raid keeps summoning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnGroup {
    pub name: String,
    pub combat_power: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RaidBehavior {
    KillLeader,
    KillMembers { count: u32 },
    StealGold,
    CampAndSpawn { spawns: SpawnGroup },
}

/// Ransom terms offered to the enemy when a raid is launched
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ransom {
    /// Share of the enemy's gold asked for, before the random spread
    pub fraction: f64,
    /// No ransom is demanded from an enemy poorer than this
    pub minimum: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WelcomeMessage {
    DragonWelcome,
}

impl WelcomeMessage {
    pub fn text(&self) -> &'static str {
        match self {
            WelcomeMessage::DragonWelcome => {
                "I can see you, invisible one. You may enter my lair, but mind your manners."
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Villain {
    /// Members that always stay home
    pub min_population: u32,
    pub min_team_size: u32,
    pub triggers: Vec<Trigger>,
    pub behavior: RaidBehavior,
    #[serde(default)]
    pub welcome_message: Option<WelcomeMessage>,
    #[serde(default)]
    pub ransom: Option<Ransom>,
}

impl Villain {
    pub fn new(min_population: u32, min_team_size: u32, behavior: RaidBehavior) -> Self {
        Self {
            min_population,
            min_team_size,
            triggers: Vec::new(),
            behavior,
            welcome_message: None,
            ransom: None,
        }
    }

    pub fn with_trigger(mut self, trigger: Trigger) -> Self {
        self.triggers.push(trigger);
        self
    }

    pub fn with_ransom(mut self, fraction: f64, minimum: u32) -> Self {
        self.ransom = Some(Ransom { fraction, minimum });
        self
    }

    pub fn with_welcome(mut self, message: WelcomeMessage) -> Self {
        self.welcome_message = Some(message);
        self
    }

    pub fn from_toml_str(content: &str, tuning: &RaidTuning) -> Result<Self> {
        let villain: Villain = toml::from_str(content)?;
        villain.validate(tuning)?;
        Ok(villain)
    }

    /// Loads a villain definition such as `data/villains/dragon.toml`
    pub fn load(path: impl AsRef<Path>, tuning: &RaidTuning) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents, tuning)
    }

    pub fn validate(&self, tuning: &RaidTuning) -> Result<()> {
        if self.min_team_size == 0 {
            return Err(DelveError::Config("min_team_size must be at least 1".into()));
        }
        if self.triggers.is_empty() {
            return Err(DelveError::Config("villain has no attack triggers".into()));
        }
        for trigger in &self.triggers {
            match trigger {
                Trigger::RoomBuilt { room } if room_prob(*room, tuning).is_none() => {
                    return Err(DelveError::Config(format!(
                        "room trigger does not support {:?}",
                        room
                    )));
                }
                Trigger::Timer { at } if !at.is_finite() => {
                    return Err(DelveError::Config(format!("timer trigger at {}", at)));
                }
                Trigger::EnemyPopulation { minimum: 0 } | Trigger::Gold { minimum: 0 } => {
                    return Err(DelveError::Config(format!(
                        "{:?} needs a positive minimum",
                        trigger
                    )));
                }
                _ => {}
            }
        }
        match &self.behavior {
            RaidBehavior::KillMembers { count: 0 } => {
                return Err(DelveError::Config("kill_members needs a positive count".into()));
            }
            RaidBehavior::CampAndSpawn { spawns } if spawns.combat_power < 0.0 => {
                return Err(DelveError::Config(format!(
                    "spawn group {} has negative power",
                    spawns.name
                )));
            }
            _ => {}
        }
        if let Some(ransom) = &self.ransom {
            if !(ransom.fraction > 0.0 && ransom.fraction.is_finite()) {
                return Err(DelveError::Config(format!(
                    "ransom fraction {} must be positive",
                    ransom.fraction
                )));
            }
        }
        Ok(())
    }

    /// Task given to every member of a raid launched against `enemy`
    pub fn attack_task<R: Rng>(
        &self,
        enemy: FactionId,
        home: FactionId,
        rng: &mut R,
        tuning: &RaidTuning,
    ) -> RaidTask {
        match &self.behavior {
            RaidBehavior::KillLeader => RaidTask::AttackLeader { target: enemy },
            RaidBehavior::KillMembers { count } => RaidTask::KillFighters {
                target: enemy,
                count: *count,
            },
            RaidBehavior::StealGold => RaidTask::StealFrom {
                target: enemy,
                deliver_to: home,
            },
            RaidBehavior::CampAndSpawn { spawns } => RaidTask::CampAndSpawn {
                target: enemy,
                spawns: spawns.clone(),
                camp_size: rng.gen_range(tuning.camp_min..tuning.camp_max),
                wave_size: (tuning.camp_min, tuning.camp_max),
                waves: rng.gen_range(tuning.camp_min..tuning.camp_max),
            },
        }
    }

    /// Ransom demanded from an enemy holding `enemy_gold`, if any
    pub fn ransom_demand<R: Rng>(&self, enemy_gold: u32, rng: &mut R, tuning: &RaidTuning) -> Option<u32> {
        let ransom = self.ransom?;
        if enemy_gold < ransom.minimum {
            return None;
        }
        let share = rng.gen_range(ransom.fraction * tuning.ransom_low..=ransom.fraction * tuning.ransom_high);
        let demand = (share * enemy_gold as f64) as u32;
        Some(demand.max(ransom.minimum))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::RoomKind;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const DRAGON: &str = r#"
        min_population = 0
        min_team_size = 1
        welcome_message = "dragon_welcome"
        triggers = [
            { kind = "power" },
            { kind = "room_built", room = "throne" },
            { kind = "finish_off" },
        ]

        [behavior]
        kind = "kill_leader"

        [ransom]
        fraction = 0.5
        minimum = 100
    "#;

    #[test]
    fn test_parse_villain() {
        let tuning = RaidTuning::default();
        let villain = Villain::from_toml_str(DRAGON, &tuning).unwrap();
        assert_eq!(villain.min_team_size, 1);
        assert_eq!(villain.triggers.len(), 3);
        assert_eq!(villain.behavior, RaidBehavior::KillLeader);
        assert_eq!(villain.welcome_message, Some(WelcomeMessage::DragonWelcome));
        assert_eq!(
            villain.ransom,
            Some(Ransom {
                fraction: 0.5,
                minimum: 100
            })
        );
    }

    #[test]
    fn test_unsupported_room_is_rejected() {
        let tuning = RaidTuning::default();
        let villain = Villain::new(4, 2, RaidBehavior::StealGold).with_trigger(Trigger::RoomBuilt {
            room: RoomKind::Library,
        });
        assert!(matches!(villain.validate(&tuning), Err(DelveError::Config(_))));
    }

    #[test]
    fn test_degenerate_villains_are_rejected() {
        let tuning = RaidTuning::default();
        let no_triggers = Villain::new(4, 2, RaidBehavior::StealGold);
        assert!(no_triggers.validate(&tuning).is_err());

        let empty_team = Villain::new(4, 0, RaidBehavior::StealGold).with_trigger(Trigger::Entry);
        assert!(empty_team.validate(&tuning).is_err());

        let kill_none =
            Villain::new(4, 2, RaidBehavior::KillMembers { count: 0 }).with_trigger(Trigger::Entry);
        assert!(kill_none.validate(&tuning).is_err());
    }

    #[test]
    fn test_missing_villain_file_is_io_error() {
        let tuning = RaidTuning::default();
        let path = std::env::temp_dir().join("delve-no-such-villain.toml");
        assert!(matches!(
            Villain::load(&path, &tuning),
            Err(DelveError::IoError(_))
        ));
    }

    #[test]
    fn test_ransom_respects_minimum_and_range() {
        let tuning = RaidTuning::default();
        let villain = Villain::new(0, 1, RaidBehavior::KillLeader)
            .with_trigger(Trigger::Entry)
            .with_ransom(0.5, 100);
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        assert_eq!(villain.ransom_demand(99, &mut rng, &tuning), None);
        for _ in 0..50 {
            let demand = villain.ransom_demand(1000, &mut rng, &tuning).unwrap();
            assert!((300..=750).contains(&demand), "demand {}", demand);
        }
        // Poor enemy: the floor wins
        let demand = villain.ransom_demand(120, &mut rng, &tuning).unwrap();
        assert_eq!(demand, 100);
    }

    #[test]
    fn test_attack_task_matches_behavior() {
        let tuning = RaidTuning::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let villain = Villain::new(0, 1, RaidBehavior::StealGold).with_trigger(Trigger::Entry);
        assert_eq!(
            villain.attack_task(FactionId(1), FactionId(0), &mut rng, &tuning),
            RaidTask::StealFrom {
                target: FactionId(1),
                deliver_to: FactionId(0)
            }
        );

        let camp = Villain::new(
            0,
            1,
            RaidBehavior::CampAndSpawn {
                spawns: SpawnGroup {
                    name: "Imp".into(),
                    combat_power: 1.0,
                },
            },
        );
        match camp.attack_task(FactionId(1), FactionId(0), &mut rng, &tuning) {
            RaidTask::CampAndSpawn {
                camp_size, waves, ..
            } => {
                assert!((3..7).contains(&camp_size));
                assert!((3..7).contains(&waves));
            }
            other => panic!("unexpected task {:?}", other),
        }
    }
}
