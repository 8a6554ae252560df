//! Actor state held in the world arena

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::types::{ActorId, FactionId, ItemId, LevelId, Position, Time, TribeId};

/// Role and condition flags queried by the faction AI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorTrait {
    /// Eligible for raid teams
    Fighter,
    /// Conjured or temporary; never drafted into a raid
    Summoned,
    /// Faction leader; spawning one makes it the collective's leader
    Leader,
    Invisible,
}

/// Which container currently owns the actor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Placement {
    OnLevel { level: LevelId, position: Position },
    /// Between levels during a transfer
    InTransit,
}

/// Everything needed to spawn an actor; the world assigns id and time
#[derive(Debug, Clone)]
pub struct ActorTemplate {
    pub name: String,
    pub tribe: TribeId,
    pub faction: Option<FactionId>,
    pub traits: BTreeSet<ActorTrait>,
    pub combat_power: f64,
}

impl ActorTemplate {
    pub fn new(name: impl Into<String>, tribe: TribeId) -> Self {
        Self {
            name: name.into(),
            tribe,
            faction: None,
            traits: BTreeSet::new(),
            combat_power: 1.0,
        }
    }

    pub fn in_faction(mut self, faction: FactionId) -> Self {
        self.faction = Some(faction);
        self
    }

    pub fn with_trait(mut self, t: ActorTrait) -> Self {
        self.traits.insert(t);
        self
    }

    pub fn with_power(mut self, power: f64) -> Self {
        self.combat_power = power;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorState {
    pub id: ActorId,
    pub name: String,
    pub tribe: TribeId,
    pub faction: Option<FactionId>,
    /// Time of the next turn
    pub local_time: Time,
    pub placement: Placement,
    pub alive: bool,
    pub traits: BTreeSet<ActorTrait>,
    pub combat_power: f64,
    pub seriously_wounded: bool,
    /// Controlled by the player
    pub possessed: bool,
    pub items: Vec<ItemId>,
    pub last_attacker: Option<ActorId>,
}

impl ActorState {
    pub fn from_template(id: ActorId, template: ActorTemplate, local_time: Time) -> Self {
        Self {
            id,
            name: template.name,
            tribe: template.tribe,
            faction: template.faction,
            local_time,
            placement: Placement::InTransit,
            alive: true,
            traits: template.traits,
            combat_power: template.combat_power,
            seriously_wounded: false,
            possessed: false,
            items: Vec::new(),
            last_attacker: None,
        }
    }

    pub fn is_dead(&self) -> bool {
        !self.alive
    }

    pub fn has_trait(&self, t: ActorTrait) -> bool {
        self.traits.contains(&t)
    }

    pub fn level(&self) -> Option<LevelId> {
        match self.placement {
            Placement::OnLevel { level, .. } => Some(level),
            Placement::InTransit => None,
        }
    }

    pub fn position(&self) -> Option<Position> {
        match self.placement {
            Placement::OnLevel { position, .. } => Some(position),
            Placement::InTransit => None,
        }
    }

    pub fn is_on(&self, level: LevelId) -> bool {
        self.level() == Some(level)
    }

    /// Combat power counted toward the faction's danger level
    pub fn effective_power(&self) -> f64 {
        if self.alive {
            self.combat_power
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_builder() {
        let template = ActorTemplate::new("Guard", TribeId(1))
            .in_faction(FactionId(0))
            .with_trait(ActorTrait::Fighter)
            .with_power(4.0);
        let actor = ActorState::from_template(ActorId(9), template, 3.0);
        assert_eq!(actor.id, ActorId(9));
        assert_eq!(actor.local_time, 3.0);
        assert!(actor.has_trait(ActorTrait::Fighter));
        assert!(!actor.has_trait(ActorTrait::Summoned));
        assert_eq!(actor.faction, Some(FactionId(0)));
        assert_eq!(actor.placement, Placement::InTransit);
    }

    #[test]
    fn test_dead_actor_has_no_power() {
        let mut actor =
            ActorState::from_template(ActorId(1), ActorTemplate::new("Imp", TribeId(0)).with_power(2.0), 0.0);
        assert_eq!(actor.effective_power(), 2.0);
        actor.alive = false;
        assert!(actor.is_dead());
        assert_eq!(actor.effective_power(), 0.0);
    }

    #[test]
    fn test_placement_accessors() {
        let mut actor = ActorState::from_template(ActorId(1), ActorTemplate::new("Imp", TribeId(0)), 0.0);
        assert_eq!(actor.level(), None);
        actor.placement = Placement::OnLevel {
            level: LevelId(2),
            position: Position::new(1, 4),
        };
        assert!(actor.is_on(LevelId(2)));
        assert_eq!(actor.position(), Some(Position::new(1, 4)));
    }
}
