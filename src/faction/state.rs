//! Grudge counters a village keeps about its enemy
//!
//! Combat and pickup events write here; trigger evaluation only reads.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::types::ItemId;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FactionState {
    /// Weighted kill count: whole points for members, fractions for kin
    pub victims: f64,
    pub stolen_items: u32,
    /// Sticky: set the first time an enemy is seen inside the territory
    pub entries: bool,
    /// Highest enemy combat power ever observed
    pub max_enemy_power: f64,
    /// Items lying in the territory that count as theft when picked up
    owned_items: BTreeSet<ItemId>,
}

impl FactionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_member_killed(&mut self) {
        self.victims += 1.0;
    }

    /// A same-tribe actor from another village was killed
    pub fn record_kin_killed(&mut self, weight: f64) {
        self.victims += weight;
    }

    /// Whole victims, as read by the stepped victims curve
    pub fn victim_count(&self) -> u32 {
        self.victims.floor() as u32
    }

    pub fn own_items(&mut self, items: impl IntoIterator<Item = ItemId>) {
        self.owned_items.extend(items);
    }

    pub fn owns(&self, item: ItemId) -> bool {
        self.owned_items.contains(&item)
    }

    /// Count the owned items among `items` as stolen; returns how many were
    pub fn record_theft(&mut self, items: &[ItemId]) -> u32 {
        let mut stolen = 0;
        for item in items {
            if self.owned_items.remove(item) {
                stolen += 1;
            }
        }
        self.stolen_items += stolen;
        stolen
    }

    pub fn mark_entry(&mut self) {
        self.entries = true;
    }

    pub fn observe_enemy_power(&mut self, power: f64) {
        self.max_enemy_power = self.max_enemy_power.max(power);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_victims_accumulate_fractionally() {
        let mut state = FactionState::new();
        state.record_member_killed();
        state.record_kin_killed(0.15);
        state.record_kin_killed(0.15);
        assert!((state.victims - 1.3).abs() < 1e-9);
        assert_eq!(state.victim_count(), 1);
    }

    #[test]
    fn test_theft_only_counts_owned_items_once() {
        let mut state = FactionState::new();
        state.own_items([ItemId(1), ItemId(2)]);
        assert_eq!(state.record_theft(&[ItemId(1), ItemId(9)]), 1);
        assert_eq!(state.record_theft(&[ItemId(1)]), 0);
        assert_eq!(state.stolen_items, 1);
        assert!(!state.owns(ItemId(1)));
        assert!(state.owns(ItemId(2)));
    }

    #[test]
    fn test_max_enemy_power_never_decreases() {
        let mut state = FactionState::new();
        state.observe_enemy_power(10.0);
        state.observe_enemy_power(4.0);
        assert_eq!(state.max_enemy_power, 10.0);
        state.observe_enemy_power(12.0);
        assert_eq!(state.max_enemy_power, 12.0);
    }

    #[test]
    fn test_entries_flag_is_sticky() {
        let mut state = FactionState::new();
        assert!(!state.entries);
        state.mark_entry();
        state.mark_entry();
        assert!(state.entries);
    }
}
