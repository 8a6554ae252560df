//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};

/// World time, measured in turns. Ticks fire at whole multiples of the
/// configured tick interval.
pub type Time = f64;

/// Unique identifier for actors
///
/// Ids are handed out in spawn order and never reused, so they double as the
/// scheduler's tie-break key and survive a save/restore cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u64);

/// Index of a level inside the world's level arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LevelId(pub u32);

impl LevelId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a faction (village controller) inside the world
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FactionId(pub u32);

impl FactionId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Unique identifier for a raid team, scoped to the owning faction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u64);

/// Tribes decide who is hostile to whom, independently of faction membership
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TribeId(pub u32);

/// An independently simulated group of levels (a campaign site)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShardId(pub u32);

/// Position of a shard on the campaign grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ShardCoord {
    pub x: i32,
    pub y: i32,
}

impl ShardCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Chebyshev distance: diagonal neighbours are adjacent
    pub fn distance(&self, other: &Self) -> u32 {
        (self.x - other.x).unsigned_abs().max((self.y - other.y).unsigned_abs())
    }
}

/// Tile position inside a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Direction of travel through a connector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

/// Key shared by the two ends of a connector (a staircase, a tunnel...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectorKey(pub u32);

/// Room types a collective can construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomKind {
    Throne,
    ImpaledHead,
    Treasury,
    Library,
    Workshop,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_opposite() {
        assert_eq!(Direction::Up.opposite(), Direction::Down);
        assert_eq!(Direction::Down.opposite(), Direction::Up);
        assert_eq!(Direction::Up.opposite().opposite(), Direction::Up);
    }

    #[test]
    fn test_shard_distance_is_chebyshev() {
        let origin = ShardCoord::new(0, 0);
        assert_eq!(origin.distance(&ShardCoord::new(1, 1)), 1);
        assert_eq!(origin.distance(&ShardCoord::new(-1, 0)), 1);
        assert_eq!(origin.distance(&ShardCoord::new(3, -2)), 3);
        assert_eq!(origin.distance(&origin), 0);
    }

    #[test]
    fn test_actor_id_ordering() {
        // Spawn order is the tie-break order
        assert!(ActorId(1) < ActorId(2));
        let mut ids = vec![ActorId(5), ActorId(1), ActorId(3)];
        ids.sort();
        assert_eq!(ids, vec![ActorId(1), ActorId(3), ActorId(5)]);
    }
}
