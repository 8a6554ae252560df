//! Delve - turn scheduling, level topology and village raid AI for a
//! multi-level dungeon world

pub mod core;
pub mod ecs;
pub mod entity;
pub mod faction;
pub mod schedule;
pub mod simulation;
pub mod world;
