//! Turn logic plugged into actors
//!
//! A mind never mutates the world directly. It reads the world, then returns
//! a `Turn`: how long the turn took and the requests the world should apply
//! on its behalf, in order.

use crate::core::types::{ActorId, ItemId, LevelId, Position, Time};
use crate::ecs::world::World;
use crate::entity::actor::ActorState;
use crate::world::graph::Hop;

/// Side effects an actor asks for during its turn
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    MoveTo(Position),
    /// Take a specific connector from the current level
    TakeConnector(Hop),
    /// Take the next connector on the way to `LevelId`
    TravelToward(LevelId),
    /// Attack another actor; a lethal strike kills, otherwise it wounds
    Strike { victim: ActorId, lethal: bool },
    PickUp(Vec<ItemId>),
    /// The assigned raid task is done
    CompleteTask,
    Die,
    /// Hand player control to another actor
    Possess(ActorId),
    /// Give up player control
    Unpossess,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    /// Time the turn consumed; must be positive
    pub elapsed: Time,
    pub requests: Vec<Request>,
}

impl Turn {
    pub fn wait(elapsed: Time) -> Self {
        Self {
            elapsed,
            requests: Vec::new(),
        }
    }

    pub fn with(mut self, request: Request) -> Self {
        self.requests.push(request);
        self
    }
}

pub trait Mind {
    fn make_move(&mut self, me: &ActorState, world: &World) -> Turn;
}

impl<F> Mind for F
where
    F: FnMut(&ActorState, &World) -> Turn,
{
    fn make_move(&mut self, me: &ActorState, world: &World) -> Turn {
        self(me, world)
    }
}

/// Does nothing, at a fixed speed
#[derive(Debug, Clone, Copy)]
pub struct IdleMind {
    pub speed: Time,
}

impl IdleMind {
    pub fn new(speed: Time) -> Self {
        Self { speed }
    }
}

impl Default for IdleMind {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Mind for IdleMind {
    fn make_move(&mut self, _me: &ActorState, _world: &World) -> Turn {
        Turn::wait(self.speed)
    }
}
