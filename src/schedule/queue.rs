//! Time-ordered actor queue
//!
//! Actors are ordered by `(local_time ASC, actor_id ASC)`: at equal times the
//! actor spawned first moves first. The queue never owns actors, it only
//! tracks ids and the time each one was scheduled at. A side index maps ids
//! back to their ordering key so removal and rescheduling stay O(log n).

use std::collections::BTreeSet;

use ahash::AHashMap;
use ordered_float::OrderedFloat;

use crate::core::error::{DelveError, Result};
use crate::core::types::{ActorId, Time};

type QueueKey = (OrderedFloat<Time>, ActorId);

/// An actor together with the time of its next turn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scheduled {
    pub actor: ActorId,
    pub time: Time,
}

#[derive(Debug, Clone, Default)]
pub struct ActorQueue {
    order: BTreeSet<QueueKey>,
    index: AHashMap<ActorId, OrderedFloat<Time>>,
}

impl ActorQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, actor: ActorId) -> bool {
        self.index.contains_key(&actor)
    }

    /// Time the actor is currently scheduled at
    pub fn time_of(&self, actor: ActorId) -> Option<Time> {
        self.index.get(&actor).map(|t| t.into_inner())
    }

    pub fn insert(&mut self, actor: ActorId, time: Time) -> Result<()> {
        if !time.is_finite() {
            return Err(DelveError::InvalidTime { actor, time });
        }
        if self.index.contains_key(&actor) {
            return Err(DelveError::AlreadyScheduled(actor));
        }
        let time = OrderedFloat(time);
        self.order.insert((time, actor));
        self.index.insert(actor, time);
        Ok(())
    }

    /// Stop tracking an actor, returning the time it was scheduled at
    pub fn remove(&mut self, actor: ActorId) -> Result<Time> {
        let time = self
            .index
            .remove(&actor)
            .ok_or(DelveError::NotScheduled(actor))?;
        let removed = self.order.remove(&(time, actor));
        debug_assert!(removed, "queue index and order out of sync for {:?}", actor);
        Ok(time.into_inner())
    }

    /// Move an actor to a new time; equivalent to remove followed by insert
    pub fn reschedule(&mut self, actor: ActorId, time: Time) -> Result<()> {
        if !time.is_finite() {
            return Err(DelveError::InvalidTime { actor, time });
        }
        let slot = self
            .index
            .get_mut(&actor)
            .ok_or(DelveError::NotScheduled(actor))?;
        let old = std::mem::replace(slot, OrderedFloat(time));
        self.order.remove(&(old, actor));
        self.order.insert((OrderedFloat(time), actor));
        Ok(())
    }

    pub fn peek_earliest(&self) -> Option<Scheduled> {
        self.order.first().map(|&(time, actor)| Scheduled {
            actor,
            time: time.into_inner(),
        })
    }

    pub fn pop_earliest(&mut self) -> Option<Scheduled> {
        let (time, actor) = self.order.pop_first()?;
        self.index.remove(&actor);
        Some(Scheduled {
            actor,
            time: time.into_inner(),
        })
    }

    /// All tracked actors in turn order
    pub fn iter(&self) -> impl Iterator<Item = Scheduled> + '_ {
        self.order.iter().map(|&(time, actor)| Scheduled {
            actor,
            time: time.into_inner(),
        })
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_queue() {
        let mut queue = ActorQueue::new();
        assert!(queue.is_empty());
        assert!(queue.peek_earliest().is_none());
        assert!(queue.pop_earliest().is_none());
    }

    #[test]
    fn test_tie_break_favors_lower_id() {
        let mut queue = ActorQueue::new();
        let a = ActorId(1);
        let b = ActorId(3);
        let c = ActorId(2);
        queue.insert(a, 5.0).unwrap();
        queue.insert(b, 3.0).unwrap();
        queue.insert(c, 3.0).unwrap();

        assert_eq!(queue.pop_earliest().unwrap().actor, c);
        assert_eq!(queue.pop_earliest().unwrap().actor, b);
        assert_eq!(queue.pop_earliest().unwrap().actor, a);
        assert!(queue.pop_earliest().is_none());
    }

    #[test]
    fn test_reschedule_moves_actor() {
        let mut queue = ActorQueue::new();
        queue.insert(ActorId(1), 1.0).unwrap();
        queue.insert(ActorId(2), 2.0).unwrap();

        queue.reschedule(ActorId(1), 10.0).unwrap();
        let first = queue.peek_earliest().unwrap();
        assert_eq!(first.actor, ActorId(2));
        assert_eq!(queue.time_of(ActorId(1)), Some(10.0));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_remove_unknown_actor_is_error() {
        let mut queue = ActorQueue::new();
        assert!(matches!(
            queue.remove(ActorId(7)),
            Err(DelveError::NotScheduled(ActorId(7)))
        ));
        assert!(matches!(
            queue.reschedule(ActorId(7), 1.0),
            Err(DelveError::NotScheduled(ActorId(7)))
        ));
    }

    #[test]
    fn test_double_insert_is_error() {
        let mut queue = ActorQueue::new();
        queue.insert(ActorId(1), 1.0).unwrap();
        assert!(matches!(
            queue.insert(ActorId(1), 2.0),
            Err(DelveError::AlreadyScheduled(_))
        ));
        assert_eq!(queue.time_of(ActorId(1)), Some(1.0));
    }

    #[test]
    fn test_non_finite_time_is_rejected() {
        let mut queue = ActorQueue::new();
        assert!(queue.insert(ActorId(1), f64::NAN).is_err());
        assert!(queue.insert(ActorId(1), f64::INFINITY).is_err());
        queue.insert(ActorId(1), 0.0).unwrap();
        assert!(queue.reschedule(ActorId(1), f64::NAN).is_err());
        assert_eq!(queue.time_of(ActorId(1)), Some(0.0));
    }

    #[test]
    fn test_remove_returns_time() {
        let mut queue = ActorQueue::new();
        queue.insert(ActorId(4), 2.5).unwrap();
        assert_eq!(queue.remove(ActorId(4)).unwrap(), 2.5);
        assert!(!queue.contains(ActorId(4)));
        assert!(queue.peek_earliest().is_none());
    }
}
