//! Level graph and connector reachability
//!
//! Levels are nodes, connectors are paired directed edges keyed by
//! `(direction, key, source)`. After construction the graph computes, for
//! every ordered pair of levels that can reach each other, one connector that
//! starts a path between them. Travellers resolve one hop at a time and
//! re-query after each hop, so the table never stores full paths.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::error::{DelveError, Result};
use crate::core::types::{ConnectorKey, Direction, LevelId, Position};
use crate::world::level::Level;

/// One step through a connector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hop {
    pub direction: Direction,
    pub key: ConnectorKey,
}

impl Hop {
    pub fn new(direction: Direction, key: ConnectorKey) -> Self {
        Self { direction, key }
    }

    /// The same connector taken from the other end
    pub fn reversed(self) -> Self {
        Self::new(self.direction.opposite(), self.key)
    }
}

/// A connector as it was declared during world construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub direction: Direction,
    pub key: ConnectorKey,
    pub from: LevelId,
    pub to: LevelId,
}

#[derive(Debug, Clone, Default)]
pub struct WorldGraph {
    levels: BTreeSet<LevelId>,
    edges: BTreeMap<(Direction, ConnectorKey, LevelId), LevelId>,
    links: Vec<Link>,
    /// first hop from the outer level toward the inner one
    reach: BTreeMap<LevelId, BTreeMap<LevelId, Hop>>,
    built: bool,
}

impl WorldGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_level(&mut self, level: LevelId) {
        if self.levels.insert(level) {
            self.built = false;
        }
    }

    pub fn contains_level(&self, level: LevelId) -> bool {
        self.levels.contains(&level)
    }

    pub fn levels(&self) -> impl Iterator<Item = LevelId> + '_ {
        self.levels.iter().copied()
    }

    /// Connectors in declaration order
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Connect `a` to `b`: going `direction` through `key` from `a` leads to
    /// `b`, and the opposite direction from `b` leads back to `a`.
    pub fn add_connector(
        &mut self,
        direction: Direction,
        key: ConnectorKey,
        a: LevelId,
        b: LevelId,
    ) -> Result<()> {
        for level in [a, b] {
            if !self.levels.contains(&level) {
                return Err(DelveError::UnknownLevel(level));
            }
        }
        if a == b {
            return Err(DelveError::Config(format!(
                "connector {:?} links {:?} to itself",
                key, a
            )));
        }
        let forward = (direction, key, a);
        let backward = (direction.opposite(), key, b);
        for edge in [forward, backward] {
            if let Some(existing) = self.edges.get(&edge) {
                return Err(DelveError::Config(format!(
                    "connector {:?} {:?} from {:?} already leads to {:?}",
                    edge.0, edge.1, edge.2, existing
                )));
            }
        }

        self.edges.insert(forward, b);
        self.edges.insert(backward, a);
        self.links.push(Link {
            direction,
            key,
            from: a,
            to: b,
        });
        self.built = false;
        Ok(())
    }

    /// Where taking `hop` from `level` leads, if that connector exists
    pub fn follow(&self, level: LevelId, hop: Hop) -> Option<LevelId> {
        self.edges.get(&(hop.direction, hop.key, level)).copied()
    }

    /// Compute the first-hop table for every reachable ordered pair
    ///
    /// Direct adjacencies are recorded first, then every level inherits the
    /// entries of its direct neighbours until nothing changes. Among several
    /// valid bridges the first one found in level order wins.
    pub fn build_reachability(&mut self) -> Result<()> {
        let mut direct: BTreeMap<LevelId, BTreeMap<LevelId, Hop>> = BTreeMap::new();
        for (&(direction, key, from), &to) in &self.edges {
            direct
                .entry(from)
                .or_default()
                .entry(to)
                .or_insert(Hop::new(direction, key));
        }

        let mut reach: BTreeMap<LevelId, BTreeMap<LevelId, Hop>> = self
            .levels
            .iter()
            .map(|&level| (level, direct.get(&level).cloned().unwrap_or_default()))
            .collect();

        // Bridges are always direct neighbours, so following the stored hop
        // lands on a level whose own entry was recorded earlier and hop-by-hop
        // travel cannot cycle.
        let mut changed = true;
        while changed {
            changed = false;
            for &a in &self.levels {
                let Some(bridges) = direct.get(&a) else {
                    continue;
                };
                for (&b, &hop) in bridges {
                    let beyond: Vec<LevelId> = reach
                        .get(&b)
                        .map(|m| m.keys().copied().collect())
                        .unwrap_or_default();
                    let row = reach.entry(a).or_default();
                    for c in beyond {
                        if c != a && !row.contains_key(&c) {
                            row.insert(c, hop);
                            changed = true;
                        }
                    }
                }
            }
        }

        self.verify_components(&reach)?;
        self.reach = reach;
        self.built = true;
        tracing::debug!(
            "Reachability built: {} levels, {} connectors",
            self.levels.len(),
            self.links.len()
        );
        Ok(())
    }

    /// Every pair of levels in one connected component must resolve
    fn verify_components(&self, reach: &BTreeMap<LevelId, BTreeMap<LevelId, Hop>>) -> Result<()> {
        for component in self.components() {
            for &a in &component {
                for &b in &component {
                    if a == b {
                        continue;
                    }
                    let resolved = reach.get(&a).is_some_and(|row| row.contains_key(&b));
                    if !resolved {
                        return Err(DelveError::Topology(format!(
                            "levels {:?} and {:?} are connected but no connector leads from one to the other",
                            a, b
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Connected components of the undirected edge set, in level order
    pub fn components(&self) -> Vec<Vec<LevelId>> {
        let mut neighbours: BTreeMap<LevelId, BTreeSet<LevelId>> = BTreeMap::new();
        for (&(_, _, from), &to) in &self.edges {
            neighbours.entry(from).or_default().insert(to);
            neighbours.entry(to).or_default().insert(from);
        }

        let mut seen = BTreeSet::new();
        let mut components = Vec::new();
        for &start in &self.levels {
            if !seen.insert(start) {
                continue;
            }
            let mut component = vec![start];
            let mut stack = vec![start];
            while let Some(level) = stack.pop() {
                for &next in neighbours.get(&level).into_iter().flatten() {
                    if seen.insert(next) {
                        component.push(next);
                        stack.push(next);
                    }
                }
            }
            component.sort();
            components.push(component);
        }
        components
    }

    /// First connector to take from `from` toward `to`
    ///
    /// Returns `None` when already there. Unknown levels, a stale table or a
    /// missing route are errors: they mean the world was built wrong.
    pub fn resolve_hop(&self, from: LevelId, to: LevelId) -> Result<Option<Hop>> {
        for level in [from, to] {
            if !self.levels.contains(&level) {
                return Err(DelveError::UnknownLevel(level));
            }
        }
        if from == to {
            return Ok(None);
        }
        if !self.built {
            return Err(DelveError::Topology(
                "reachability requested before build_reachability".into(),
            ));
        }
        self.reach
            .get(&from)
            .and_then(|row| row.get(&to))
            .copied()
            .map(Some)
            .ok_or(DelveError::NoRoute { from, to })
    }

    pub fn is_reachable(&self, from: LevelId, to: LevelId) -> bool {
        from == to || self.reach.get(&from).is_some_and(|row| row.contains_key(&to))
    }

    /// Tiles on `level` where a traveller coming through `hop` lands
    pub fn landing_positions(
        &self,
        levels: &[Box<dyn Level>],
        level: LevelId,
        hop: Hop,
    ) -> Result<Vec<Position>> {
        if !self.levels.contains(&level) {
            return Err(DelveError::UnknownLevel(level));
        }
        let target = levels
            .get(level.index())
            .ok_or(DelveError::UnknownLevel(level))?;
        Ok(target.landing_positions(hop.direction, hop.key))
    }
}
