//! Weighted relationship graphs over the fixed roster.
//!
//! Both graphs are fully connected at construction and nodes are never
//! removed; elimination only changes weights.

use super::action::ActionKind;
use super::player::{Player, Roster};
use serde::Serialize;
use std::collections::BTreeMap;

pub const INITIAL_CONSPIRACY_WEIGHT: f64 = 1.0;
pub const INITIAL_RELATIONSHIP_WEIGHT: f64 = 6.0 / 9.0;
pub const CONSPIRACY_FLOOR: f64 = 0.01;

/// Undirected "could be on the same team" graph, one edge per unordered pair.
#[derive(Debug, Clone)]
pub struct ConspiracyGraph {
    roster: Roster,
    edges: BTreeMap<(Player, Player), f64>,
    floor: f64,
}

impl ConspiracyGraph {
    pub fn new(roster: Roster) -> Self {
        Self::with_weights(roster, INITIAL_CONSPIRACY_WEIGHT, CONSPIRACY_FLOOR)
    }

    pub fn with_weights(roster: Roster, initial: f64, floor: f64) -> Self {
        let edges = roster
            .pairs()
            .map(|pair| (pair, initial.clamp(0.0, 1.0)))
            .collect();
        Self {
            roster,
            edges,
            floor,
        }
    }

    pub fn roster(&self) -> Roster {
        self.roster
    }

    pub fn node_count(&self) -> usize {
        self.roster.size()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Weight of the edge between `a` and `b`, in either order. Missing edges weigh 0.
    pub fn weight(&self, a: Player, b: Player) -> f64 {
        match self.edges.get(&key(a, b)) {
            Some(weight) => *weight,
            None => {
                debug_assert!(
                    a == b || !self.roster.contains(a) || !self.roster.contains(b),
                    "missing conspiracy edge between roster players {a} and {b}"
                );
                0.0
            }
        }
    }

    /// Scales the pair down by the action's breaking weight, never below the floor.
    pub fn apply_decay(&mut self, a: Player, b: Player, kind: ActionKind) {
        let floor = self.floor;
        let factor = 1.0 - kind.weights().breaking_weight;
        if let Some(weight) = self.edges.get_mut(&key(a, b)) {
            *weight = (*weight * factor).max(floor).min(1.0);
        }
    }

    /// Multiplies every edge touching `player` by `multiplier`.
    pub fn scale_incident(&mut self, player: Player, multiplier: f64) {
        for ((a, b), weight) in self.edges.iter_mut() {
            if *a == player || *b == player {
                *weight = (*weight * multiplier).clamp(0.0, 1.0);
            }
        }
    }

    pub fn sever(&mut self, a: Player, b: Player) {
        if let Some(weight) = self.edges.get_mut(&key(a, b)) {
            *weight = 0.0;
        }
    }

    pub fn export(&self) -> GraphData {
        GraphData {
            nodes: GraphNode::for_roster(self.roster),
            edges: self
                .edges
                .iter()
                .map(|(&(source, target), &weight)| GraphEdge {
                    source,
                    target,
                    weight,
                })
                .collect(),
        }
    }
}

/// Directed graph where edge `a -> b` is how much `a`'s behaviour vouches for `b`.
#[derive(Debug, Clone)]
pub struct RelationshipGraph {
    roster: Roster,
    edges: BTreeMap<(Player, Player), f64>,
}

impl RelationshipGraph {
    pub fn new(roster: Roster) -> Self {
        Self::with_weight(roster, INITIAL_RELATIONSHIP_WEIGHT)
    }

    pub fn with_weight(roster: Roster, initial: f64) -> Self {
        let initial = initial.clamp(0.0, 1.0);
        let mut edges = BTreeMap::new();
        for (a, b) in roster.pairs() {
            edges.insert((a, b), initial);
            edges.insert((b, a), initial);
        }
        Self { roster, edges }
    }

    pub fn roster(&self) -> Roster {
        self.roster
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn weight(&self, source: Player, target: Player) -> f64 {
        match self.edges.get(&(source, target)) {
            Some(weight) => *weight,
            None => {
                debug_assert!(
                    source == target
                        || !self.roster.contains(source)
                        || !self.roster.contains(target),
                    "missing relationship edge {source} -> {target}"
                );
                0.0
            }
        }
    }

    /// Applies the action from `source` to `target`.
    ///
    /// The forward edge is scaled by `1 - strength` and the reverse edge by
    /// `1 - reverse_strength`. A red check pins the forward edge to 1; a black
    /// check zeroes both directions after the generic step.
    pub fn apply_decay(&mut self, source: Player, target: Player, kind: ActionKind) {
        if source == target || !self.edges.contains_key(&(source, target)) {
            return;
        }
        let weights = kind.weights();

        let forward = if kind == ActionKind::CheckedRed {
            1.0
        } else {
            self.weight(source, target) * (1.0 - weights.strength)
        };
        self.set(source, target, forward);

        let reverse = self.weight(target, source) * (1.0 - weights.reverse_strength);
        self.set(target, source, reverse);

        if kind == ActionKind::CheckedBlack {
            self.set(source, target, 0.0);
            self.set(target, source, 0.0);
        }
    }

    pub fn sever(&mut self, a: Player, b: Player) {
        self.set(a, b, 0.0);
        self.set(b, a, 0.0);
    }

    /// Mean weight over every edge pointing at `player`.
    pub fn incoming_mean(&self, player: Player) -> f64 {
        let (sum, count) = self
            .edges
            .iter()
            .filter(|((_, target), _)| *target == player)
            .fold((0.0, 0usize), |(sum, count), (_, weight)| {
                (sum + weight, count + 1)
            });
        if count == 0 { 0.0 } else { sum / count as f64 }
    }

    pub fn export(&self) -> GraphData {
        GraphData {
            nodes: GraphNode::for_roster(self.roster),
            edges: self
                .edges
                .iter()
                .map(|(&(source, target), &weight)| GraphEdge {
                    source,
                    target,
                    weight,
                })
                .collect(),
        }
    }

    fn set(&mut self, source: Player, target: Player, weight: f64) {
        if let Some(slot) = self.edges.get_mut(&(source, target)) {
            *slot = weight.clamp(0.0, 1.0);
        }
    }
}

/// Node/edge listing handed to visualisers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub id: Player,
}

impl GraphNode {
    fn for_roster(roster: Roster) -> Vec<GraphNode> {
        roster.iter().map(|id| GraphNode { id }).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GraphEdge {
    pub source: Player,
    pub target: Player,
    pub weight: f64,
}

fn key(a: Player, b: Player) -> (Player, Player) {
    if a <= b { (a, b) } else { (b, a) }
}
