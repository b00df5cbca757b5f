//! Directed acyclic graph for configuration dependencies.
//!
//! A thin wrapper around `petgraph` used by the graph builder and the
//! executor. Topological sorting uses Kahn's algorithm with ordering-based
//! tie-breaking so every run of the same input produces the same order; the
//! leftover set on a failed sort is the full cycle report.
//!
//! **Note:** This module is internal to `monaco-deploy` to preserve freedom
//! to change internals.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::fmt::Display;
use std::hash::Hash;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

/// A directed acyclic graph over values of `T`.
///
/// Nodes are added on demand; adding an existing node or a duplicate edge is
/// a no-op. All query results are sorted by `T`'s ordering for determinism.
#[derive(Debug, Clone)]
pub(crate) struct Dag<T>
where
    T: Clone + Eq + Hash + Ord + Display,
{
    graph: DiGraph<T, ()>,
    index_map: HashMap<T, NodeIndex>,
}

impl<T> Dag<T>
where
    T: Clone + Eq + Hash + Ord + Display,
{
    /// Creates a new empty DAG.
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index_map: HashMap::new(),
        }
    }

    /// Returns the number of nodes.
    #[must_use]
    #[allow(dead_code)]
    pub(crate) fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Adds a node. No-op if the value is already present.
    pub(crate) fn add_node(&mut self, value: T) -> NodeIndex {
        if let Some(&idx) = self.index_map.get(&value) {
            return idx;
        }
        let idx = self.graph.add_node(value.clone());
        self.index_map.insert(value, idx);
        idx
    }

    /// Adds a directed edge from `from` to `to`, creating missing nodes.
    pub(crate) fn add_edge(&mut self, from: &T, to: &T) {
        let from_idx = self.add_node(from.clone());
        let to_idx = self.add_node(to.clone());
        if !self.graph.contains_edge(from_idx, to_idx) {
            self.graph.add_edge(from_idx, to_idx, ());
        }
    }

    /// True if the value is a node of this DAG.
    #[must_use]
    #[allow(dead_code)]
    pub(crate) fn contains(&self, value: &T) -> bool {
        self.index_map.contains_key(value)
    }

    /// Returns a topologically sorted list of all nodes.
    ///
    /// Kahn's algorithm; when several nodes are ready at once, the smallest
    /// by `T`'s ordering is emitted first, so the result is deterministic.
    ///
    /// # Errors
    ///
    /// When the graph is cyclic, returns the leftover set: every node that
    /// is part of, or only reachable through, a cycle, sorted.
    pub(crate) fn toposort(&self) -> Result<Vec<T>, Vec<T>> {
        let mut in_degree: HashMap<NodeIndex, usize> =
            self.graph.node_indices().map(|idx| (idx, 0)).collect();
        for edge in self.graph.edge_references() {
            *in_degree.entry(edge.target()).or_insert(0) += 1;
        }

        let mut ready: BTreeSet<T> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .filter_map(|(idx, _)| self.graph.node_weight(*idx).cloned())
            .collect();

        let mut result = Vec::with_capacity(self.graph.node_count());
        while let Some(value) = ready.pop_first() {
            let idx = self.index_map[&value];
            result.push(value);
            for neighbor in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                let degree = in_degree
                    .get_mut(&neighbor)
                    .expect("neighbor indices are graph nodes");
                *degree -= 1;
                if *degree == 0 {
                    if let Some(weight) = self.graph.node_weight(neighbor) {
                        ready.insert(weight.clone());
                    }
                }
            }
        }

        if result.len() != self.graph.node_count() {
            let mut leftover: Vec<T> = in_degree
                .into_iter()
                .filter(|(_, degree)| *degree > 0)
                .filter_map(|(idx, _)| self.graph.node_weight(idx).cloned())
                .collect();
            leftover.sort();
            return Err(leftover);
        }
        Ok(result)
    }

    /// Returns the direct successors of a node, sorted.
    #[must_use]
    pub(crate) fn successors(&self, value: &T) -> Vec<T> {
        let Some(&idx) = self.index_map.get(value) else {
            return Vec::new();
        };
        let mut successors: Vec<T> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .filter_map(|n| self.graph.node_weight(n).cloned())
            .collect();
        successors.sort();
        successors
    }

    /// Returns all transitive descendants of a node, sorted, excluding the
    /// node itself.
    #[must_use]
    pub(crate) fn descendants(&self, value: &T) -> Vec<T> {
        let Some(&start) = self.index_map.get(value) else {
            return Vec::new();
        };
        let mut seen: BTreeSet<T> = BTreeSet::new();
        let mut queue: VecDeque<NodeIndex> = VecDeque::from([start]);
        while let Some(idx) = queue.pop_front() {
            for neighbor in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                if let Some(weight) = self.graph.node_weight(neighbor) {
                    if seen.insert(weight.clone()) {
                        queue.push_back(neighbor);
                    }
                }
            }
        }
        seen.into_iter().collect()
    }

    /// Returns the in-degree of every node.
    #[must_use]
    pub(crate) fn in_degrees(&self) -> HashMap<T, usize> {
        self.graph
            .node_indices()
            .filter_map(|idx| {
                self.graph.node_weight(idx).map(|weight| {
                    (
                        weight.clone(),
                        self.graph
                            .neighbors_directed(idx, Direction::Incoming)
                            .count(),
                    )
                })
            })
            .collect()
    }
}

impl<T> Default for Dag<T>
where
    T: Clone + Eq + Hash + Ord + Display,
{
    fn default() -> Self {
        Self::new()
    }
}
