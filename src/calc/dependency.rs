//! Dependency graph of calculation engine entries.
//!
//! An edge `tail -> head` means `head` reads `tail`: when `tail` changes,
//! `head` must be recomputed after it. The graph is kept acyclic by its
//! users; [`DependencyManager::topological_sort`] reports a cycle if one
//! slipped in.

use std::collections::VecDeque;
use std::fmt::{self, Display, Write};
use std::hash::Hash;

use petgraph::Direction;
use petgraph::graphmap::DiGraphMap;
use rustc_hash::FxHashSet;

use super::CalcError;

/// Directed graph of "is read by" relations between nodes.
#[derive(Debug, Clone)]
pub struct DependencyManager<T: Copy + Ord + Hash> {
    graph: DiGraphMap<T, ()>,
}

impl<T: Copy + Ord + Hash> Default for DependencyManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Ord + Hash> DependencyManager<T> {
    pub fn new() -> Self {
        Self {
            graph: DiGraphMap::new(),
        }
    }

    // ==========================================================================
    // Construction
    // ==========================================================================

    /// Add a node with no relations.
    pub fn add_tail(&mut self, tail: T) {
        self.graph.add_node(tail);
    }

    /// Record that `head` reads `tail`. Adding the same relation twice has
    /// no effect.
    pub fn add_dependency(&mut self, tail: T, head: T) {
        self.graph.add_edge(tail, head, ());
    }

    pub fn remove_dependency(&mut self, tail: T, head: T) {
        self.graph.remove_edge(tail, head);
    }

    /// Make everything that read `old` read `new` instead.
    pub fn replace_dependency(&mut self, old: T, new: T) {
        let heads = self.direct_dependents(old);
        self.add_tail(new);
        for head in heads {
            self.graph.remove_edge(old, head);
            self.graph.add_edge(new, head, ());
        }
    }

    /// Remove nodes together with their relations.
    pub fn remove(&mut self, nodes: &[T]) {
        for node in nodes {
            self.graph.remove_node(*node);
        }
    }

    pub fn clear(&mut self) {
        self.graph.clear();
    }

    // ==========================================================================
    // Queries
    // ==========================================================================

    pub fn contains(&self, node: T) -> bool {
        self.graph.contains_node(node)
    }

    pub fn count(&self) -> usize {
        self.graph.node_count()
    }

    /// Every node.
    pub fn tails(&self) -> Vec<T> {
        self.graph.nodes().collect()
    }

    /// Nodes that read `tail` directly.
    pub fn direct_dependents(&self, tail: T) -> Vec<T> {
        self.neighbors(tail, Direction::Outgoing)
    }

    /// Nodes `head` reads directly.
    pub fn direct_precedents(&self, head: T) -> Vec<T> {
        self.neighbors(head, Direction::Incoming)
    }

    fn neighbors(&self, node: T, direction: Direction) -> Vec<T> {
        if !self.contains(node) {
            return Vec::new();
        }
        self.graph.neighbors_directed(node, direction).collect()
    }

    pub fn has_dependents(&self, tail: T) -> bool {
        self.contains(tail)
            && self
                .graph
                .neighbors_directed(tail, Direction::Outgoing)
                .next()
                .is_some()
    }

    pub fn has_precedents(&self, head: T) -> bool {
        self.contains(head)
            && self
                .graph
                .neighbors_directed(head, Direction::Incoming)
                .next()
                .is_some()
    }

    /// `tail` and everything that reads it, directly or not.
    pub fn dependents(&self, tail: T) -> Vec<T> {
        let mut visited = FxHashSet::default();
        let mut found = Vec::new();
        self.collect_dependents(tail, &mut visited, &mut found);
        found
    }

    fn collect_dependents(&self, node: T, visited: &mut FxHashSet<T>, found: &mut Vec<T>) {
        if !self.contains(node) || !visited.insert(node) {
            return;
        }
        found.push(node);
        for head in self.graph.neighbors_directed(node, Direction::Outgoing) {
            self.collect_dependents(head, visited, found);
        }
    }

    // ==========================================================================
    // Ordering
    // ==========================================================================

    /// The subgraph reachable from `tails`, with its relations.
    pub fn clone_dependents(&self, tails: &[T]) -> Self {
        let mut visited = FxHashSet::default();
        let mut nodes = Vec::new();
        for tail in tails {
            self.collect_dependents(*tail, &mut visited, &mut nodes);
        }

        let mut sub = Self::new();
        for node in &nodes {
            sub.add_tail(*node);
        }
        for node in &nodes {
            for head in self.graph.neighbors_directed(*node, Direction::Outgoing) {
                sub.add_dependency(*node, head);
            }
        }
        sub
    }

    /// The nodes among `roots` that read nothing.
    pub fn sources(&self, roots: &[T]) -> VecDeque<T> {
        roots
            .iter()
            .copied()
            .filter(|root| self.contains(*root) && !self.has_precedents(*root))
            .collect()
    }

    /// Order every node so each comes after all the nodes it reads.
    ///
    /// Consumes the relations of this graph. Fails when the nodes cannot
    /// all be ordered, which means the graph has a cycle.
    pub fn topological_sort(&mut self, mut sources: VecDeque<T>) -> Result<Vec<T>, CalcError> {
        let mut order = Vec::with_capacity(self.count());
        while let Some(node) = sources.pop_front() {
            order.push(node);
            for head in self.direct_dependents(node) {
                self.graph.remove_edge(node, head);
                if !self.has_precedents(head) {
                    sources.push_back(head);
                }
            }
        }

        if order.len() != self.count() {
            return Err(CalcError::CircularReference { at: None });
        }
        Ok(order)
    }

    // ==========================================================================
    // Display
    // ==========================================================================

    /// One line per node: `node -> dependent,dependent` or `node -> <empty>`.
    pub fn format_graph(&self, mut name: impl FnMut(T) -> String) -> String {
        let mut out = String::new();
        for node in self.graph.nodes() {
            let dependents: Vec<String> = self
                .graph
                .neighbors_directed(node, Direction::Outgoing)
                .map(&mut name)
                .collect();
            let dependents = if dependents.is_empty() {
                "<empty>".to_string()
            } else {
                dependents.join(",")
            };
            let _ = writeln!(out, "{} -> {}", name(node), dependents);
        }
        out
    }
}

impl<T: Copy + Ord + Hash + Display> DependencyManager<T> {
    /// Text dump of the graph.
    pub fn dependency_graph(&self) -> String {
        self.format_graph(|node| node.to_string())
    }
}

impl<T: Copy + Ord + Hash + Display> fmt::Display for DependencyManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dependency_graph())
    }
}
