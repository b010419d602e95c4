//! Directed acyclic graphs of task ids.
//!
//! [`DagBuilder`] collects nodes and edges without validation.
//! [`DagBuilder::build`] derives an immutable [`FixedDag`] from the current
//! contents every time it is called, rejecting graphs with cycles. Edges point
//! from a tail (dependency) to a head (dependent).

use crate::error::{InternalError, Result};
use petgraph::{
    Direction,
    algo::toposort,
    graphmap::{DiGraphMap, NodeTrait},
    visit::{Dfs, Reversed},
};
use std::{collections::BTreeSet, fmt::Display};

/// Mutable collection of nodes and edges.
#[derive(Debug, Clone)]
pub struct DagBuilder<N> {
    nodes: Vec<N>,
    edges: Vec<(N, N)>,
}

impl<N> Default for DagBuilder<N> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }
}

impl<N: NodeTrait + Display> DagBuilder<N> {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node without edges. Adding a known node is a no-op.
    pub fn add_node(&mut self, node: N) -> &mut Self {
        if !self.nodes.contains(&node) {
            self.nodes.push(node);
        }
        self
    }

    /// Adds an edge from `tail` to `head`, adding both nodes.
    pub fn add_edge(&mut self, tail: N, head: N) -> &mut Self {
        self.add_node(tail);
        self.add_node(head);
        if !self.edges.contains(&(tail, head)) {
            self.edges.push((tail, head));
        }
        self
    }

    /// Removes the edge from `tail` to `head`, keeping both nodes.
    pub fn remove_edge(&mut self, tail: N, head: N) -> &mut Self {
        self.edges.retain(|edge| *edge != (tail, head));
        self
    }

    /// Whether the builder holds `node`.
    pub fn contains(&self, node: N) -> bool {
        self.nodes.contains(&node)
    }

    /// Derives an immutable graph from the current contents.
    pub fn build(&self) -> Result<FixedDag<N>> {
        let mut graph: DiGraphMap<N, ()> = DiGraphMap::with_capacity(self.nodes.len(), self.edges.len());
        for node in &self.nodes {
            graph.add_node(*node);
        }
        for (tail, head) in &self.edges {
            graph.add_edge(*tail, *head, ());
        }

        let order = toposort(&graph, None).map_err(|cycle| InternalError::CycleDetected {
            node: cycle.node_id().to_string(),
        })?;

        Ok(FixedDag { graph, order })
    }
}

/// Immutable, validated acyclic graph.
#[derive(Debug, Clone)]
pub struct FixedDag<N: NodeTrait> {
    graph: DiGraphMap<N, ()>,
    order: Vec<N>,
}

impl<N: NodeTrait> FixedDag<N> {
    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = N> + '_ {
        self.graph.nodes()
    }

    /// Whether the graph holds `node`.
    pub fn contains(&self, node: N) -> bool {
        self.graph.contains_node(node)
    }

    /// Nodes ordered so every tail precedes its heads.
    pub fn topological_order(&self) -> &[N] {
        &self.order
    }

    /// Direct dependents of `node`.
    pub fn heads_of(&self, node: N) -> BTreeSet<N> {
        self.graph
            .neighbors_directed(node, Direction::Outgoing)
            .collect()
    }

    /// Direct dependencies of `node`.
    pub fn tails_of(&self, node: N) -> BTreeSet<N> {
        self.graph
            .neighbors_directed(node, Direction::Incoming)
            .collect()
    }

    /// Transitive dependents of `node`, excluding `node`.
    pub fn all_heads_of(&self, node: N) -> BTreeSet<N> {
        if !self.contains(node) {
            return BTreeSet::new();
        }
        let mut reached = BTreeSet::new();
        let mut dfs = Dfs::new(&self.graph, node);
        while let Some(next) = dfs.next(&self.graph) {
            if next != node {
                reached.insert(next);
            }
        }
        reached
    }

    /// Transitive dependencies of `node`, excluding `node`.
    pub fn all_tails_of(&self, node: N) -> BTreeSet<N> {
        if !self.contains(node) {
            return BTreeSet::new();
        }
        let reversed = Reversed(&self.graph);
        let mut reached = BTreeSet::new();
        let mut dfs = Dfs::new(reversed, node);
        while let Some(next) = dfs.next(reversed) {
            if next != node {
                reached.insert(next);
            }
        }
        reached
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn diamond() -> DagBuilder<&'static str> {
        let mut builder = DagBuilder::new();
        builder
            .add_edge("a", "b")
            .add_edge("a", "c")
            .add_edge("b", "d")
            .add_edge("c", "d");
        builder
    }

    #[test]
    fn test_topological_order_respects_edges() {
        let dag = diamond().build().unwrap();
        let order = dag.topological_order();
        let pos = |n| order.iter().position(|x| *x == n).unwrap();
        assert!(pos("a") < pos("b"));
        assert!(pos("a") < pos("c"));
        assert!(pos("b") < pos("d"));
        assert!(pos("c") < pos("d"));
    }

    #[test]
    fn test_transitive_queries() {
        let dag = diamond().build().unwrap();
        assert_eq!(dag.all_heads_of("a"), BTreeSet::from(["b", "c", "d"]));
        assert_eq!(dag.all_tails_of("d"), BTreeSet::from(["a", "b", "c"]));
        assert_eq!(dag.heads_of("b"), BTreeSet::from(["d"]));
        assert_eq!(dag.tails_of("d"), BTreeSet::from(["b", "c"]));
        assert!(dag.all_heads_of("d").is_empty());
        assert!(dag.all_heads_of("missing").is_empty());
    }

    #[test]
    fn test_cycle_is_rejected() {
        let mut builder = diamond();
        builder.add_edge("d", "a");
        assert!(matches!(
            builder.build(),
            Err(Error::Internal(InternalError::CycleDetected { .. }))
        ));
    }

    #[test]
    fn test_build_reflects_later_changes() {
        let mut builder = diamond();
        let before = builder.build().unwrap();
        builder.remove_edge("c", "d").add_node("e");
        let after = builder.build().unwrap();

        assert_eq!(before.edge_count(), 4);
        assert_eq!(after.edge_count(), 3);
        assert!(after.contains("e"));
        assert!(!before.contains("e"));
        assert!(after.heads_of("c").is_empty());
    }
}
