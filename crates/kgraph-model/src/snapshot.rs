//! Lossless serde snapshot of a graph.
//!
//! The snapshot shape mirrors the entity model one-to-one (id, type,
//! tags, label, attributes, position for nodes; + source/target for
//! edges) so a graph can be reconstructed without loss. Persistence
//! formats beyond this shape belong to external collaborators.

use crate::entity::{Edge, Node};
use crate::error::Result;
use crate::graph::{Graph, IntegrityMode};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Serializable mirror of a [`Graph`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl GraphSnapshot {
    /// Capture a snapshot of the graph (insertion order preserved).
    pub fn capture(graph: &Graph) -> Self {
        Self {
            nodes: graph.nodes().iter().cloned().collect(),
            edges: graph.edges().iter().cloned().collect(),
        }
    }

    /// Reconstruct a graph with the given integrity mode.
    ///
    /// Nodes are loaded before edges so a well-formed snapshot restores
    /// cleanly even in strict mode; a snapshot with dangling edges fails
    /// in strict mode and self-repairs in permissive mode.
    pub fn restore(self, mode: IntegrityMode) -> Result<Graph> {
        let (node_count, edge_count) = (self.nodes.len(), self.edges.len());
        let mut graph = Graph::with_mode(mode);
        for node in self.nodes {
            graph.create_node(node)?;
        }
        for edge in self.edges {
            graph.create_edge(edge)?;
        }
        info!(nodes = node_count, edges = edge_count, "graph restored from snapshot");
        Ok(graph)
    }
}

impl Graph {
    pub fn to_snapshot(&self) -> GraphSnapshot {
        GraphSnapshot::capture(self)
    }

    pub fn from_snapshot(snapshot: GraphSnapshot, mode: IntegrityMode) -> Result<Self> {
        snapshot.restore(mode)
    }
}

// =============================================================================
// TESTS
// =============================================================================
