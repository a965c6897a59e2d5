//! Incremental graph construction from symbolic triples.

use crate::entity::{Edge, Entity, Node};
use crate::graph::Graph;

/// Convenience layer for building a [`Graph`] from
/// `(subject, relation, object)` triples.
///
/// Subjects and objects become nodes (auto-created when missing, never
/// overwritten when present); the relation becomes the edge type. Edge
/// identity is per ordered pair, so repeating a pair keeps the first
/// relation.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: Graph,
}

impl GraphBuilder {
    /// Start with an empty permissive graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing graph (e.g. one loaded from a snapshot).
    pub fn from_graph(graph: Graph) -> Self {
        Self { graph }
    }

    /// Add a `(subject, relation, object)` triple, auto-creating any
    /// missing node.
    pub fn triple(
        &mut self,
        subject: impl Into<String>,
        relation: impl Into<String>,
        object: impl Into<String>,
    ) -> &mut Self {
        let subject = subject.into();
        let object = object.into();
        let relation = relation.into();

        self.graph.create_node_if_missing(&subject);
        self.graph.create_node_if_missing(&object);

        let id = crate::entity::edge_id(&subject, &object);
        if self.graph.maybe_edge(&id).is_none() {
            let edge = Edge::new(subject, object)
                .with_type(&relation)
                .with_label(relation);
            // Endpoints exist; a permissive create cannot fail.
            let _ = self.graph.create_edge(edge);
        }
        self
    }

    /// Upsert a fully-specified node (replaces an existing one with the
    /// same id, e.g. to enrich a placeholder created by a triple).
    /// Edges referencing the node are untouched.
    pub fn node(&mut self, node: Node) -> &mut Self {
        let _ = self.graph.remove_node(node.id());
        let _ = self.graph.create_node(node);
        self
    }

    /// Finish and return the graph.
    pub fn build(self) -> Graph {
        self.graph
    }
}

// =============================================================================
// TESTS
// =============================================================================
