//! Graph: node + edge containers under one referential-integrity policy
//!
//! All mutation flows through the Graph API so the container indices and
//! the adjacency indices stay consistent in the same operation. The
//! adjacency indices (`by_source` / `by_target`) back the hot-path
//! queries used by synchronization and selection.

use crate::container::{AddPolicy, EntityContainer};
use crate::entity::{edge_id, Edge, Entity, Node};
use crate::error::{ModelError, Result};
use glam::Vec3;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

/// Referential-integrity policy for edge endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegrityMode {
    /// Violating operations fail instead of silently repairing: absent
    /// endpoints are `DanglingReference`, absent removal targets are
    /// `NotFound`, duplicate node ids are `DuplicateId`.
    Strict,
    /// Missing endpoints are auto-created as placeholder nodes;
    /// duplicate inserts and absent removals are no-ops.
    #[default]
    Permissive,
}

/// Direction filter for [`Graph::edges_connected`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeDirection {
    Both,
    From,
    To,
}

/// A graph: one node container, one edge container, adjacency indices.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    nodes: EntityContainer<Node>,
    edges: EntityContainer<Edge>,
    mode: IntegrityMode,
    /// node id -> ids of edges leaving it
    by_source: HashMap<String, BTreeSet<String>>,
    /// node id -> ids of edges arriving at it
    by_target: HashMap<String, BTreeSet<String>>,
}

impl Graph {
    /// Create an empty graph in permissive mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty graph with an explicit integrity mode.
    pub fn with_mode(mode: IntegrityMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> IntegrityMode {
        self.mode
    }

    fn strict(&self) -> bool {
        self.mode == IntegrityMode::Strict
    }

    // =========================================================================
    // NODES
    // =========================================================================

    /// Insert a node. Strict mode rejects occupied ids with
    /// `DuplicateId`; permissive mode treats them as add-if-missing.
    pub fn create_node(&mut self, node: Node) -> Result<()> {
        let policy = if self.strict() {
            AddPolicy::Unique
        } else {
            AddPolicy::IfMissing
        };
        self.nodes.add(node, policy)?;
        Ok(())
    }

    /// Idempotent insert: returns the existing node when present,
    /// otherwise creates a minimal one. A second call never alters the
    /// attributes of the first. This is the primary API for incremental
    /// construction and synchronization code.
    pub fn create_node_if_missing(&mut self, id: &str) -> &Node {
        if !self.nodes.contains(id) {
            // Cannot fail: id is absent and the policy is IfMissing.
            let _ = self.nodes.add(Node::new(id), AddPolicy::IfMissing);
        }
        self.nodes
            .maybe_get(id)
            .unwrap_or_else(|| unreachable!("node {id} inserted above"))
    }

    /// Remove a node. Does NOT cascade to edges referencing it; use
    /// [`Graph::remove_node_and_edges`] for that. Strict mode fails with
    /// `NotFound` on an absent id.
    pub fn remove_node(&mut self, id: &str) -> Result<Option<Node>> {
        self.nodes.remove(id, self.strict())
    }

    /// Remove a node together with every edge touching it.
    pub fn remove_node_and_edges(&mut self, id: &str) -> Result<Option<Node>> {
        let edge_ids: Vec<String> = self
            .edges_connected([id], EdgeDirection::Both)
            .into_iter()
            .map(|e| e.id().to_string())
            .collect();
        for eid in edge_ids {
            self.remove_edge(&eid)?;
        }
        self.remove_node(id)
    }

    /// Get a node, failing with `NotFound` when absent.
    pub fn node(&self, id: &str) -> Result<&Node> {
        self.nodes.get(id)
    }

    pub fn maybe_node(&self, id: &str) -> Option<&Node> {
        self.nodes.maybe_get(id)
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.nodes.contains(id)
    }

    /// Mutate a node in place (indices are kept in sync).
    pub fn modify_node(&mut self, id: &str, f: impl FnOnce(&mut Node)) -> Result<()> {
        self.nodes.modify(id, f)
    }

    /// Commit a node position (convenience over [`Graph::modify_node`]).
    pub fn set_node_position(&mut self, id: &str, position: Vec3) -> Result<()> {
        self.nodes.modify(id, |n| n.position = Some(position))
    }

    pub fn nodes(&self) -> &EntityContainer<Node> {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // =========================================================================
    // EDGES
    // =========================================================================

    /// Insert an edge.
    ///
    /// Edge identity derives from the ordered endpoint pair, so creating
    /// a second edge between the same pair overwrites the first (the new
    /// edge's attributes win). This single-edge-per-direction-pair
    /// semantics is deliberate; parallel edges are not supported.
    ///
    /// Strict mode fails with `DanglingReference` when an endpoint is
    /// absent; permissive mode auto-creates placeholder endpoints.
    pub fn create_edge(&mut self, edge: Edge) -> Result<&Edge> {
        self.ensure_endpoints(&edge)?;
        let id = edge.id().to_string();
        let source = edge.source().to_string();
        let target = edge.target().to_string();
        self.edges.add(edge, AddPolicy::Replace)?;
        self.by_source.entry(source).or_default().insert(id.clone());
        self.by_target.entry(target).or_default().insert(id.clone());
        self.edges.get(&id)
    }

    /// Idempotent insert: returns the existing edge for the pair when
    /// present, otherwise creates a minimal one (endpoint policy as in
    /// [`Graph::create_edge`]).
    pub fn create_edge_if_missing(&mut self, source: &str, target: &str) -> Result<&Edge> {
        let id = edge_id(source, target);
        if self.edges.contains(&id) {
            return self.edges.get(&id);
        }
        self.create_edge(Edge::new(source, target))
    }

    /// Remove an edge. Strict mode fails with `NotFound` on an absent id.
    pub fn remove_edge(&mut self, id: &str) -> Result<Option<Edge>> {
        let removed = self.edges.remove(id, self.strict())?;
        if let Some(ref edge) = removed {
            if let Some(ids) = self.by_source.get_mut(edge.source()) {
                ids.remove(id);
                if ids.is_empty() {
                    self.by_source.remove(edge.source());
                }
            }
            if let Some(ids) = self.by_target.get_mut(edge.target()) {
                ids.remove(id);
                if ids.is_empty() {
                    self.by_target.remove(edge.target());
                }
            }
        }
        Ok(removed)
    }

    /// Get an edge, failing with `NotFound` when absent.
    pub fn edge(&self, id: &str) -> Result<&Edge> {
        self.edges.get(id)
    }

    pub fn maybe_edge(&self, id: &str) -> Option<&Edge> {
        self.edges.maybe_get(id)
    }

    /// Mutate an edge in place (indices are kept in sync). Endpoints and
    /// id are not mutable; create a new edge instead.
    pub fn modify_edge(&mut self, id: &str, f: impl FnOnce(&mut Edge)) -> Result<()> {
        self.edges.modify(id, f)
    }

    pub fn edges(&self) -> &EntityContainer<Edge> {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn ensure_endpoints(&mut self, edge: &Edge) -> Result<()> {
        for endpoint in [edge.source(), edge.target()] {
            if self.nodes.contains(endpoint) {
                continue;
            }
            if self.strict() {
                return Err(ModelError::DanglingReference {
                    edge: edge.id().to_string(),
                    node: endpoint.to_string(),
                });
            }
            debug!(node = endpoint, edge = edge.id(), "auto-creating placeholder endpoint");
            let _ = self.nodes.add(Node::placeholder(endpoint), AddPolicy::IfMissing);
        }
        Ok(())
    }

    // =========================================================================
    // TRAVERSAL QUERIES
    // =========================================================================

    /// Ids of nodes adjacent to `id`, ignoring edge direction. Sorted,
    /// deduplicated, without `id` itself (unless self-looped).
    pub fn neighbors(&self, id: &str) -> Vec<String> {
        let mut out = BTreeSet::new();
        if let Some(edge_ids) = self.by_source.get(id) {
            for eid in edge_ids {
                if let Some(edge) = self.edges.maybe_get(eid) {
                    out.insert(edge.target().to_string());
                }
            }
        }
        if let Some(edge_ids) = self.by_target.get(id) {
            for eid in edge_ids {
                if let Some(edge) = self.edges.maybe_get(eid) {
                    out.insert(edge.source().to_string());
                }
            }
        }
        out.remove(id);
        out.into_iter().collect()
    }

    /// Edges touching any of the given nodes, filtered by direction:
    /// `From` matches edges leaving the set, `To` matches edges arriving
    /// at it, `Both` matches either. Backed by the adjacency indices.
    pub fn edges_connected<'a, I>(&self, ids: I, direction: EdgeDirection) -> Vec<&Edge>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = BTreeSet::new();
        for id in ids {
            if matches!(direction, EdgeDirection::Both | EdgeDirection::From) {
                if let Some(edge_ids) = self.by_source.get(id) {
                    seen.extend(edge_ids.iter().cloned());
                }
            }
            if matches!(direction, EdgeDirection::Both | EdgeDirection::To) {
                if let Some(edge_ids) = self.by_target.get(id) {
                    seen.extend(edge_ids.iter().cloned());
                }
            }
        }
        seen.iter()
            .filter_map(|eid| self.edges.maybe_get(eid))
            .collect()
    }

    /// Partition all nodes into connected components ("islands"),
    /// ignoring edge direction. Depth-first traversal; components are
    /// returned in discovery order (first-seen node first), so the
    /// partition is deterministic for a given insertion order.
    pub fn islands(&self) -> Vec<Vec<String>> {
        let mut visited: HashSet<String> = HashSet::with_capacity(self.nodes.len());
        let mut islands = Vec::new();

        for start in self.nodes.ids() {
            if visited.contains(start) {
                continue;
            }
            let mut component = Vec::new();
            let mut stack = vec![start.to_string()];
            while let Some(id) = stack.pop() {
                if !visited.insert(id.clone()) {
                    continue;
                }
                for neighbor in self.neighbors(&id) {
                    // A dangling edge can name a removed node; islands
                    // partition the nodes that actually exist.
                    if self.nodes.contains(&neighbor) && !visited.contains(&neighbor) {
                        stack.push(neighbor);
                    }
                }
                component.push(id);
            }
            islands.push(component);
        }
        islands
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle(graph: &mut Graph, a: &str, b: &str, c: &str) {
        graph.create_edge(Edge::new(a, b)).unwrap();
        graph.create_edge(Edge::new(b, c)).unwrap();
        graph.create_edge(Edge::new(c, a)).unwrap();
    }

    #[test]
    fn test_strict_edge_requires_endpoints() {
        let mut graph = Graph::with_mode(IntegrityMode::Strict);
        graph.create_node(Node::new("a")).unwrap();
        let err = graph.create_edge(Edge::new("a", "b")).unwrap_err();
        assert!(matches!(err, ModelError::DanglingReference { node, .. } if node == "b"));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_permissive_edge_autocreates_endpoints() {
        let mut graph = Graph::new();
        graph.create_edge(Edge::new("a", "b").with_type("owns")).unwrap();
        assert!(graph.has_node("a"));
        assert!(graph.has_node("b"));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_edge_pair_collision_overwrites() {
        let mut graph = Graph::new();
        graph
            .create_edge(Edge::new("a", "b").with_attr("weight", 1))
            .unwrap();
        graph
            .create_edge(Edge::new("a", "b").with_attr("weight", 2))
            .unwrap();
        assert_eq!(graph.edge_count(), 1);
        let edge = graph.edge("a->b").unwrap();
        assert_eq!(edge.attributes()["weight"], 2);
    }

    #[test]
    fn test_create_node_if_missing_is_idempotent() {
        let mut graph = Graph::new();
        graph
            .create_node(Node::new("a").with_type("person").with_attr("age", 30))
            .unwrap();
        graph.create_node_if_missing("a");
        let node = graph.node("a").unwrap();
        assert_eq!(node.entity_type(), "person");
        assert_eq!(node.attributes()["age"], 30);
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_remove_node_does_not_cascade() {
        let mut graph = Graph::new();
        graph.create_edge(Edge::new("a", "b")).unwrap();
        graph.remove_node("a").unwrap();
        // The edge now dangles; cleanup is a caller responsibility.
        assert_eq!(graph.edge_count(), 1);

        let mut graph = Graph::new();
        graph.create_edge(Edge::new("a", "b")).unwrap();
        graph.create_edge(Edge::new("c", "a")).unwrap();
        graph.remove_node_and_edges("a").unwrap();
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.has_node("b"));
    }

    #[test]
    fn test_neighbors_union_of_directions() {
        let mut graph = Graph::new();
        graph.create_edge(Edge::new("a", "b")).unwrap();
        graph.create_edge(Edge::new("c", "a")).unwrap();
        assert_eq!(graph.neighbors("a"), vec!["b".to_string(), "c".to_string()]);
    }

    #[test]
    fn test_edges_connected_directional() {
        let mut graph = Graph::new();
        graph.create_edge(Edge::new("a", "b")).unwrap();
        graph.create_edge(Edge::new("c", "a")).unwrap();

        let from: Vec<_> = graph
            .edges_connected(["a"], EdgeDirection::From)
            .into_iter()
            .map(|e| e.id())
            .collect();
        assert_eq!(from, vec!["a->b"]);

        let to: Vec<_> = graph
            .edges_connected(["a"], EdgeDirection::To)
            .into_iter()
            .map(|e| e.id())
            .collect();
        assert_eq!(to, vec!["c->a"]);

        assert_eq!(graph.edges_connected(["a"], EdgeDirection::Both).len(), 2);
    }

    #[test]
    fn test_islands_two_triangles() {
        let mut graph = Graph::new();
        triangle(&mut graph, "a", "b", "c");
        triangle(&mut graph, "x", "y", "z");

        let islands = graph.islands();
        assert_eq!(islands.len(), 2);

        let mut first: Vec<_> = islands[0].clone();
        let mut second: Vec<_> = islands[1].clone();
        first.sort();
        second.sort();
        assert_eq!(first, vec!["a", "b", "c"]);
        assert_eq!(second, vec!["x", "y", "z"]);
    }

    #[test]
    fn test_islands_exclude_dangling_edge_ghosts() {
        let mut graph = Graph::new();
        graph.create_edge(Edge::new("a", "b")).unwrap();
        // Node removed, edge left dangling (no cascade).
        graph.remove_node("a").unwrap();

        let islands = graph.islands();
        assert_eq!(islands, vec![vec!["b".to_string()]]);
        for island in &islands {
            for id in island {
                assert!(graph.has_node(id));
            }
        }
    }

    #[test]
    fn test_islands_isolated_node() {
        let mut graph = Graph::new();
        graph.create_node(Node::new("lonely")).unwrap();
        triangle(&mut graph, "a", "b", "c");
        assert_eq!(graph.islands().len(), 2);
    }

    #[test]
    fn test_remove_edge_updates_adjacency() {
        let mut graph = Graph::new();
        graph.create_edge(Edge::new("a", "b")).unwrap();
        graph.remove_edge("a->b").unwrap();
        assert!(graph.edges_connected(["a"], EdgeDirection::Both).is_empty());
        assert!(graph.neighbors("a").is_empty());
    }
}
