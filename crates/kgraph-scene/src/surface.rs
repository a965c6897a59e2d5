//! Render-surface reconciliation.
//!
//! A `RenderSurface` is the live node/link list a renderer feeds its
//! simulation from. `reconcile` diffs it against the scene's currently
//! visible entity set and applies only the delta: entries that survive
//! keep their transient simulation state (position, velocity, pin)
//! untouched, new entries are appended, missing entries fall out when
//! the lists are rebuilt. Repeated calls with no graph change are
//! no-ops. The pass never fails: dangling edges are excluded, not
//! reported.

use crate::scene::SceneGraph;
use glam::Vec3;
use std::collections::{HashMap, HashSet};
use tracing::debug;

// =============================================================================
// SURFACE TYPES
// =============================================================================

/// A node entry on the live render surface. Position/velocity/pin are
/// renderer-owned mutable simulation state; reconciliation moves kept
/// entries without touching any field.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceNode {
    pub id: String,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Pinned nodes are excluded from physics integration (dragging).
    pub pinned: bool,
}

impl SurfaceNode {
    pub fn new(id: impl Into<String>, position: Vec3) -> Self {
        Self {
            id: id.into(),
            position,
            velocity: Vec3::ZERO,
            pinned: false,
        }
    }
}

/// A link entry on the live render surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceLink {
    pub id: String,
    pub source: String,
    pub target: String,
}

/// The live node/link lists consumed by a renderer.
#[derive(Debug, Clone, Default)]
pub struct RenderSurface {
    nodes: Vec<SurfaceNode>,
    links: Vec<SurfaceLink>,
}

impl RenderSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(&self) -> &[SurfaceNode] {
        &self.nodes
    }

    pub fn links(&self) -> &[SurfaceLink] {
        &self.links
    }

    pub fn node(&self, id: &str) -> Option<&SurfaceNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut SurfaceNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.links.clear();
    }
}

// =============================================================================
// RECONCILIATION
// =============================================================================

/// Where newly added surface nodes get their initial position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// New nodes enter at the origin and let the simulation settle them.
    #[default]
    Physics,
    /// New nodes enter at their position override (falling back to the
    /// node's committed position, then the origin).
    Fixed,
}

/// Delta applied by one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub nodes_added: usize,
    pub nodes_removed: usize,
    pub links_added: usize,
    pub links_removed: usize,
}

impl SyncReport {
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

/// Reconcile the surface's node/link lists against the scene's visible
/// set.
///
/// The full lists are rebuilt and swapped in one assignment each, so a
/// renderer never observes an intermediate state; kept entries are moved
/// into the new lists byte-for-byte.
pub fn reconcile(scene: &SceneGraph, surface: &mut RenderSurface, mode: SyncMode) -> SyncReport {
    let mut report = SyncReport::default();

    // Nodes: keep ∪ add, ordered by the scene's visible set.
    let visible_nodes = scene.visible_node_ids();
    let mut existing: HashMap<String, SurfaceNode> = std::mem::take(&mut surface.nodes)
        .into_iter()
        .map(|n| (n.id.clone(), n))
        .collect();

    let mut next_nodes = Vec::with_capacity(visible_nodes.len());
    for id in &visible_nodes {
        match existing.remove(id) {
            Some(kept) => next_nodes.push(kept),
            None => {
                report.nodes_added += 1;
                next_nodes.push(SurfaceNode::new(id, initial_position(scene, id, mode)));
            }
        }
    }
    report.nodes_removed = existing.len();
    surface.nodes = next_nodes;

    // Links: same delta, re-validated against the node list that was
    // just rebuilt so an edge can never reference a dropped node.
    let node_set: HashSet<&str> = surface.nodes.iter().map(|n| n.id.as_str()).collect();
    let mut existing_links: HashMap<String, SurfaceLink> = std::mem::take(&mut surface.links)
        .into_iter()
        .map(|l| (l.id.clone(), l))
        .collect();

    let mut next_links = Vec::new();
    for id in scene.visible_edge_ids() {
        let Some(edge) = scene.graph().maybe_edge(&id) else {
            continue;
        };
        if !node_set.contains(edge.source()) || !node_set.contains(edge.target()) {
            continue;
        }
        match existing_links.remove(&id) {
            Some(kept) => next_links.push(kept),
            None => {
                report.links_added += 1;
                next_links.push(SurfaceLink {
                    id,
                    source: edge.source().to_string(),
                    target: edge.target().to_string(),
                });
            }
        }
    }
    report.links_removed = existing_links.len();
    surface.links = next_links;

    if !report.is_noop() {
        debug!(
            scene = %scene.id(),
            nodes_added = report.nodes_added,
            nodes_removed = report.nodes_removed,
            links_added = report.links_added,
            links_removed = report.links_removed,
            "surface reconciled"
        );
    }
    report
}

fn initial_position(scene: &SceneGraph, id: &str, mode: SyncMode) -> Vec3 {
    match mode {
        SyncMode::Physics => Vec3::ZERO,
        SyncMode::Fixed => scene
            .node_positions()
            .get(id)
            .copied()
            .or_else(|| scene.graph().maybe_node(id).and_then(|n| n.position))
            .unwrap_or(Vec3::ZERO),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DisplayConfig;
    use kgraph_model::GraphBuilder;

    fn scene() -> SceneGraph {
        let mut builder = GraphBuilder::new();
        builder
            .triple("a", "owns", "b")
            .triple("b", "owns", "c")
            .triple("c", "owns", "a");
        SceneGraph::new(builder.build())
    }

    #[test]
    fn test_initial_reconcile_populates_surface() {
        let scene = scene();
        let mut surface = RenderSurface::new();
        let report = reconcile(&scene, &mut surface, SyncMode::Physics);

        assert_eq!(report.nodes_added, 3);
        assert_eq!(report.links_added, 3);
        assert_eq!(surface.node_count(), 3);
        // Physics mode: new nodes enter at the origin.
        assert!(surface.nodes().iter().all(|n| n.position == Vec3::ZERO));
    }

    #[test]
    fn test_reconcile_is_idempotent_and_preserves_sim_state() {
        let scene = scene();
        let mut surface = RenderSurface::new();
        reconcile(&scene, &mut surface, SyncMode::Physics);

        // The simulation has been running: nodes carry transient state.
        let node = surface.node_mut("b").unwrap();
        node.position = Vec3::new(7.0, 8.0, 9.0);
        node.velocity = Vec3::new(0.1, 0.2, 0.3);
        node.pinned = true;

        let report = reconcile(&scene, &mut surface, SyncMode::Physics);
        assert!(report.is_noop());

        let node = surface.node("b").unwrap();
        assert_eq!(node.position, Vec3::new(7.0, 8.0, 9.0));
        assert_eq!(node.velocity, Vec3::new(0.1, 0.2, 0.3));
        assert!(node.pinned);
    }

    #[test]
    fn test_hiding_a_node_drops_it_and_its_edges() {
        let mut scene = scene();
        let mut surface = RenderSurface::new();
        reconcile(&scene, &mut surface, SyncMode::Physics);

        let mut config = DisplayConfig::default();
        config.nodes.hide_type("unknown"); // all triple-created nodes
        scene.set_display_config(config);

        let report = reconcile(&scene, &mut surface, SyncMode::Physics);
        assert_eq!(report.nodes_removed, 3);
        assert_eq!(report.links_removed, 3);
        assert_eq!(surface.node_count(), 0);
        assert_eq!(surface.link_count(), 0);

        // Un-hiding brings them back as fresh entries.
        scene.set_display_config(DisplayConfig::default());
        let report = reconcile(&scene, &mut surface, SyncMode::Physics);
        assert_eq!(report.nodes_added, 3);
    }

    #[test]
    fn test_fixed_mode_seeds_from_overrides() {
        let mut scene = scene();
        scene.set_node_positions(
            [("a".to_string(), Vec3::new(10.0, 0.0, -3.0))].into(),
        );

        let mut surface = RenderSurface::new();
        reconcile(&scene, &mut surface, SyncMode::Fixed);
        assert_eq!(surface.node("a").unwrap().position, Vec3::new(10.0, 0.0, -3.0));
        // No override, no committed position: origin.
        assert_eq!(surface.node("b").unwrap().position, Vec3::ZERO);
    }

    #[test]
    fn test_dangling_edge_never_reaches_surface() {
        let mut scene = scene();
        // Out-of-band inconsistency: node removed, edges left dangling.
        scene.graph_mut().remove_node("c").unwrap();

        let mut surface = RenderSurface::new();
        let report = reconcile(&scene, &mut surface, SyncMode::Physics);
        assert_eq!(surface.node_count(), 2);
        assert_eq!(surface.link_count(), 1); // only a->b survives
        assert_eq!(report.links_added, 1);
    }

    #[test]
    fn test_graph_growth_adds_only_the_delta() {
        let mut scene = scene();
        let mut surface = RenderSurface::new();
        reconcile(&scene, &mut surface, SyncMode::Physics);

        surface.node_mut("a").unwrap().velocity = Vec3::ONE;
        scene.graph_mut().create_edge(kgraph_model::Edge::new("c", "d")).unwrap();

        let report = reconcile(&scene, &mut surface, SyncMode::Physics);
        assert_eq!(report.nodes_added, 1);
        assert_eq!(report.links_added, 1);
        assert_eq!(report.nodes_removed, 0);
        // Untouched entry kept its state.
        assert_eq!(surface.node("a").unwrap().velocity, Vec3::ONE);
    }
}
