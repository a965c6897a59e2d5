//! SceneGraph: a graph plus display/position configuration.
//!
//! The renderer-facing source of truth. A `SceneGraph` owns its graph
//! exclusively and is threaded as an explicit handle through the
//! synchronization and interaction engines — there is no ambient
//! "current scene" state, which keeps the core testable without a
//! running UI.

use crate::display::{Color, DisplayConfig};
use glam::Vec3;
use kgraph_model::{Entity, Graph};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

/// The renderer families a scene can be shown through. Render config is
/// opaque to the core and passed through per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RendererKind {
    /// 3D force-directed layout surface.
    ForceGraph3d,
    /// 2D flow-diagram surface.
    FlowDiagram,
    /// Graphviz-rendered vector surface.
    Graphviz,
}

impl RendererKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RendererKind::ForceGraph3d => "force_graph_3d",
            RendererKind::FlowDiagram => "flow_diagram",
            RendererKind::Graphviz => "graphviz",
        }
    }

    pub fn all() -> &'static [RendererKind] {
        &[
            RendererKind::ForceGraph3d,
            RendererKind::FlowDiagram,
            RendererKind::Graphviz,
        ]
    }
}

/// A graph wrapped with display configuration, a position-override
/// staging layer and per-renderer render configuration.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    id: Uuid,
    graph: Graph,
    display: DisplayConfig,
    /// Working positions used by fixed-layout rendering; orthogonal to
    /// the node's own committed `position` until a commit folds them in.
    position_overrides: HashMap<String, Vec3>,
    /// Opaque visual parameters (size/opacity/label visibility, ...)
    /// passed through to each renderer kind untouched.
    render_configs: HashMap<RendererKind, serde_json::Value>,
}

impl SceneGraph {
    /// Wrap a graph with an empty display configuration.
    pub fn new(graph: Graph) -> Self {
        let id = Uuid::new_v4();
        debug!(scene = %id, nodes = graph.node_count(), edges = graph.edge_count(), "scene created");
        Self {
            id,
            graph,
            display: DisplayConfig::default(),
            position_overrides: HashMap::new(),
            render_configs: HashMap::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    // =========================================================================
    // GRAPH ACCESS
    // =========================================================================

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Mutable graph access; all mutation still flows through the Graph
    /// API, so indices stay consistent.
    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    // =========================================================================
    // DISPLAY CONFIG
    // =========================================================================

    pub fn display_config(&self) -> &DisplayConfig {
        &self.display
    }

    /// Wholesale replace. Visibility and color are computed on demand,
    /// so the new rules affect every subsequent query immediately.
    pub fn set_display_config(&mut self, config: DisplayConfig) {
        self.display = config;
    }

    /// A node is visible unless an explicit type or tag rule hides it.
    /// Unknown ids are not visible.
    pub fn is_node_visible(&self, id: &str) -> bool {
        match self.graph.maybe_node(id) {
            Some(node) => !self.display.nodes.is_hidden(node.entity_type(), node.tags()),
            None => false,
        }
    }

    /// Edge visibility is the AND of its own rules and both endpoints'
    /// visibility. A dangling endpoint makes the edge invisible rather
    /// than an error: reconciliation runs on every visibility-affecting
    /// change and must tolerate transiently inconsistent graphs.
    pub fn is_edge_visible(&self, id: &str) -> bool {
        let Some(edge) = self.graph.maybe_edge(id) else {
            return false;
        };
        if self.display.edges.is_hidden(edge.entity_type(), edge.tags()) {
            return false;
        }
        self.is_node_visible(edge.source()) && self.is_node_visible(edge.target())
    }

    pub fn color_of_node(&self, id: &str) -> Option<Color> {
        self.graph
            .maybe_node(id)
            .map(|node| self.display.nodes.resolve_color(node))
    }

    pub fn color_of_edge(&self, id: &str) -> Option<Color> {
        self.graph
            .maybe_edge(id)
            .map(|edge| self.display.edges.resolve_color(edge))
    }

    /// Visible node ids in graph insertion order.
    pub fn visible_node_ids(&self) -> Vec<String> {
        self.graph
            .nodes()
            .iter()
            .filter(|n| !self.display.nodes.is_hidden(n.entity_type(), n.tags()))
            .map(|n| n.id().to_string())
            .collect()
    }

    /// Visible edge ids in graph insertion order (both endpoints
    /// visible, dangling edges excluded).
    pub fn visible_edge_ids(&self) -> Vec<String> {
        self.graph
            .edges()
            .iter()
            .map(|e| e.id().to_string())
            .filter(|id| self.is_edge_visible(id))
            .collect()
    }

    // =========================================================================
    // POSITION OVERRIDES
    // =========================================================================

    pub fn node_positions(&self) -> &HashMap<String, Vec3> {
        &self.position_overrides
    }

    /// Wholesale replace of the override map (e.g. applying a
    /// `LayoutResult`). A failed layout must never reach this point —
    /// callers keep the previous map instead.
    pub fn set_node_positions(&mut self, positions: HashMap<String, Vec3>) {
        self.position_overrides = positions;
    }

    /// Patch individual overrides without disturbing the rest.
    pub fn patch_node_positions(&mut self, positions: &HashMap<String, Vec3>) {
        for (id, pos) in positions {
            self.position_overrides.insert(id.clone(), *pos);
        }
    }

    pub fn clear_node_positions(&mut self) {
        self.position_overrides.clear();
    }

    /// Fold positions into the graph's node records AND the override map
    /// in one pass — the drag-commit path. Ids without a backing node
    /// are skipped.
    pub fn commit_positions(&mut self, positions: &HashMap<String, Vec3>) {
        for (id, pos) in positions {
            if self.graph.set_node_position(id, *pos).is_ok() {
                self.position_overrides.insert(id.clone(), *pos);
            }
        }
        debug!(scene = %self.id, count = positions.len(), "positions committed");
    }

    // =========================================================================
    // PER-RENDERER CONFIG
    // =========================================================================

    pub fn render_config(&self, kind: RendererKind) -> Option<&serde_json::Value> {
        self.render_configs.get(&kind)
    }

    pub fn set_render_config(&mut self, kind: RendererKind, config: serde_json::Value) {
        self.render_configs.insert(kind, config);
    }
}

// =============================================================================
// TESTS
// =============================================================================
