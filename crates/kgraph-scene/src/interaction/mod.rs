//! Interaction and selection engine.
//!
//! A small state machine over three mutually exclusive phases: `Idle`,
//! `NodeDragging` and `BoxSelecting`. Entering one phase forcibly exits
//! the others, so a box-selection can never start mid-drag and vice
//! versa. Selection state is transient and never persisted.
//!
//! Screen-space work (box selection hit testing) crosses the renderer
//! boundary through the [`Projector`] trait: the engine hands it world
//! positions, the renderer's camera hands back screen points.

pub mod spatial;

use crate::scene::SceneGraph;
use crate::surface::RenderSurface;
use glam::{Vec2, Vec3};
use self::spatial::{ScreenIndex, ScreenPoint};
use std::collections::{HashMap, HashSet};
use tracing::debug;

// =============================================================================
// PROJECTION BOUNDARY
// =============================================================================

/// Camera-dependent world-to-screen projection, supplied by the active
/// renderer. `None` means the position is not on screen (behind the
/// camera, clipped) and is excluded from hit testing.
pub trait Projector {
    fn world_to_screen(&self, world: Vec3) -> Option<Vec2>;
}

// =============================================================================
// SELECTION STATE
// =============================================================================

/// Selected and hovered id sets. Cleared by background clicks; never
/// persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub selected_nodes: HashSet<String>,
    pub selected_edges: HashSet<String>,
    pub hovered_nodes: HashSet<String>,
    pub hovered_edges: HashSet<String>,
}

impl Selection {
    pub fn clear(&mut self) {
        self.selected_nodes.clear();
        self.selected_edges.clear();
    }

    pub fn select_only_node(&mut self, id: impl Into<String>) {
        self.clear();
        self.selected_nodes.insert(id.into());
    }

    pub fn select_only_edge(&mut self, id: impl Into<String>) {
        self.clear();
        self.selected_edges.insert(id.into());
    }

    pub fn toggle_node(&mut self, id: &str) {
        if !self.selected_nodes.remove(id) {
            self.selected_nodes.insert(id.to_string());
        }
    }

    pub fn toggle_edge(&mut self, id: &str) {
        if !self.selected_edges.remove(id) {
            self.selected_edges.insert(id.to_string());
        }
    }

    pub fn is_node_selected(&self, id: &str) -> bool {
        self.selected_nodes.contains(id)
    }
}

// =============================================================================
// PHASES
// =============================================================================

/// What the pointer is over, as reported by the renderer's hit test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickTarget {
    Node(String),
    Edge(String),
    Background,
}

/// An in-progress node drag. `total_delta` accumulates so a cancelled
/// drag can be reverted exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct DragGesture {
    pub grabbed: String,
    pub total_delta: Vec3,
}

/// An in-progress rectangular selection in screen space.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxGesture {
    pub anchor: Vec2,
    pub current: Vec2,
    /// Union with the existing selection instead of replacing it.
    pub additive: bool,
}

/// Interaction phase. The phases are mutually exclusive by
/// construction: the engine holds exactly one at a time.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Phase {
    #[default]
    Idle,
    NodeDragging(DragGesture),
    BoxSelecting(BoxGesture),
}

// =============================================================================
// ENGINE
// =============================================================================

#[derive(Debug, Default)]
pub struct InteractionEngine {
    selection: Selection,
    phase: Phase,
    /// Rectangles smaller than this (either axis) are accidental clicks,
    /// not box selections, and produce no selection change.
    pub min_box_extent: f32,
}

impl InteractionEngine {
    pub fn new() -> Self {
        Self {
            selection: Selection::default(),
            phase: Phase::Idle,
            min_box_extent: 4.0,
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    // =========================================================================
    // HOVER + CLICK
    // =========================================================================

    /// Update hover state from the renderer's hit test. Purely visual;
    /// no model mutation.
    pub fn hover(&mut self, target: Option<ClickTarget>) {
        self.selection.hovered_nodes.clear();
        self.selection.hovered_edges.clear();
        match target {
            Some(ClickTarget::Node(id)) => {
                self.selection.hovered_nodes.insert(id);
            }
            Some(ClickTarget::Edge(id)) => {
                self.selection.hovered_edges.insert(id);
            }
            Some(ClickTarget::Background) | None => {}
        }
    }

    /// Click selection: plain clicks select only the target, additive
    /// clicks toggle membership, background clicks clear.
    pub fn click(&mut self, target: ClickTarget, additive: bool) {
        match (target, additive) {
            (ClickTarget::Node(id), false) => self.selection.select_only_node(id),
            (ClickTarget::Node(id), true) => self.selection.toggle_node(&id),
            (ClickTarget::Edge(id), false) => self.selection.select_only_edge(id),
            (ClickTarget::Edge(id), true) => self.selection.toggle_edge(&id),
            (ClickTarget::Background, false) => self.selection.clear(),
            (ClickTarget::Background, true) => {}
        }
    }

    // =========================================================================
    // NODE DRAG
    // =========================================================================

    /// Begin dragging `node_id`. If the node is part of a multi-node
    /// selection the whole group moves rigidly; otherwise the selection
    /// collapses to just this node first. All dragged nodes are pinned
    /// so the simulation stops fighting the pointer.
    pub fn begin_node_drag(&mut self, node_id: &str, surface: &mut RenderSurface) {
        // A drag-start aborts any box selection in progress.
        if matches!(self.phase, Phase::BoxSelecting(_)) {
            self.phase = Phase::Idle;
        }
        if !self.selection.is_node_selected(node_id) {
            self.selection.select_only_node(node_id);
        }
        for id in self.selection.selected_nodes.clone() {
            if let Some(node) = surface.node_mut(&id) {
                node.pinned = true;
            }
        }
        debug!(node = node_id, group = self.selection.selected_nodes.len(), "drag started");
        self.phase = Phase::NodeDragging(DragGesture {
            grabbed: node_id.to_string(),
            total_delta: Vec3::ZERO,
        });
    }

    /// Apply one frame's pointer delta to every selected node.
    pub fn drag_by(&mut self, delta: Vec3, surface: &mut RenderSurface) {
        let Phase::NodeDragging(gesture) = &mut self.phase else {
            return;
        };
        for id in &self.selection.selected_nodes {
            if let Some(node) = surface.node_mut(id) {
                node.position += delta;
            }
        }
        gesture.total_delta += delta;
    }

    /// Finish the drag: commit every moved node's final position into
    /// the graph and the scene's override map in one pass, then unpin.
    pub fn end_node_drag(&mut self, scene: &mut SceneGraph, surface: &mut RenderSurface) {
        if !matches!(self.phase, Phase::NodeDragging(_)) {
            return;
        }
        let mut positions = HashMap::new();
        for id in &self.selection.selected_nodes {
            if let Some(node) = surface.node_mut(id) {
                positions.insert(id.clone(), node.position);
                node.pinned = false;
            }
        }
        scene.commit_positions(&positions);
        self.phase = Phase::Idle;
    }

    // =========================================================================
    // BOX SELECTION
    // =========================================================================

    /// Open a selection rectangle anchored at `anchor`. Refused (returns
    /// false) while a node drag is in progress.
    pub fn begin_box_select(&mut self, anchor: Vec2, additive: bool) -> bool {
        if matches!(self.phase, Phase::NodeDragging(_)) {
            return false;
        }
        self.phase = Phase::BoxSelecting(BoxGesture {
            anchor,
            current: anchor,
            additive,
        });
        true
    }

    /// Extend the rectangle to the current pointer position.
    pub fn update_box_select(&mut self, current: Vec2) {
        if let Phase::BoxSelecting(gesture) = &mut self.phase {
            gesture.current = current;
        }
    }

    /// Close the rectangle and select every visible node whose projected
    /// screen point falls inside it. Rectangles below the minimum extent
    /// are discarded as accidental clicks, with no selection change.
    pub fn end_box_select(
        &mut self,
        scene: &SceneGraph,
        surface: &RenderSurface,
        projector: &dyn Projector,
    ) {
        // Only a box-select gesture may be closed here; a stray end
        // event during a drag (or while idle) must leave the phase alone.
        let Phase::BoxSelecting(gesture) = &self.phase else {
            return;
        };
        let gesture = gesture.clone();
        self.phase = Phase::Idle;

        let min = gesture.anchor.min(gesture.current);
        let max = gesture.anchor.max(gesture.current);
        let extent = max - min;
        if extent.x < self.min_box_extent && extent.y < self.min_box_extent {
            debug!("box selection below threshold, discarded");
            return;
        }

        // Project the surface's node list: it is already the visible
        // set, carrying live simulation positions.
        let points: Vec<ScreenPoint> = surface
            .nodes()
            .iter()
            .filter(|n| scene.is_node_visible(&n.id))
            .filter_map(|n| {
                projector
                    .world_to_screen(n.position)
                    .map(|screen| ScreenPoint::new(n.id.clone(), screen))
            })
            .collect();
        let hits = ScreenIndex::build(points).ids_in_rect(min, max);

        if !gesture.additive {
            self.selection.clear();
        }
        debug!(hits = hits.len(), additive = gesture.additive, "box selection closed");
        self.selection.selected_nodes.extend(hits);
    }

    // =========================================================================
    // CANCELLATION
    // =========================================================================

    /// Fully abandon the gesture in progress, e.g. when the pointer
    /// leaves the interactive surface. A drag is reverted exactly; a box
    /// selection is dropped without touching the selection.
    pub fn cancel(&mut self, surface: &mut RenderSurface) {
        match std::mem::take(&mut self.phase) {
            Phase::NodeDragging(gesture) => {
                for id in &self.selection.selected_nodes {
                    if let Some(node) = surface.node_mut(id) {
                        node.position -= gesture.total_delta;
                        node.pinned = false;
                    }
                }
                debug!(node = %gesture.grabbed, "drag cancelled and reverted");
            }
            Phase::BoxSelecting(_) => {
                debug!("box selection cancelled");
            }
            Phase::Idle => {}
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
