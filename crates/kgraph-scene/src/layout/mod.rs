//! Layout engine abstraction.
//!
//! A layout engine is invoked on demand, never incrementally, and
//! produces a uniform [`LayoutResult`] regardless of algorithm family:
//! synchronous in-process engines implement [`LayoutEngine`],
//! asynchronous/out-of-process ones implement [`AsyncLayoutEngine`].
//! The result shape is the only contract the synchronization side sees.
//!
//! [`LayoutRunner`] serializes layout requests per scene: one in flight,
//! cancel-and-replace. A completion carrying a stale ticket is
//! discarded; a failed completion leaves the last good result in place
//! so a failed layout never disturbs the visible positions.

pub mod dot;
pub mod grid;

pub use self::dot::DotLayout;
pub use self::grid::IslandGridLayout;

use crate::scene::SceneGraph;
use async_trait::async_trait;
use glam::Vec3;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

// =============================================================================
// RESULT SHAPE
// =============================================================================

/// Options shared by layout engines. `extra` carries algorithm-specific
/// knobs the core does not interpret.
#[derive(Debug, Clone)]
pub struct LayoutOptions {
    /// Target spacing between adjacent nodes, in world units.
    pub spacing: f32,
    /// Lay out hidden nodes too (default: visible subset only).
    pub include_hidden: bool,
    pub extra: serde_json::Value,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            spacing: 60.0,
            include_hidden: false,
            extra: serde_json::Value::Null,
        }
    }
}

/// Position map produced by one layout computation. Immutable once
/// returned.
#[derive(Debug, Clone, Default)]
pub struct LayoutResult {
    pub positions: HashMap<String, Vec3>,
    /// Which engine family produced this (e.g. `"island_grid"`, `"dot"`).
    pub layout_kind: String,
    /// Optional auxiliary output, e.g. vector artwork emitted by an
    /// external renderer alongside the positions.
    pub artwork: Option<String>,
}

/// A layout that could not produce a result. Always recoverable: the
/// caller keeps showing the last valid position map and never applies a
/// partial result.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("layout failed: {0}")]
    Failed(String),

    #[error("layout process error: {0}")]
    Io(#[from] std::io::Error),

    #[error("layout timed out after {0:?}")]
    TimedOut(std::time::Duration),
}

// =============================================================================
// ENGINE TRAITS
// =============================================================================

/// Synchronous in-process layout algorithm.
pub trait LayoutEngine {
    fn kind(&self) -> &'static str;

    fn compute(
        &self,
        scene: &SceneGraph,
        options: &LayoutOptions,
    ) -> Result<LayoutResult, LayoutError>;
}

/// Asynchronous or out-of-process layout algorithm (external binary,
/// remote service). Responsible for its own timeout/cancellation and for
/// mapping abandonment to a [`LayoutError`].
#[async_trait]
pub trait AsyncLayoutEngine: Send + Sync {
    fn kind(&self) -> &'static str;

    async fn compute(
        &self,
        scene: &SceneGraph,
        options: &LayoutOptions,
    ) -> Result<LayoutResult, LayoutError>;
}

/// Node ids a layout pass should place, honoring `include_hidden`.
pub(crate) fn layout_node_ids(scene: &SceneGraph, options: &LayoutOptions) -> Vec<String> {
    if options.include_hidden {
        scene
            .graph()
            .nodes()
            .ids()
            .map(str::to_string)
            .collect()
    } else {
        scene.visible_node_ids()
    }
}

// =============================================================================
// SINGLE-IN-FLIGHT RUNNER
// =============================================================================

/// Ticket identifying one layout request. Completing with a ticket that
/// is no longer current is a discard, never an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutTicket {
    generation: u64,
}

/// What happened to a completed layout request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutOutcome {
    /// The result was accepted and is now the last good layout.
    Applied,
    /// A newer request superseded this one; the result was dropped.
    Superseded,
    /// The engine failed; the previous layout remains in effect.
    Failed,
}

/// Serializes layout requests for one scene: a single in-flight request,
/// cancel-and-replace on re-entry. This is the only hand-off point for
/// background layout computation; the caller owns all scene mutation.
#[derive(Debug, Default)]
pub struct LayoutRunner {
    generation: u64,
    last_good: Option<LayoutResult>,
}

impl LayoutRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new request, cancelling (by supersession) any request
    /// still in flight.
    pub fn begin(&mut self) -> LayoutTicket {
        self.generation += 1;
        LayoutTicket {
            generation: self.generation,
        }
    }

    /// Is this ticket still the current request?
    pub fn is_current(&self, ticket: LayoutTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Complete a request. Stale tickets are discarded; failures keep
    /// the previous result.
    pub fn complete(
        &mut self,
        ticket: LayoutTicket,
        outcome: Result<LayoutResult, LayoutError>,
    ) -> LayoutOutcome {
        if !self.is_current(ticket) {
            debug!(generation = ticket.generation, "stale layout result discarded");
            return LayoutOutcome::Superseded;
        }
        match outcome {
            Ok(result) => {
                debug!(kind = %result.layout_kind, nodes = result.positions.len(), "layout applied");
                self.last_good = Some(result);
                LayoutOutcome::Applied
            }
            Err(err) => {
                warn!(error = %err, "layout failed, keeping previous positions");
                LayoutOutcome::Failed
            }
        }
    }

    /// The most recent successfully applied layout, if any.
    pub fn last_good(&self) -> Option<&LayoutResult> {
        self.last_good.as_ref()
    }
}

// =============================================================================
// TESTS
// =============================================================================
