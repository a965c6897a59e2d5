//! Scene layer for the knowledge-graph visualization workspace
//!
//! Sits between the renderer-agnostic graph model (`kgraph_model`) and
//! the pluggable render surfaces (3D force layout, 2D flow diagram,
//! Graphviz), which live outside this crate.
//!
//! # Architecture
//!
//! ```text
//! Graph (kgraph_model)
//!        │
//!        ▼
//! SceneGraph ── display config (type/tag -> color + visibility)
//!        │      position overrides, per-renderer render config
//!        │
//!        ├──► LayoutEngine / AsyncLayoutEngine ──► LayoutResult
//!        │         (LayoutRunner: one in flight, cancel-and-replace)
//!        │
//!        ├──► reconcile() ──► RenderSurface (live node/link lists,
//!        │                    sim state preserved across passes)
//!        │
//!        └──► InteractionEngine (hover / click / box-select / drag)
//!                   │
//!                   └── Projector (renderer camera boundary)
//! ```

pub mod display;
pub mod interaction;
pub mod layout;
pub mod scene;
pub mod surface;

pub use display::{Color, DisplayConfig, StyleRule, StyleRules};
pub use interaction::{ClickTarget, InteractionEngine, Phase, Projector, Selection};
pub use layout::{
    AsyncLayoutEngine, DotLayout, IslandGridLayout, LayoutEngine, LayoutError, LayoutOptions,
    LayoutOutcome, LayoutResult, LayoutRunner, LayoutTicket,
};
pub use scene::{RendererKind, SceneGraph};
pub use surface::{reconcile, RenderSurface, SurfaceLink, SurfaceNode, SyncMode, SyncReport};
