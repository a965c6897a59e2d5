//! Knowledge-graph data model
//!
//! Renderer-agnostic graph core shared by every visualization surface.
//!
//! # Architecture
//!
//! ```text
//! GraphBuilder (triples)
//!        │
//!        ▼
//!      Graph ──── integrity policy (strict / permissive)
//!        │
//!        ├──► EntityContainer<Node> ── by_type / by_tag indices
//!        ├──► EntityContainer<Edge> ── by_type / by_tag indices
//!        └──► adjacency indices (by_source / by_target)
//!
//! GraphSnapshot ◄──► Graph (lossless serde round-trip)
//! ```
//!
//! Entities are addressed by string ids. Nodes and edges share the same
//! capability set (type, tags, label, open attribute bag); edge ids are
//! derived from the ordered `(source, target)` pair.

pub mod builder;
pub mod container;
pub mod entity;
pub mod error;
pub mod graph;
pub mod snapshot;

pub use builder::GraphBuilder;
pub use container::{AddPolicy, EntityContainer};
pub use entity::{edge_id, AttrMap, Edge, Entity, Node};
pub use error::{ModelError, Result};
pub use graph::{EdgeDirection, Graph, IntegrityMode};
pub use snapshot::GraphSnapshot;
