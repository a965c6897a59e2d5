//! Node and edge records
//!
//! Nodes and edges share one capability set: a string id (immutable after
//! creation), a type classification, a tag set, a display label and an
//! open attribute bag that the core treats as opaque payload. Nodes
//! additionally carry an optional 3D position, meaningful only under
//! position-preserving layouts.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Open string-keyed attribute bag. Renderer- and feature-specific
/// payload; the core never interprets it (except the `"color"` override
/// consumed by the display layer).
pub type AttrMap = serde_json::Map<String, serde_json::Value>;

/// Type assigned to nodes created without an explicit classification,
/// including permissive-mode placeholder endpoints.
pub const DEFAULT_NODE_TYPE: &str = "unknown";

/// Type assigned to edges created without an explicit classification.
pub const DEFAULT_EDGE_TYPE: &str = "related";

/// Derive the canonical edge id for an ordered `(source, target)` pair.
///
/// Edge identity is a pure function of its endpoints: there is at most
/// one edge per ordered pair, and re-creating the pair overwrites the
/// previous edge.
pub fn edge_id(source: &str, target: &str) -> String {
    format!("{source}->{target}")
}

// =============================================================================
// ENTITY CAPABILITY SET
// =============================================================================

/// Common addressable, typed, tagged unit of the graph model.
///
/// Implemented by [`Node`] and [`Edge`]; this is what the container
/// layer indexes on.
pub trait Entity {
    fn id(&self) -> &str;
    fn entity_type(&self) -> &str;
    fn tags(&self) -> &BTreeSet<String>;
    fn label(&self) -> &str;
    fn attributes(&self) -> &AttrMap;

    fn set_entity_type(&mut self, entity_type: impl Into<String>)
    where
        Self: Sized;
    fn set_label(&mut self, label: impl Into<String>)
    where
        Self: Sized;
    fn add_tag(&mut self, tag: impl Into<String>)
    where
        Self: Sized;
    fn remove_tag(&mut self, tag: &str);
    fn attributes_mut(&mut self) -> &mut AttrMap;
}

macro_rules! impl_entity {
    ($ty:ty, $type_field:ident) => {
        impl Entity for $ty {
            fn id(&self) -> &str {
                &self.id
            }

            fn entity_type(&self) -> &str {
                &self.$type_field
            }

            fn tags(&self) -> &BTreeSet<String> {
                &self.tags
            }

            fn label(&self) -> &str {
                &self.label
            }

            fn attributes(&self) -> &AttrMap {
                &self.attributes
            }

            fn set_entity_type(&mut self, entity_type: impl Into<String>) {
                self.$type_field = entity_type.into();
            }

            fn set_label(&mut self, label: impl Into<String>) {
                self.label = label.into();
            }

            fn add_tag(&mut self, tag: impl Into<String>) {
                self.tags.insert(tag.into());
            }

            fn remove_tag(&mut self, tag: &str) {
                self.tags.remove(tag);
            }

            fn attributes_mut(&mut self) -> &mut AttrMap {
                &mut self.attributes
            }
        }
    };
}

// =============================================================================
// NODE
// =============================================================================

/// A graph node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    id: String,

    #[serde(rename = "type")]
    node_type: String,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    tags: BTreeSet<String>,

    label: String,

    #[serde(default, skip_serializing_if = "AttrMap::is_empty")]
    attributes: AttrMap,

    /// Last-committed position. `None` until a layout or drag commit has
    /// pinned the node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec3>,
}

impl Node {
    /// Create a node with the given id. The label defaults to the id.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id,
            node_type: DEFAULT_NODE_TYPE.to_string(),
            tags: BTreeSet::new(),
            attributes: AttrMap::new(),
            position: None,
        }
    }

    /// Minimal placeholder for a permissive-mode auto-created endpoint.
    pub(crate) fn placeholder(id: &str) -> Self {
        Self::new(id)
    }

    /// Builder: set type
    pub fn with_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = node_type.into();
        self
    }

    /// Builder: set label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Builder: add a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Builder: set an attribute
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Builder: set position
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = Some(position);
        self
    }
}

impl_entity!(Node, node_type);

// =============================================================================
// EDGE
// =============================================================================

/// A directed edge between two nodes.
///
/// Endpoint references are weak: relation plus lookup, no ownership.
/// Removing a node does not cascade to its edges; that is a caller
/// responsibility (see `Graph::remove_node_and_edges`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    id: String,

    source: String,
    target: String,

    #[serde(rename = "type")]
    edge_type: String,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    tags: BTreeSet<String>,

    label: String,

    #[serde(default, skip_serializing_if = "AttrMap::is_empty")]
    attributes: AttrMap,
}

impl Edge {
    /// Create an edge. The id is derived from the ordered endpoint pair
    /// and the label defaults to the id.
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        let id = edge_id(&source, &target);
        Self {
            label: id.clone(),
            id,
            source,
            target,
            edge_type: DEFAULT_EDGE_TYPE.to_string(),
            tags: BTreeSet::new(),
            attributes: AttrMap::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Builder: set type
    pub fn with_type(mut self, edge_type: impl Into<String>) -> Self {
        self.edge_type = edge_type.into();
        self
    }

    /// Builder: set label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Builder: add a tag
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Builder: set an attribute
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

impl_entity!(Edge, edge_type);

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_label_defaults_to_id() {
        let node = Node::new("acct:alice");
        assert_eq!(node.label(), "acct:alice");
        assert_eq!(node.entity_type(), DEFAULT_NODE_TYPE);
    }

    #[test]
    fn test_edge_id_derived_from_endpoints() {
        let edge = Edge::new("a", "b").with_type("owns");
        assert_eq!(edge.id(), "a->b");
        assert_eq!(edge.id(), edge_id("a", "b"));
        // Opposite direction is a distinct edge.
        assert_ne!(edge_id("a", "b"), edge_id("b", "a"));
    }

    #[test]
    fn test_builder_attrs_and_tags() {
        let node = Node::new("n1")
            .with_type("person")
            .with_tag("kyc")
            .with_tag("active")
            .with_attr("age", 42);
        assert!(node.tags().contains("kyc"));
        assert_eq!(node.attributes()["age"], 42);
        // Tags iterate in sorted order.
        let tags: Vec<_> = node.tags().iter().cloned().collect();
        assert_eq!(tags, vec!["active".to_string(), "kyc".to_string()]);
    }

    #[test]
    fn test_node_serde_round_trip() {
        let node = Node::new("n1")
            .with_type("person")
            .with_position(Vec3::new(1.0, 2.0, 3.0));
        let json = serde_json::to_string(&node).unwrap();
        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node);
    }
}
