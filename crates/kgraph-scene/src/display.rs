//! Display configuration: per-type/per-tag color and visibility rules.
//!
//! Node-kind and edge-kind rules are independent. Color resolution
//! follows a fixed precedence chain ending in a hash-keyed default
//! palette, so two entities with the same unseen type share a color
//! without any prior registration step.

use kgraph_model::Entity;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashMap};
use std::hash::{Hash, Hasher};

// =============================================================================
// COLOR
// =============================================================================

/// RGBA color, renderer-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn from_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#rrggbb` / `#rrggbbaa` (leading `#` optional).
    pub fn parse_hex(s: &str) -> Option<Self> {
        let s = s.strip_prefix('#').unwrap_or(s);
        let byte = |i: usize| u8::from_str_radix(s.get(i..i + 2)?, 16).ok();
        match s.len() {
            6 => Some(Self::from_rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Self::from_rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }
}

/// Default palette cycled by the stable type hash. Mid-saturation hues
/// that read on both light and dark surfaces.
const PALETTE: [Color; 12] = [
    Color::from_rgb(100, 181, 246), // Light blue
    Color::from_rgb(129, 199, 132), // Light green
    Color::from_rgb(206, 147, 216), // Light purple
    Color::from_rgb(255, 183, 77),  // Orange
    Color::from_rgb(77, 208, 225),  // Cyan
    Color::from_rgb(240, 98, 146),  // Pink
    Color::from_rgb(174, 213, 129), // Lime
    Color::from_rgb(255, 138, 101), // Deep orange
    Color::from_rgb(149, 117, 205), // Deep purple
    Color::from_rgb(77, 182, 172),  // Teal
    Color::from_rgb(255, 213, 79),  // Amber
    Color::from_rgb(144, 164, 174), // Blue-gray
];

/// Neutral fallback for edges with no rule match and no useful type.
pub const DEFAULT_EDGE_COLOR: Color = Color::from_rgb(107, 114, 128);

fn stable_hash(s: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    s.hash(&mut hasher);
    hasher.finish()
}

/// Palette entry for an arbitrary classification string.
pub fn palette_color(key: &str) -> Color {
    PALETTE[(stable_hash(key) % PALETTE.len() as u64) as usize]
}

// =============================================================================
// RULES
// =============================================================================

/// A single display rule attached to a type or a tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(default)]
    pub hidden: bool,
}

impl StyleRule {
    pub fn colored(color: Color) -> Self {
        Self {
            color: Some(color),
            hidden: false,
        }
    }

    pub fn hidden() -> Self {
        Self {
            color: None,
            hidden: true,
        }
    }
}

/// Rule set for one entity kind (nodes or edges).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleRules {
    #[serde(default)]
    pub by_type: HashMap<String, StyleRule>,
    #[serde(default)]
    pub by_tag: HashMap<String, StyleRule>,
}

impl StyleRules {
    /// Hidden iff an explicit type or tag rule says hidden.
    pub fn is_hidden(&self, entity_type: &str, tags: &BTreeSet<String>) -> bool {
        if self.by_type.get(entity_type).is_some_and(|r| r.hidden) {
            return true;
        }
        tags.iter()
            .any(|tag| self.by_tag.get(tag).is_some_and(|r| r.hidden))
    }

    /// Resolve a color: explicit per-entity `"color"` attribute override,
    /// then type rule, then first matching tag in sorted tag order, then
    /// the stable-hash palette entry for the type.
    pub fn resolve_color(&self, entity: &impl Entity) -> Color {
        if let Some(hex) = entity.attributes().get("color").and_then(|v| v.as_str()) {
            if let Some(color) = Color::parse_hex(hex) {
                return color;
            }
        }
        if let Some(color) = self.by_type.get(entity.entity_type()).and_then(|r| r.color) {
            return color;
        }
        for tag in entity.tags() {
            if let Some(color) = self.by_tag.get(tag).and_then(|r| r.color) {
                return color;
            }
        }
        palette_color(entity.entity_type())
    }

    // Builder-style rule registration.

    pub fn hide_type(&mut self, entity_type: impl Into<String>) -> &mut Self {
        self.by_type
            .entry(entity_type.into())
            .or_default()
            .hidden = true;
        self
    }

    pub fn hide_tag(&mut self, tag: impl Into<String>) -> &mut Self {
        self.by_tag.entry(tag.into()).or_default().hidden = true;
        self
    }

    pub fn color_type(&mut self, entity_type: impl Into<String>, color: Color) -> &mut Self {
        self.by_type.entry(entity_type.into()).or_default().color = Some(color);
        self
    }

    pub fn color_tag(&mut self, tag: impl Into<String>, color: Color) -> &mut Self {
        self.by_tag.entry(tag.into()).or_default().color = Some(color);
        self
    }
}

/// Display configuration for a scene: independent rule sets for nodes
/// and edges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub nodes: StyleRules,
    #[serde(default)]
    pub edges: StyleRules,
}

// =============================================================================
// TESTS
// =============================================================================
