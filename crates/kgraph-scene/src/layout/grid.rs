//! Island grid layout: synchronous in-process engine.
//!
//! Each island (connected component) is laid out on a ring sized to its
//! node count; islands are then arranged on a square grid so
//! disconnected subgraphs never overlap. Cheap, deterministic, and a
//! reasonable first view for graphs with many small components.

use super::{layout_node_ids, LayoutEngine, LayoutError, LayoutOptions, LayoutResult};
use crate::scene::SceneGraph;
use glam::Vec3;
use std::collections::{HashMap, HashSet};
use std::f32::consts::TAU;

#[derive(Debug, Clone)]
pub struct IslandGridLayout {
    /// Extra padding between island cells, in world units.
    pub island_gap: f32,
}

impl Default for IslandGridLayout {
    fn default() -> Self {
        Self { island_gap: 80.0 }
    }
}

impl IslandGridLayout {
    /// Ring radius that keeps `spacing` between adjacent nodes.
    fn ring_radius(count: usize, spacing: f32) -> f32 {
        if count <= 1 {
            return 0.0;
        }
        // Circumference = count * spacing.
        (count as f32 * spacing) / TAU
    }
}

impl LayoutEngine for IslandGridLayout {
    fn kind(&self) -> &'static str {
        "island_grid"
    }

    fn compute(
        &self,
        scene: &SceneGraph,
        options: &LayoutOptions,
    ) -> Result<LayoutResult, LayoutError> {
        let wanted: HashSet<String> = layout_node_ids(scene, options).into_iter().collect();
        if wanted.is_empty() {
            return Err(LayoutError::Failed("no nodes to lay out".into()));
        }

        // Islands over the whole graph, filtered to the wanted subset so
        // hidden nodes neither occupy slots nor bridge components.
        let islands: Vec<Vec<String>> = scene
            .graph()
            .islands()
            .into_iter()
            .map(|island| {
                island
                    .into_iter()
                    .filter(|id| wanted.contains(id))
                    .collect::<Vec<_>>()
            })
            .filter(|island: &Vec<String>| !island.is_empty())
            .collect();

        let max_radius = islands
            .iter()
            .map(|i| Self::ring_radius(i.len(), options.spacing))
            .fold(0.0_f32, f32::max);
        let cell = 2.0 * max_radius + self.island_gap;
        let columns = (islands.len() as f32).sqrt().ceil().max(1.0) as usize;

        let mut positions = HashMap::with_capacity(wanted.len());
        for (index, island) in islands.iter().enumerate() {
            let center = Vec3::new(
                (index % columns) as f32 * cell,
                (index / columns) as f32 * cell,
                0.0,
            );
            let radius = Self::ring_radius(island.len(), options.spacing);
            for (slot, id) in island.iter().enumerate() {
                let angle = slot as f32 / island.len() as f32 * TAU;
                positions.insert(
                    id.clone(),
                    center + Vec3::new(radius * angle.cos(), radius * angle.sin(), 0.0),
                );
            }
        }

        Ok(LayoutResult {
            positions,
            layout_kind: self.kind().to_string(),
            artwork: None,
        })
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

    fn two_island_scene() -> SceneGraph {
        let mut builder = GraphBuilder::new();
        builder
            .triple("a", "r", "b")
            .triple("b", "r", "c")
            .triple("x", "r", "y");
        SceneGraph::new(builder.build())
    }

    #[test]
    fn test_every_visible_node_is_placed() {
        let scene = two_island_scene();
        let result = IslandGridLayout::default()
            .compute(&scene, &LayoutOptions::default())
            .unwrap();
        assert_eq!(result.positions.len(), 5);
        assert_eq!(result.layout_kind, "island_grid");
    }

    #[test]
    fn test_islands_do_not_overlap() {
        let scene = two_island_scene();
        let result = IslandGridLayout::default()
            .compute(&scene, &LayoutOptions::default())
            .unwrap();

        // Max distance inside an island is bounded by its ring diameter;
        // nodes of different islands must sit further apart than that.
        let a = result.positions["a"];
        let y = result.positions["y"];
        let ring = IslandGridLayout::ring_radius(3, LayoutOptions::default().spacing);
        assert!(a.distance(y) > 2.0 * ring);
    }

    #[test]
    fn test_hidden_nodes_are_skipped() {
        let mut scene = two_island_scene();
        let mut config = DisplayConfig::default();
        config.nodes.hide_type("unknown");
        scene.set_display_config(config);

        let err = IslandGridLayout::default()
            .compute(&scene, &LayoutOptions::default())
            .unwrap_err();
        assert!(matches!(err, LayoutError::Failed(_)));

        let result = IslandGridLayout::default()
            .compute(
                &scene,
                &LayoutOptions {
                    include_hidden: true,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(result.positions.len(), 5);
    }

    #[test]
    fn test_single_node_island_sits_at_cell_center() {
        let mut builder = GraphBuilder::new();
        builder.triple("a", "r", "b");
        let mut graph = builder.build();
        graph.create_node(kgraph_model::Node::new("solo")).unwrap();
        let scene = SceneGraph::new(graph);

        let result = IslandGridLayout::default()
            .compute(&scene, &LayoutOptions::default())
            .unwrap();
        // A one-node ring has radius zero: the node is exactly at its
        // island's grid center, which lies on the cell lattice.
        let solo = result.positions["solo"];
        assert_eq!(solo.z, 0.0);
    }
}
