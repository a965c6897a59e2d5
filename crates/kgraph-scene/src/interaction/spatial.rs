//! Screen-space index for hit testing and rectangle selection.
//!
//! Built per gesture from projected node positions; O(log n) queries
//! via an R-tree instead of scanning every node per mouse move.

use glam::Vec2;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// One projected node on screen.
#[derive(Debug, Clone)]
pub struct ScreenPoint {
    pub id: String,
    pub position: Vec2,
}

impl ScreenPoint {
    pub fn new(id: impl Into<String>, position: Vec2) -> Self {
        Self {
            id: id.into(),
            position,
        }
    }
}

impl RTreeObject for ScreenPoint {
    type Envelope = AABB<[f32; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.position.x, self.position.y])
    }
}

impl PointDistance for ScreenPoint {
    fn distance_2(&self, point: &[f32; 2]) -> f32 {
        let d = self.position - Vec2::new(point[0], point[1]);
        d.length_squared()
    }
}

/// Screen-space node index for one projection pass.
#[derive(Debug, Default)]
pub struct ScreenIndex {
    tree: RTree<ScreenPoint>,
}

impl ScreenIndex {
    pub fn build(points: Vec<ScreenPoint>) -> Self {
        Self {
            tree: RTree::bulk_load(points),
        }
    }

    /// Ids of all nodes inside the axis-aligned rectangle (inclusive).
    pub fn ids_in_rect(&self, min: Vec2, max: Vec2) -> Vec<String> {
        let bounds = AABB::from_corners([min.x, min.y], [max.x, max.y]);
        self.tree
            .locate_in_envelope(&bounds)
            .map(|p| p.id.clone())
            .collect()
    }

    /// Closest node within `radius` of a point, if any.
    pub fn nearest_within(&self, point: Vec2, radius: f32) -> Option<&ScreenPoint> {
        self.tree
            .nearest_neighbor(&[point.x, point.y])
            .filter(|p| p.position.distance(point) <= radius)
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> ScreenIndex {
        ScreenIndex::build(vec![
            ScreenPoint::new("a", Vec2::new(10.0, 10.0)),
            ScreenPoint::new("b", Vec2::new(50.0, 50.0)),
            ScreenPoint::new("c", Vec2::new(200.0, 200.0)),
        ])
    }

    #[test]
    fn test_rect_query_is_inclusive() {
        let index = index();
        let mut ids = index.ids_in_rect(Vec2::new(0.0, 0.0), Vec2::new(60.0, 60.0));
        ids.sort();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);

        // Boundary point counts as inside.
        let ids = index.ids_in_rect(Vec2::new(10.0, 10.0), Vec2::new(10.0, 10.0));
        assert_eq!(ids, vec!["a".to_string()]);
    }

    #[test]
    fn test_empty_rect_matches_nothing() {
        let index = index();
        assert!(index
            .ids_in_rect(Vec2::new(300.0, 300.0), Vec2::new(400.0, 400.0))
            .is_empty());
    }

    #[test]
    fn test_nearest_within_radius() {
        let index = index();
        let hit = index.nearest_within(Vec2::new(48.0, 52.0), 5.0).unwrap();
        assert_eq!(hit.id, "b");
        assert!(index.nearest_within(Vec2::new(100.0, 100.0), 5.0).is_none());
    }
}
