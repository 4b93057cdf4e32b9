#![forbid(unsafe_code)]

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x_min <= other.x_max
            && self.x_max >= other.x_min
            && self.y_min <= other.y_max
            && self.y_max >= other.y_min
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}, {} {}",
            self.x_min, self.y_min, self.x_max, self.y_max
        )
    }
}

/// The geometry operations the expression engine is allowed to call.
///
/// Implementations live outside this workspace (a real geometry backend,
/// or a stub in tests). The engine treats every handle as opaque and only
/// ever goes through this trait.
pub trait GeometryLike: fmt::Debug + Send + Sync {
    fn is_empty(&self) -> bool;

    fn area(&self) -> f64;
    fn length(&self) -> f64;
    fn perimeter(&self) -> f64;

    /// Centroid of the geometry, as a new point geometry.
    fn centroid(&self) -> Option<Arc<dyn GeometryLike>>;

    /// Coordinates when the geometry is a single point, `None` otherwise.
    fn as_point(&self) -> Option<(f64, f64)>;

    fn bounding_box(&self) -> Rect;

    fn distance(&self, other: &dyn GeometryLike) -> f64;

    fn buffer(&self, distance: f64, segments: i64) -> Option<Arc<dyn GeometryLike>>;
    fn convex_hull(&self) -> Option<Arc<dyn GeometryLike>>;

    fn combine(&self, other: &dyn GeometryLike) -> Option<Arc<dyn GeometryLike>>;
    fn intersection(&self, other: &dyn GeometryLike) -> Option<Arc<dyn GeometryLike>>;
    fn difference(&self, other: &dyn GeometryLike) -> Option<Arc<dyn GeometryLike>>;
    fn sym_difference(&self, other: &dyn GeometryLike) -> Option<Arc<dyn GeometryLike>>;

    fn intersects(&self, other: &dyn GeometryLike) -> bool;
    fn disjoint(&self, other: &dyn GeometryLike) -> bool;
    fn touches(&self, other: &dyn GeometryLike) -> bool;
    fn crosses(&self, other: &dyn GeometryLike) -> bool;
    fn contains(&self, other: &dyn GeometryLike) -> bool;
    fn overlaps(&self, other: &dyn GeometryLike) -> bool;
    fn within(&self, other: &dyn GeometryLike) -> bool;

    /// DE-9IM relation matrix between the two geometries.
    fn relate(&self, other: &dyn GeometryLike) -> Option<String>;
    /// Tests the DE-9IM relation against an explicit pattern.
    fn relate_pattern(&self, other: &dyn GeometryLike, pattern: &str) -> bool;
}

#[cfg(test)]
mod tests {
    use super::Rect;

    #[test]
    fn rect_width_and_height_follow_corners() {
        let rect = Rect::new(1.0, 2.0, 4.0, 10.0);
        assert_eq!(rect.width(), 3.0);
        assert_eq!(rect.height(), 8.0);
    }

    #[test]
    fn rect_intersection_is_symmetric() {
        let a = Rect::new(0.0, 0.0, 2.0, 2.0);
        let b = Rect::new(1.0, 1.0, 3.0, 3.0);
        let c = Rect::new(5.0, 5.0, 6.0, 6.0);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn rect_round_trips_through_serde() {
        let rect = Rect::new(-1.5, 0.0, 1.5, 2.5);
        let json = serde_json::to_string(&rect).expect("serialize");
        let back: Rect = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(rect, back);
    }
}
