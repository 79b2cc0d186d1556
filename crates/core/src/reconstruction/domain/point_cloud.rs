use nalgebra::Point3;

/// Unordered multiset of 3D points.
///
/// Only ever grows: points are appended, never edited or removed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointCloud {
    points: Vec<Point3<f64>>,
}

impl PointCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    pub fn append(&mut self, points: &[Point3<f64>]) {
        self.points.extend_from_slice(points);
    }

    pub fn points(&self) -> &[Point3<f64>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Smallest z among all points, or `None` for an empty cloud.
    pub fn min_depth(&self) -> Option<f64> {
        self.points.iter().map(|p| p.z).reduce(f64::min)
    }
}

impl From<Vec<Point3<f64>>> for PointCloud {
    fn from(points: Vec<Point3<f64>>) -> Self {
        Self { points }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_preserves_order_and_duplicates() {
        let mut cloud = PointCloud::new();
        let p = Point3::new(1.0, 2.0, 3.0);
        cloud.append(&[p, p]);
        cloud.append(&[Point3::origin()]);
        assert_eq!(cloud.len(), 3);
        assert_eq!(cloud.points()[1], p);
        assert_eq!(cloud.points()[2], Point3::origin());
    }

    #[test]
    fn test_min_depth() {
        let cloud = PointCloud::from(vec![
            Point3::new(0.0, 0.0, 0.3),
            Point3::new(0.0, 0.0, -0.2),
            Point3::new(0.0, 0.0, 0.1),
        ]);
        assert_eq!(cloud.min_depth(), Some(-0.2));
        assert_eq!(PointCloud::new().min_depth(), None);
    }
}
