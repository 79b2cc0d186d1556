//! Ordered landmark sets produced by a detector for one face.

use nalgebra::Point3;

use crate::shared::error::ReconstructionError;

/// One facial keypoint in normalized image space: x and y in `[0, 1]`
/// relative to the frame, z on the same scale as x.
pub type Landmark = Point3<f64>;

/// All landmarks detected for one face in one frame, in detector order.
///
/// Index identity is meaningful; the set is never reordered or edited.
#[derive(Clone, Debug, PartialEq)]
pub struct LandmarkSet {
    points: Vec<Landmark>,
}

impl LandmarkSet {
    pub fn new(points: Vec<Landmark>) -> Self {
        Self { points }
    }

    pub fn from_tuples(points: &[(f64, f64, f64)]) -> Self {
        Self::new(
            points
                .iter()
                .map(|&(x, y, z)| Landmark::new(x, y, z))
                .collect(),
        )
    }

    pub fn points(&self) -> &[Landmark] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Fails unless the set is non-empty and holds exactly `expected` landmarks.
    pub fn ensure_cardinality(&self, expected: usize) -> Result<(), ReconstructionError> {
        if self.points.is_empty() || self.points.len() != expected {
            return Err(ReconstructionError::MalformedLandmarkSet {
                expected,
                actual: self.points.len(),
            });
        }
        Ok(())
    }

    /// Pixel positions of each landmark in a `width` x `height` image.
    pub fn pixel_coordinates(&self, width: u32, height: u32) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .map(|p| (p.x * width as f64, p.y * height as f64))
            .collect()
    }

    /// Axis-aligned bounds of the x/y coordinates as `(min_x, min_y, max_x, max_y)`.
    pub fn bounds_2d(&self) -> Option<(f64, f64, f64, f64)> {
        let first = self.points.first()?;
        Some(self.points.iter().fold(
            (first.x, first.y, first.x, first.y),
            |(x0, y0, x1, y1), p| (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y)),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn triangle() -> LandmarkSet {
        LandmarkSet::from_tuples(&[(0.25, 0.5, 0.0), (0.75, 0.5, 0.1), (0.5, 0.9, -0.1)])
    }

    #[test]
    fn test_ensure_cardinality_accepts_exact_count() {
        assert!(triangle().ensure_cardinality(3).is_ok());
    }

    #[test]
    fn test_ensure_cardinality_rejects_wrong_count() {
        let err = triangle().ensure_cardinality(468).unwrap_err();
        assert!(matches!(
            err,
            ReconstructionError::MalformedLandmarkSet {
                expected: 468,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_ensure_cardinality_rejects_empty() {
        let empty = LandmarkSet::new(Vec::new());
        assert!(empty.is_empty());
        assert!(empty.ensure_cardinality(0).is_err());
    }

    #[test]
    fn test_pixel_coordinates_scale_by_frame_size() {
        let px = triangle().pixel_coordinates(200, 100);
        assert_relative_eq!(px[0].0, 50.0);
        assert_relative_eq!(px[0].1, 50.0);
        assert_relative_eq!(px[2].0, 100.0);
        assert_relative_eq!(px[2].1, 90.0);
    }

    #[test]
    fn test_bounds_2d() {
        let (x0, y0, x1, y1) = triangle().bounds_2d().unwrap();
        assert_relative_eq!(x0, 0.25);
        assert_relative_eq!(y0, 0.5);
        assert_relative_eq!(x1, 0.75);
        assert_relative_eq!(y1, 0.9);
        assert!(LandmarkSet::new(Vec::new()).bounds_2d().is_none());
    }
}
