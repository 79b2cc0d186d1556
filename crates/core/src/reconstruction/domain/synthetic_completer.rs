//! Fabricated rear-of-head mass for the video path.
//!
//! The generated points are a placeholder, not a model of the occluded
//! geometry: they only give the convex hull something behind the face so it
//! closes into a solid instead of an open cap.

use nalgebra::Point3;
use rand::Rng;

use crate::reconstruction::domain::point_cloud::PointCloud;
use crate::shared::config::ReconstructionConfig;
use crate::shared::error::ReconstructionError;

#[derive(Clone, Debug, PartialEq)]
pub struct SyntheticCompleter {
    count: usize,
    half_extent: f64,
    depth_offset: f64,
    depth_margin: f64,
}

impl SyntheticCompleter {
    /// Fails with [`ReconstructionError::InvalidConfig`] unless `half_extent`
    /// is positive, `depth_offset` finite and `depth_margin` non-negative.
    pub fn new(
        count: usize,
        half_extent: f64,
        depth_offset: f64,
        depth_margin: f64,
    ) -> Result<Self, ReconstructionError> {
        if !(half_extent.is_finite() && half_extent > 0.0) {
            return Err(ReconstructionError::InvalidConfig(format!(
                "synthetic half extent must be a positive number, got {half_extent}"
            )));
        }
        if !depth_offset.is_finite() {
            return Err(ReconstructionError::InvalidConfig(format!(
                "synthetic depth offset must be finite, got {depth_offset}"
            )));
        }
        if !(depth_margin.is_finite() && depth_margin >= 0.0) {
            return Err(ReconstructionError::InvalidConfig(format!(
                "synthetic depth margin must be non-negative, got {depth_margin}"
            )));
        }
        Ok(Self {
            count,
            half_extent,
            depth_offset,
            depth_margin,
        })
    }

    pub fn from_config(config: &ReconstructionConfig) -> Result<Self, ReconstructionError> {
        Self::new(
            config.synthetic_count,
            config.synthetic_half_extent,
            config.synthetic_depth_offset,
            config.synthetic_depth_margin,
        )
    }

    /// Returns `cloud` followed by `count` uniform samples from the cube
    /// `[-h, h)^3`, moved back along z by the depth offset.
    ///
    /// If that alone would leave a sample at or above
    /// `min_depth(cloud) - depth_margin`, the whole block is pushed back
    /// just far enough to clear it.
    pub fn complete<R: Rng + ?Sized>(&self, cloud: &PointCloud, rng: &mut R) -> PointCloud {
        let h = self.half_extent;
        let nearest_allowed = h + self.depth_offset;
        let shift = cloud
            .min_depth()
            .map(|min_z| (min_z - self.depth_margin - nearest_allowed).min(0.0))
            .unwrap_or(0.0);

        let synthetic: Vec<Point3<f64>> = (0..self.count)
            .map(|_| {
                Point3::new(
                    rng.gen_range(-h..h),
                    rng.gen_range(-h..h),
                    rng.gen_range(-h..h) + self.depth_offset + shift,
                )
            })
            .collect();

        let mut completed = PointCloud::with_capacity(cloud.len() + synthetic.len());
        completed.append(cloud.points());
        completed.append(&synthetic);
        completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rstest::rstest;

    fn default_completer() -> SyntheticCompleter {
        SyntheticCompleter::from_config(&ReconstructionConfig::default()).unwrap()
    }

    fn face_cloud() -> PointCloud {
        PointCloud::from(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.1, 0.2, -0.05),
            Point3::new(-0.1, -0.2, 0.08),
            Point3::new(0.05, -0.1, -0.12),
        ])
    }

    #[test]
    fn test_adds_count_and_keeps_prefix() {
        let cloud = face_cloud();
        let completed = default_completer().complete(&cloud, &mut StdRng::seed_from_u64(1));
        assert_eq!(completed.len(), cloud.len() + 100);
        assert_eq!(&completed.points()[..cloud.len()], cloud.points());
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        let completer = default_completer();
        let a = completer.complete(&face_cloud(), &mut StdRng::seed_from_u64(42));
        let b = completer.complete(&face_cloud(), &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_samples_stay_within_cube_footprint() {
        let completed = default_completer().complete(&face_cloud(), &mut StdRng::seed_from_u64(3));
        for p in &completed.points()[4..] {
            assert!((-0.5..0.5).contains(&p.x));
            assert!((-0.5..0.5).contains(&p.y));
        }
    }

    #[rstest]
    #[case::default_offset(-1.0, 0.0)]
    #[case::with_margin(-1.0, 0.3)]
    #[case::offset_too_shallow(0.0, 0.0)]
    #[case::offset_in_front(2.0, 0.1)]
    fn test_samples_lie_strictly_behind(#[case] offset: f64, #[case] margin: f64) {
        let cloud = face_cloud();
        let limit = cloud.min_depth().unwrap() - margin;
        let completer = SyntheticCompleter::new(500, 0.5, offset, margin).unwrap();
        let completed = completer.complete(&cloud, &mut StdRng::seed_from_u64(7));
        for p in &completed.points()[cloud.len()..] {
            assert!(p.z < limit, "synthetic z {} not behind {}", p.z, limit);
        }
    }

    #[test]
    fn test_default_placement_is_unshifted_when_already_behind() {
        // Cloud min depth is -0.12, default block spans [-1.5, -0.5).
        let completed = default_completer().complete(&face_cloud(), &mut StdRng::seed_from_u64(9));
        for p in &completed.points()[4..] {
            assert!((-1.5..-0.5).contains(&p.z));
        }
    }

    #[test]
    fn test_zero_count_returns_copy() {
        let cloud = face_cloud();
        let completed = SyntheticCompleter::new(0, 0.5, -1.0, 0.0).unwrap().complete(&cloud, &mut StdRng::seed_from_u64(0));
        assert_eq!(completed, cloud);
    }

    #[test]
    fn test_empty_cloud_gets_only_synthetic_points() {
        let completed = default_completer().complete(&PointCloud::new(), &mut StdRng::seed_from_u64(0));
        assert_eq!(completed.len(), 100);
    }

    #[rstest]
    #[case::zero_extent(0.0, -1.0, 0.0)]
    #[case::negative_extent(-0.5, -1.0, 0.0)]
    #[case::nan_extent(f64::NAN, -1.0, 0.0)]
    #[case::infinite_offset(0.5, f64::NEG_INFINITY, 0.0)]
    #[case::negative_margin(0.5, -1.0, -0.1)]
    fn test_rejects_unusable_parameters(#[case] extent: f64, #[case] offset: f64, #[case] margin: f64) {
        assert!(matches!(
            SyntheticCompleter::new(10, extent, offset, margin),
            Err(ReconstructionError::InvalidConfig(_))
        ));
    }
}
