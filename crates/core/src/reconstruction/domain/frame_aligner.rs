//! Per-frame normalization of landmark sets into a canonical local frame.
//!
//! The principal axes are only defined up to sign (and up to order when two
//! variances tie), so two frames of the same head can come out mirrored
//! along an axis. That ambiguity is left in place; callers must rely only on
//! the frame's invariants: the reference landmark at the origin, pairwise
//! distances preserved, and cardinality preserved.

use std::cmp::Ordering;

use nalgebra::{Matrix3, SymmetricEigen, Vector3};

use crate::landmarks::domain::landmark_set::{Landmark, LandmarkSet};
use crate::shared::error::ReconstructionError;

/// How a landmark set is brought into its canonical frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AlignmentMode {
    /// Translate the reference landmark to the origin, then rotate onto the
    /// principal axes (video path).
    ReferencePca { reference_index: usize },
    /// Translate the centroid to the origin and flip y so image-down becomes
    /// model-up (image path).
    CentroidFlip,
}

#[derive(Clone, Debug)]
pub struct FrameAligner {
    mode: AlignmentMode,
    landmark_count: usize,
}

impl FrameAligner {
    pub fn new(mode: AlignmentMode, landmark_count: usize) -> Self {
        Self {
            mode,
            landmark_count,
        }
    }

    /// Returns the aligned set; landmark `i` of the output is landmark `i` of the input.
    pub fn align(&self, set: &LandmarkSet) -> Result<LandmarkSet, ReconstructionError> {
        set.ensure_cardinality(self.landmark_count)?;
        let points = set.points();

        let aligned = match self.mode {
            AlignmentMode::ReferencePca { reference_index } => {
                let reference = points.get(reference_index).ok_or_else(|| {
                    ReconstructionError::InvalidConfig(format!(
                        "reference index {reference_index} is out of range for {} landmarks",
                        points.len()
                    ))
                })?;
                let basis = principal_axes(points);
                points
                    .iter()
                    .map(|p| Landmark::from(basis.tr_mul(&(p - reference))))
                    .collect()
            }
            AlignmentMode::CentroidFlip => {
                let centroid = mean(points);
                points
                    .iter()
                    .map(|p| {
                        let d = p.coords - centroid;
                        Landmark::new(d.x, -d.y, d.z)
                    })
                    .collect()
            }
        };
        Ok(LandmarkSet::new(aligned))
    }
}

fn mean(points: &[Landmark]) -> Vector3<f64> {
    points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords)
        / points.len() as f64
}

/// Orthonormal basis whose columns are the principal axes of `points`,
/// ordered by decreasing variance.
///
/// The covariance is taken about the mean, but the basis is applied to
/// reference-centred points, so it is a pure rotation (or reflection) of them.
fn principal_axes(points: &[Landmark]) -> Matrix3<f64> {
    let centre = mean(points);
    let covariance = points.iter().fold(Matrix3::zeros(), |acc, p| {
        let d = p.coords - centre;
        acc + d * d.transpose()
    }) / points.len() as f64;

    let eigen = SymmetricEigen::new(covariance);
    let mut order = [0usize, 1, 2];
    order.sort_by(|&a, &b| {
        eigen.eigenvalues[b]
            .partial_cmp(&eigen.eigenvalues[a])
            .unwrap_or(Ordering::Equal)
    });

    Matrix3::from_columns(&[
        eigen.eigenvectors.column(order[0]).into_owned(),
        eigen.eigenvectors.column(order[1]).into_owned(),
        eigen.eigenvectors.column(order[2]).into_owned(),
    ])
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::distance;

    /// Deterministic, non-planar stand-in for a detector landmark set.
    pub(crate) fn synthetic_face(count: usize) -> LandmarkSet {
        let points = (0..count)
            .map(|i| {
                let t = i as f64 * 0.37;
                Landmark::new(
                    0.5 + 0.2 * t.sin() * (1.0 + 0.1 * (i % 7) as f64),
                    0.5 + 0.3 * (t * 0.5).cos(),
                    -0.05 * (t * 1.3).sin() - 0.01 * (i % 5) as f64,
                )
            })
            .collect();
        LandmarkSet::new(points)
    }

    fn pca_aligner(count: usize) -> FrameAligner {
        FrameAligner::new(AlignmentMode::ReferencePca { reference_index: 1 }, count)
    }

    #[test]
    fn test_reference_pca_preserves_cardinality() {
        let face = synthetic_face(468);
        let aligned = pca_aligner(468).align(&face).unwrap();
        assert_eq!(aligned.len(), 468);
    }

    #[test]
    fn test_reference_landmark_maps_to_origin() {
        let face = synthetic_face(468);
        let aligned = pca_aligner(468).align(&face).unwrap();
        let nose = aligned.points()[1];
        assert_relative_eq!(nose.coords.norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_reference_pca_preserves_pairwise_distances() {
        let face = synthetic_face(64);
        let aligned = pca_aligner(64).align(&face).unwrap();
        for (i, j) in [(0, 5), (3, 40), (10, 63), (1, 2)] {
            assert_relative_eq!(
                distance(&face.points()[i], &face.points()[j]),
                distance(&aligned.points()[i], &aligned.points()[j]),
                epsilon = 1e-10
            );
        }
    }

    #[test]
    fn test_reference_pca_orders_axes_by_variance() {
        let aligned = pca_aligner(200).align(&synthetic_face(200)).unwrap();
        let var = |axis: usize| {
            let pts = aligned.points();
            let m = pts.iter().map(|p| p[axis]).sum::<f64>() / pts.len() as f64;
            pts.iter().map(|p| (p[axis] - m).powi(2)).sum::<f64>()
        };
        assert!(var(0) >= var(1) - 1e-12);
        assert!(var(1) >= var(2) - 1e-12);
    }

    #[test]
    fn test_identical_inputs_align_identically() {
        let face = synthetic_face(468);
        let aligner = pca_aligner(468);
        assert_eq!(aligner.align(&face).unwrap(), aligner.align(&face).unwrap());
    }

    #[test]
    fn test_centroid_flip_centres_and_flips_y() {
        let set = LandmarkSet::from_tuples(&[(0.2, 0.2, 0.0), (0.6, 0.2, 0.3), (0.4, 0.8, -0.3)]);
        let aligned = FrameAligner::new(AlignmentMode::CentroidFlip, 3)
            .align(&set)
            .unwrap();
        let p = aligned.points();
        // centroid = (0.4, 0.4, 0.0)
        assert_relative_eq!(p[0].x, -0.2, epsilon = 1e-12);
        assert_relative_eq!(p[0].y, 0.2, epsilon = 1e-12);
        assert_relative_eq!(p[2].y, -0.4, epsilon = 1e-12);
        assert_relative_eq!(p[1].z, 0.3, epsilon = 1e-12);
        let centroid = mean(p);
        assert_relative_eq!(centroid.norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_wrong_cardinality_is_malformed() {
        let err = pca_aligner(468).align(&synthetic_face(10)).unwrap_err();
        assert!(matches!(
            err,
            ReconstructionError::MalformedLandmarkSet {
                expected: 468,
                actual: 10
            }
        ));
    }

    #[test]
    fn test_empty_set_is_malformed() {
        let aligner = FrameAligner::new(AlignmentMode::CentroidFlip, 0);
        assert!(matches!(
            aligner.align(&LandmarkSet::new(Vec::new())),
            Err(ReconstructionError::MalformedLandmarkSet { .. })
        ));
    }

    #[test]
    fn test_reference_out_of_range_is_config_error() {
        let aligner = FrameAligner::new(AlignmentMode::ReferencePca { reference_index: 9 }, 3);
        let set = LandmarkSet::from_tuples(&[(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (0.0, 1.0, 0.0)]);
        assert!(matches!(
            aligner.align(&set),
            Err(ReconstructionError::InvalidConfig(_))
        ));
    }
}
