use crate::landmarks::domain::landmark_set::LandmarkSet;
use crate::reconstruction::domain::frame_aligner::FrameAligner;
use crate::reconstruction::domain::point_cloud::PointCloud;
use crate::shared::error::ReconstructionError;

/// Superimposes independently aligned frames into one point cloud.
///
/// Every aligned landmark from every frame is kept verbatim: no dedup, no
/// outlier rejection. More viewing angles simply contribute more samples.
pub struct SequenceAssembler {
    aligner: FrameAligner,
}

impl SequenceAssembler {
    pub fn new(aligner: FrameAligner) -> Self {
        Self { aligner }
    }

    /// Aligns each set in order and concatenates the results.
    ///
    /// The output holds exactly the sum of the input cardinalities.
    pub fn assemble(&self, sets: &[LandmarkSet]) -> Result<PointCloud, ReconstructionError> {
        if sets.is_empty() {
            return Err(ReconstructionError::EmptyLandmarkSequence);
        }

        let mut cloud = PointCloud::with_capacity(sets.iter().map(LandmarkSet::len).sum());
        for set in sets {
            let aligned = self.aligner.align(set)?;
            cloud.append(aligned.points());
        }
        log::debug!(
            "Assembled {} points from {} frames",
            cloud.len(),
            sets.len()
        );
        Ok(cloud)
    }
}
