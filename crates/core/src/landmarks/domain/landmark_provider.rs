use crate::landmarks::domain::landmark_set::LandmarkSet;
use crate::shared::frame::Frame;

/// Domain interface for facial landmark detection.
///
/// Returns `Ok(None)` when the frame contains no face. Implementations may
/// carry state between calls (e.g. a tracked region of interest), hence
/// `&mut self`.
pub trait LandmarkProvider: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Option<LandmarkSet>, Box<dyn std::error::Error>>;
}
