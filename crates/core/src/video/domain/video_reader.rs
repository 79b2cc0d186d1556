use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Source of decoded RGB frames: a video file or a single still image.
///
/// Frames are produced one at a time in decode order. Callers must call
/// [`close`](VideoReader::close) on every exit path, including after a failed
/// [`open`](VideoReader::open).
pub trait VideoReader: Send {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;

    /// Releases the decode handle. Safe to call more than once.
    fn close(&mut self);
}
