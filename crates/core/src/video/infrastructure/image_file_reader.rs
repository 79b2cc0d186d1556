use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

use super::ffmpeg_decode::open_input;

/// Presents a still image as a one-frame video.
///
/// The image is decoded eagerly during `open` and the ffmpeg context is
/// dropped before `open` returns; `frames` hands out the single frame once.
pub struct ImageFileReader {
    frame: Option<Frame>,
}

impl ImageFileReader {
    pub fn new() -> Self {
        Self { frame: None }
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoReader for ImageFileReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        self.frame = None;
        let mut ctx = open_input(path)?;
        let mut flushing = false;
        let frame = ctx
            .next_frame(0, &mut flushing)?
            .ok_or_else(|| format!("No decodable image in {}", path.display()))?;

        let metadata = VideoMetadata::still_image(ctx.width, ctx.height, Some(path.to_path_buf()));
        self.frame = Some(frame);
        Ok(metadata)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        match self.frame.take() {
            Some(frame) => Box::new(std::iter::once(Ok(frame))),
            None => Box::new(std::iter::once(Err(
                "ImageFileReader: not opened or frame already consumed".into(),
            ))),
        }
    }

    fn close(&mut self) {
        self.frame = None;
    }
}
