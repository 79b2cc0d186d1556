use std::path::PathBuf;

#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Container estimate; 0 when the stream does not report it.
    pub total_frames: usize,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}

impl VideoMetadata {
    /// Metadata for a still image treated as a one-frame video.
    pub fn still_image(width: u32, height: u32, source_path: Option<PathBuf>) -> Self {
        Self {
            width,
            height,
            fps: 0.0,
            total_frames: 1,
            codec: String::new(),
            source_path,
        }
    }
}
