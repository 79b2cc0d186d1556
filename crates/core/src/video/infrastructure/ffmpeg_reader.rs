use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

use super::ffmpeg_decode::{open_input, DecodeContext};

/// Decodes video frames lazily via ffmpeg-next, one RGB24 [`Frame`] at a time.
pub struct FfmpegReader {
    ctx: Option<DecodeContext>,
}

// Safety: FfmpegReader is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegReader {}

impl FfmpegReader {
    pub fn new() -> Self {
        Self { ctx: None }
    }
}

impl Default for FfmpegReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoReader for FfmpegReader {
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>> {
        self.ctx = None;
        let ctx = open_input(path)?;
        let metadata = VideoMetadata {
            width: ctx.width,
            height: ctx.height,
            fps: ctx.fps,
            total_frames: ctx.total_frames,
            codec: ctx.codec_name(),
            source_path: Some(path.to_path_buf()),
        };
        log::debug!(
            "Opened {} ({}x{}, {:.2} fps, {})",
            path.display(),
            metadata.width,
            metadata.height,
            metadata.fps,
            metadata.codec
        );
        self.ctx = Some(ctx);
        Ok(metadata)
    }

    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_> {
        let Some(ctx) = self.ctx.as_mut() else {
            return Box::new(std::iter::once(Err("FfmpegReader: not opened".into())));
        };
        Box::new(FrameIter {
            ctx,
            index: 0,
            flushing: false,
            done: false,
        })
    }

    fn close(&mut self) {
        self.ctx = None;
    }
}

struct FrameIter<'a> {
    ctx: &'a mut DecodeContext,
    index: usize,
    flushing: bool,
    done: bool,
}

impl Iterator for FrameIter<'_> {
    type Item = Result<Frame, Box<dyn std::error::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.ctx.next_frame(self.index, &mut self.flushing) {
            Ok(Some(frame)) => {
                self.index += 1;
                Some(Ok(frame))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    /// Encodes `num_frames` solid grey MPEG-4 frames.
    fn create_test_video(path: &Path, num_frames: usize, width: u32, height: u32) {
        let fps = 25;
        ffmpeg_next::init().unwrap();
        let mut octx = ffmpeg_next::format::output(path).unwrap();
        let global_header = octx
            .format()
            .flags()
            .contains(ffmpeg_next::format::Flags::GLOBAL_HEADER);

        let codec = ffmpeg_next::encoder::find(ffmpeg_next::codec::Id::MPEG4).unwrap();
        let mut ost = octx.add_stream(Some(codec)).unwrap();
        let mut enc = ffmpeg_next::codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .unwrap();
        enc.set_width(width);
        enc.set_height(height);
        enc.set_format(ffmpeg_next::format::Pixel::YUV420P);
        enc.set_time_base(ffmpeg_next::Rational(1, fps));
        enc.set_frame_rate(Some(ffmpeg_next::Rational(fps, 1)));
        if global_header {
            enc.set_flags(ffmpeg_next::codec::Flags::GLOBAL_HEADER);
        }
        let mut encoder = enc.open_with(ffmpeg_next::Dictionary::new()).unwrap();
        ost.set_parameters(&encoder);
        octx.write_header().unwrap();
        let time_base = octx.stream(0).unwrap().time_base();

        for i in 0..num_frames {
            let mut yuv = ffmpeg_next::util::frame::video::Video::new(
                ffmpeg_next::format::Pixel::YUV420P,
                width,
                height,
            );
            for plane in 0..3 {
                let fill = if plane == 0 { (i * 30 % 200) as u8 + 16 } else { 128 };
                yuv.data_mut(plane).fill(fill);
            }
            yuv.set_pts(Some(i as i64));
            encoder.send_frame(&yuv).unwrap();
            let mut packet = ffmpeg_next::Packet::empty();
            while encoder.receive_packet(&mut packet).is_ok() {
                packet.set_stream(0);
                packet.rescale_ts(ffmpeg_next::Rational(1, fps), time_base);
                packet.write_interleaved(&mut octx).unwrap();
            }
        }
        encoder.send_eof().unwrap();
        let mut packet = ffmpeg_next::Packet::empty();
        while encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(0);
            packet.rescale_ts(ffmpeg_next::Rational(1, fps), time_base);
            packet.write_interleaved(&mut octx).unwrap();
        }
        octx.write_trailer().unwrap();
    }

    fn video_in(dir: &Path, frames: usize) -> PathBuf {
        let path = dir.join("clip.mp4");
        create_test_video(&path, frames, 96, 64);
        path
    }

    #[test]
    fn test_open_reports_dimensions_and_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = video_in(dir.path(), 3);
        let mut reader = FfmpegReader::new();
        let meta = reader.open(&path).unwrap();
        assert_eq!((meta.width, meta.height), (96, 64));
        assert!(meta.fps > 0.0);
        assert!(!meta.codec.is_empty());
        assert_eq!(meta.source_path, Some(path));
    }

    #[test]
    fn test_open_missing_file_fails_and_leaves_reader_closed() {
        let mut reader = FfmpegReader::new();
        assert!(reader.open(Path::new("/nonexistent/clip.mp4")).is_err());
        assert!(reader.ctx.is_none());
    }

    #[test]
    fn test_frames_are_sequential_rgb() {
        let dir = tempfile::tempdir().unwrap();
        let path = video_in(dir.path(), 4);
        let mut reader = FfmpegReader::new();
        reader.open(&path).unwrap();

        let frames: Vec<Frame> = reader.frames().map(|f| f.unwrap()).collect();
        assert_eq!(frames.len(), 4);
        for (i, frame) in frames.iter().enumerate() {
            assert_eq!(frame.index(), i);
            assert_eq!(frame.channels(), 3);
            assert_eq!(frame.data().len(), 96 * 64 * 3);
        }
    }

    #[test]
    fn test_frames_before_open_yield_error() {
        let mut reader = FfmpegReader::new();
        assert!(reader.frames().next().unwrap().is_err());
    }

    #[test]
    fn test_close_releases_handle_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = video_in(dir.path(), 1);
        let mut reader = FfmpegReader::new();
        reader.open(&path).unwrap();
        reader.close();
        assert!(reader.ctx.is_none());
        reader.close();
    }
}
