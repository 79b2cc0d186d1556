//! Decoder plumbing shared by the ffmpeg-backed readers.

use std::path::Path;

use ffmpeg_next::format::context::Input;
use ffmpeg_next::software::scaling;
use ffmpeg_next::util::frame::video::Video;

use crate::shared::frame::Frame;

/// Best video stream of an opened input, with a decoder and an RGB24 scaler.
pub(crate) struct DecodeContext {
    pub input: Input,
    pub decoder: ffmpeg_next::decoder::Video,
    pub scaler: scaling::Context,
    pub stream_index: usize,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub total_frames: usize,
}

pub(crate) fn open_input(path: &Path) -> Result<DecodeContext, Box<dyn std::error::Error>> {
    ffmpeg_next::init()?;
    let input = ffmpeg_next::format::input(path)?;

    let stream = input
        .streams()
        .best(ffmpeg_next::media::Type::Video)
        .ok_or_else(|| format!("No video stream in {}", path.display()))?;
    let stream_index = stream.index();

    let rate = stream.rate();
    let fps = if rate.denominator() != 0 {
        rate.numerator() as f64 / rate.denominator() as f64
    } else {
        0.0
    };
    let total_frames = stream.frames().max(0) as usize;

    let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
    let decoder = codec_ctx.decoder().video()?;
    let width = decoder.width();
    let height = decoder.height();

    let scaler = scaling::Context::get(
        decoder.format(),
        width,
        height,
        ffmpeg_next::format::Pixel::RGB24,
        width,
        height,
        scaling::Flags::BILINEAR,
    )?;

    Ok(DecodeContext {
        input,
        decoder,
        scaler,
        stream_index,
        width,
        height,
        fps,
        total_frames,
    })
}

impl DecodeContext {
    pub fn codec_name(&self) -> String {
        self.decoder
            .codec()
            .map(|c| c.name().to_string())
            .unwrap_or_default()
    }

    /// Pulls one decoded frame if the decoder has one ready.
    pub fn receive(&mut self, index: usize) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        let mut decoded = Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }
        let mut rgb = Video::empty();
        self.scaler.run(&decoded, &mut rgb)?;
        let pixels = packed_rgb(&rgb, self.width, self.height);
        Ok(Some(Frame::new(pixels, self.width, self.height, 3, index)))
    }

    /// Decodes the next frame in stream order, draining the decoder at end of input.
    pub fn next_frame(
        &mut self,
        index: usize,
        flushing: &mut bool,
    ) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
        if let Some(frame) = self.receive(index)? {
            return Ok(Some(frame));
        }
        if *flushing {
            return Ok(None);
        }
        loop {
            let Some((stream, packet)) = self.input.packets().next() else {
                let _ = self.decoder.send_eof();
                *flushing = true;
                return self.receive(index);
            };
            if stream.index() != self.stream_index {
                continue;
            }
            if let Err(e) = self.decoder.send_packet(&packet) {
                log::debug!("Skipping undecodable packet: {e}");
                continue;
            }
            if let Some(frame) = self.receive(index)? {
                return Ok(Some(frame));
            }
        }
    }
}

/// Strips per-row stride padding from an RGB24 frame.
fn packed_rgb(frame: &Video, width: u32, height: u32) -> Vec<u8> {
    let stride = frame.stride(0);
    let data = frame.data(0);
    let row_bytes = width as usize * 3;
    (0..height as usize)
        .flat_map(|row| &data[row * stride..row * stride + row_bytes])
        .copied()
        .collect()
}
