use std::path::Path;

use crate::overlay::domain::overlay_renderer::OverlayRenderer;
use crate::shared::frame::Frame;
use crate::video::domain::image_writer::ImageWriter;

pub const DEFAULT_DOT_RADIUS: u32 = 2;
pub const DEFAULT_DOT_COLOR: [u8; 3] = [0, 255, 0];

/// Marks each point with a filled disc on a copy of the frame.
///
/// Points partly or wholly outside the frame are clipped.
pub struct DotOverlayRenderer {
    writer: Box<dyn ImageWriter>,
    radius: u32,
    color: [u8; 3],
}

impl DotOverlayRenderer {
    pub fn new(writer: Box<dyn ImageWriter>) -> Self {
        Self {
            writer,
            radius: DEFAULT_DOT_RADIUS,
            color: DEFAULT_DOT_COLOR,
        }
    }

    pub fn with_style(mut self, radius: u32, color: [u8; 3]) -> Self {
        self.radius = radius;
        self.color = color;
        self
    }

    fn draw(&self, frame: &mut Frame, points: &[(f64, f64)]) {
        let r = self.radius as i64;
        for &(x, y) in points {
            if !x.is_finite() || !y.is_finite() {
                continue;
            }
            let (cx, cy) = (x.round() as i64, y.round() as i64);
            for dy in -r..=r {
                for dx in -r..=r {
                    if dx * dx + dy * dy <= r * r {
                        frame.put_pixel(cx + dx, cy + dy, self.color);
                    }
                }
            }
        }
    }
}

impl OverlayRenderer for DotOverlayRenderer {
    fn render(
        &self,
        frame: &Frame,
        points: &[(f64, f64)],
        path: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut canvas = frame.clone();
        self.draw(&mut canvas, points);
        self.writer.write(path, &canvas)?;
        log::debug!("Wrote {} landmark dots to {}", points.len(), path.display());
        Ok(())
    }
}
