use std::path::Path;

use crate::shared::frame::Frame;

/// Draws landmark pixel positions over a source image and saves the result.
pub trait OverlayRenderer: Send {
    fn render(
        &self,
        frame: &Frame,
        points: &[(f64, f64)],
        path: &Path,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
