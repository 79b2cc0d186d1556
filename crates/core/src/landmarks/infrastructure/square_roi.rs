//! Square frame crops shared by the face detector and the face-mesh model.

use ndarray::Array4;

use crate::landmarks::domain::landmark_set::LandmarkSet;
use crate::shared::frame::Frame;

/// Square sampling window in frame pixels. May extend past the frame edges.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct SquareRoi {
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

impl SquareRoi {
    /// Smallest square centred on the frame that contains all of it.
    pub fn full_frame(frame: &Frame) -> Self {
        let w = frame.width() as f64;
        let h = frame.height() as f64;
        let size = w.max(h);
        Self {
            x: (w - size) / 2.0,
            y: (h - size) / 2.0,
            size,
        }
    }

    /// Square centred on the pixel rectangle `(x0, y0)..(x1, y1)`, its longer
    /// side grown by `expansion`.
    pub fn around_rect(x0: f64, y0: f64, x1: f64, y1: f64, expansion: f64) -> Option<Self> {
        let size = (x1 - x0).max(y1 - y0) * expansion;
        if !(size.is_finite() && size >= 1.0) {
            return None;
        }
        let cx = (x0 + x1) / 2.0;
        let cy = (y0 + y1) / 2.0;
        Some(Self {
            x: cx - size / 2.0,
            y: cy - size / 2.0,
            size,
        })
    }

    /// Square around normalized landmarks, grown by `expansion`.
    pub fn around(landmarks: &LandmarkSet, frame: &Frame, expansion: f64) -> Option<Self> {
        let (x0, y0, x1, y1) = landmarks.bounds_2d()?;
        let w = frame.width() as f64;
        let h = frame.height() as f64;
        Self::around_rect(x0 * w, y0 * h, x1 * w, y1 * h, expansion)
    }

    /// Frame pixel position of a point given in unit coordinates of this square.
    pub fn to_frame(&self, u: f64, v: f64) -> (f64, f64) {
        (self.x + u * self.size, self.y + v * self.size)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct InputLayout {
    pub size: u32,
    pub channels_last: bool,
}

impl InputLayout {
    /// Layout of the session's first input, or `fallback` when the model
    /// leaves it dynamic.
    pub fn of_session(session: &ort::session::Session, fallback: InputLayout) -> Self {
        session
            .inputs()
            .first()
            .and_then(|input| {
                if let ort::value::ValueType::Tensor { ref shape, .. } = input.dtype() {
                    layout_from_shape(&shape[..])
                } else {
                    None
                }
            })
            .unwrap_or(fallback)
    }

    pub fn describe(&self) -> &'static str {
        if self.channels_last {
            "NHWC"
        } else {
            "NCHW"
        }
    }
}

/// Reads `[1, H, W, 3]` or `[1, 3, H, W]`; dynamic dimensions give `None`.
pub(crate) fn layout_from_shape(shape: &[i64]) -> Option<InputLayout> {
    if shape.len() != 4 {
        return None;
    }
    if shape[3] == 3 && shape[1] > 0 {
        Some(InputLayout {
            size: shape[1] as u32,
            channels_last: true,
        })
    } else if shape[1] == 3 && shape[2] > 0 {
        Some(InputLayout {
            size: shape[2] as u32,
            channels_last: false,
        })
    } else {
        None
    }
}

/// Nearest-neighbour samples `roi` into a `[0, 1]` float tensor.
///
/// Samples falling outside the frame are left at zero.
pub(crate) fn sample_square(frame: &Frame, roi: SquareRoi, layout: InputLayout) -> Array4<f32> {
    let n = layout.size as usize;
    let shape = if layout.channels_last {
        (1, n, n, 3)
    } else {
        (1, 3, n, n)
    };
    let mut tensor = Array4::<f32>::zeros(shape);

    let src = frame.as_ndarray();
    let fw = frame.width() as i64;
    let fh = frame.height() as i64;
    let step = roi.size / n as f64;

    for ty in 0..n {
        let sy = (roi.y + (ty as f64 + 0.5) * step).floor() as i64;
        if sy < 0 || sy >= fh {
            continue;
        }
        for tx in 0..n {
            let sx = (roi.x + (tx as f64 + 0.5) * step).floor() as i64;
            if sx < 0 || sx >= fw {
                continue;
            }
            for c in 0..3 {
                let v = src[[sy as usize, sx as usize, c]] as f32 / 255.0;
                if layout.channels_last {
                    tensor[[0, ty, tx, c]] = v;
                } else {
                    tensor[[0, c, ty, tx]] = v;
                }
            }
        }
    }
    tensor
}

pub(crate) fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}
