//! BlazeFace face detector using ONNX Runtime via `ort`.
//!
//! Finds the most confident face in a frame so the face-mesh model can be run
//! on a crop around it instead of the whole picture.

use std::path::Path;

use crate::shared::frame::Frame;

use super::execution_provider::build_session;
use super::square_roi::{sample_square, sigmoid, InputLayout, SquareRoi};

/// BlazeFace short-range input resolution.
const INPUT_SIZE: u32 = 128;

/// Default minimum face confidence.
pub const DEFAULT_FACE_CONFIDENCE: f64 = 0.5;

/// Number of BlazeFace anchors (short-range model).
const NUM_ANCHORS: usize = 896;

/// Box deltas plus six keypoints per anchor.
const REGRESSOR_STRIDE: usize = 16;

/// A detected face in frame pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FaceBox {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub score: f64,
}

/// Anchor-decoded box in unit coordinates of the detector input square.
#[derive(Clone, Copy, Debug, PartialEq)]
struct UnitDetection {
    cx: f64,
    cy: f64,
    width: f64,
    height: f64,
    score: f64,
}

impl UnitDetection {
    fn in_frame(&self, roi: SquareRoi) -> FaceBox {
        let (x0, y0) = roi.to_frame(self.cx - self.width / 2.0, self.cy - self.height / 2.0);
        let (x1, y1) = roi.to_frame(self.cx + self.width / 2.0, self.cy + self.height / 2.0);
        FaceBox {
            x0,
            y0,
            x1,
            y1,
            score: self.score,
        }
    }
}

/// BlazeFace detector backed by an ONNX Runtime session.
pub struct OnnxBlazefaceDetector {
    session: ort::session::Session,
    layout: InputLayout,
    confidence: f64,
    anchors: Vec<[f32; 2]>,
}

impl OnnxBlazefaceDetector {
    /// Load a BlazeFace ONNX model.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, Box<dyn std::error::Error>> {
        let session = build_session(model_path)?;
        let layout = InputLayout::of_session(
            &session,
            InputLayout {
                size: INPUT_SIZE,
                channels_last: false,
            },
        );
        if layout.size != INPUT_SIZE {
            log::warn!(
                "BlazeFace input is {}x{}, anchors assume {INPUT_SIZE}x{INPUT_SIZE}",
                layout.size,
                layout.size
            );
        }
        Ok(Self {
            session,
            layout,
            confidence,
            anchors: generate_anchors(),
        })
    }

    /// The most confident face in `frame`, if any clears the threshold.
    pub fn detect(&mut self, frame: &Frame) -> Result<Option<FaceBox>, Box<dyn std::error::Error>> {
        let roi = SquareRoi::full_frame(frame);
        let input_tensor = sample_square(frame, roi, self.layout);
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        // Regressors [1, 896, 16] and scores [1, 896, 1]; output order varies by export.
        let mut regressors: Option<Vec<f32>> = None;
        let mut scores: Option<Vec<f32>> = None;
        for i in 0..outputs.len() {
            let tensor = outputs[i].try_extract_array::<f32>()?;
            match tensor.len() {
                n if n == NUM_ANCHORS * REGRESSOR_STRIDE => {
                    regressors = Some(tensor.iter().copied().collect())
                }
                NUM_ANCHORS => scores = Some(tensor.iter().copied().collect()),
                _ => {}
            }
        }
        let regressors = regressors.ok_or("BlazeFace model produced no box regressors")?;
        let scores = scores.ok_or("BlazeFace model produced no scores")?;

        let best = best_detection(&scores, &regressors, &self.anchors, self.confidence)
            .map(|d| d.in_frame(roi));
        match &best {
            Some(face) => log::trace!("Frame {}: face score {:.3}", frame.index(), face.score),
            None => log::trace!("Frame {}: no face above {}", frame.index(), self.confidence),
        }
        Ok(best)
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Highest-scoring anchor whose sigmoid score reaches `confidence`.
fn best_detection(
    scores: &[f32],
    regressors: &[f32],
    anchors: &[[f32; 2]],
    confidence: f64,
) -> Option<UnitDetection> {
    let (index, score) = scores
        .iter()
        .take(anchors.len())
        .enumerate()
        .map(|(i, &raw)| (i, sigmoid(raw as f64)))
        .filter(|&(i, score)| {
            score >= confidence && (i + 1) * REGRESSOR_STRIDE <= regressors.len()
        })
        .max_by(|a, b| a.1.total_cmp(&b.1))?;

    let anchor = anchors[index];
    let reg = &regressors[index * REGRESSOR_STRIDE..];
    let scale = INPUT_SIZE as f64;
    Some(UnitDetection {
        cx: anchor[0] as f64 + reg[0] as f64 / scale,
        cy: anchor[1] as f64 + reg[1] as f64 / scale,
        width: reg[2] as f64 / scale,
        height: reg[3] as f64 / scale,
        score,
    })
}

/// Generate BlazeFace anchors for the short-range model.
///
/// The short-range model uses two feature map sizes: 16×16 and 8×8,
/// with 2 and 6 anchors per cell respectively.
fn generate_anchors() -> Vec<[f32; 2]> {
    let strides = [(8, 2), (16, 6)]; // (stride, anchors_per_cell)
    let mut anchors = Vec::with_capacity(NUM_ANCHORS);

    for &(stride, num) in &strides {
        let grid_size = INPUT_SIZE as usize / stride;
        for y in 0..grid_size {
            for x in 0..grid_size {
                let cx = (x as f32 + 0.5) / grid_size as f32;
                let cy = (y as f32 + 0.5) / grid_size as f32;
                for _ in 0..num {
                    anchors.push([cx, cy]);
                }
            }
        }
    }

    anchors
}
