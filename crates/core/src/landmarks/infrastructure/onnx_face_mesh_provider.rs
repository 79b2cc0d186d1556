//! Face-mesh landmark provider using ONNX Runtime via `ort`.
//!
//! Detection runs in two stages. BlazeFace finds the face, and the 468-point
//! face-mesh network runs on a square crop around it. The landmarks are then
//! mapped back to normalized frame coordinates. In streaming mode the
//! previous face's landmark bounds become the next frame's crop, and the
//! detector only runs again once tracking is lost.

use std::path::Path;

use crate::landmarks::domain::landmark_provider::LandmarkProvider;
use crate::landmarks::domain::landmark_set::{Landmark, LandmarkSet};
use crate::shared::config::DetectorMode;
use crate::shared::constants::FACE_MESH_LANDMARK_COUNT;
use crate::shared::frame::Frame;

use super::execution_provider::build_session;
use super::onnx_blazeface_detector::{FaceBox, OnnxBlazefaceDetector};
use super::square_roi::{sample_square, sigmoid, InputLayout, SquareRoi};

/// Fallback input resolution when the model doesn't specify dimensions.
const DEFAULT_INPUT_SIZE: u32 = 192;

/// Minimum face-presence probability to accept a detection.
pub const DEFAULT_PRESENCE_THRESHOLD: f64 = 0.5;

/// Growth applied to a face box or landmark bounds to form the face-mesh crop.
const ROI_EXPANSION: f64 = 1.5;

/// Face-mesh detector backed by an ONNX Runtime session.
pub struct OnnxFaceMeshProvider {
    session: ort::session::Session,
    face_detector: OnnxBlazefaceDetector,
    layout: InputLayout,
    mode: DetectorMode,
    presence_threshold: f64,
    tracked_roi: Option<SquareRoi>,
}

impl OnnxFaceMeshProvider {
    /// Load a face-mesh ONNX model that runs on crops found by `face_detector`.
    ///
    /// The input layout is read from the model (`[1, H, W, 3]` or `[1, 3, H, W]`);
    /// dynamic or unreadable shapes fall back to 192x192 NHWC.
    pub fn new(
        model_path: &Path,
        face_detector: OnnxBlazefaceDetector,
        mode: DetectorMode,
        presence_threshold: f64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let session = build_session(model_path)?;
        let layout = InputLayout::of_session(
            &session,
            InputLayout {
                size: DEFAULT_INPUT_SIZE,
                channels_last: true,
            },
        );
        log::debug!(
            "Face-mesh input {}x{} ({})",
            layout.size,
            layout.size,
            layout.describe()
        );

        Ok(Self {
            session,
            face_detector,
            layout,
            mode,
            presence_threshold,
            tracked_roi: None,
        })
    }

    fn run(
        &mut self,
        frame: &Frame,
        roi: SquareRoi,
    ) -> Result<Option<LandmarkSet>, Box<dyn std::error::Error>> {
        let input_tensor = sample_square(frame, roi, self.layout);
        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;

        let mut raw_landmarks: Option<Vec<f32>> = None;
        let mut presence_logit: Option<f32> = None;
        for i in 0..outputs.len() {
            let tensor = outputs[i].try_extract_array::<f32>()?;
            if tensor.len() >= FACE_MESH_LANDMARK_COUNT * 3 && raw_landmarks.is_none() {
                raw_landmarks = Some(tensor.iter().copied().collect());
            } else if tensor.len() == 1 {
                presence_logit = tensor.iter().next().copied();
            }
        }

        let raw = raw_landmarks.ok_or("Face-mesh model produced no landmark tensor")?;
        if let Some(logit) = presence_logit {
            let presence = sigmoid(logit as f64);
            if presence < self.presence_threshold {
                log::trace!("Frame {}: face presence {presence:.3}", frame.index());
                return Ok(None);
            }
        }

        Ok(Some(decode_landmarks(&raw, frame, roi, self.layout.size)))
    }

    /// Crop around the detector's best face, or `None` when it finds none.
    fn detect_roi(&mut self, frame: &Frame) -> Result<Option<SquareRoi>, Box<dyn std::error::Error>> {
        let roi = self
            .face_detector
            .detect(frame)?
            .and_then(|face| roi_for_face(&face));
        if roi.is_none() {
            log::debug!("Frame {}: no face found by detector", frame.index());
        }
        Ok(roi)
    }
}

impl LandmarkProvider for OnnxFaceMeshProvider {
    fn detect(
        &mut self,
        frame: &Frame,
    ) -> Result<Option<LandmarkSet>, Box<dyn std::error::Error>> {
        if self.mode == DetectorMode::Streaming {
            if let Some(roi) = self.tracked_roi {
                if let Some(landmarks) = self.run(frame, roi)? {
                    self.tracked_roi = SquareRoi::around(&landmarks, frame, ROI_EXPANSION);
                    return Ok(Some(landmarks));
                }
                log::debug!("Frame {}: tracking lost, running face detector", frame.index());
                self.tracked_roi = None;
            }
        }

        let Some(roi) = self.detect_roi(frame)? else {
            return Ok(None);
        };
        let found = self.run(frame, roi)?;
        if self.mode == DetectorMode::Streaming {
            self.tracked_roi = found
                .as_ref()
                .and_then(|landmarks| SquareRoi::around(landmarks, frame, ROI_EXPANSION));
        }
        Ok(found)
    }
}

// ---------------------------------------------------------------------------
// Pre/post-processing
// ---------------------------------------------------------------------------

fn roi_for_face(face: &FaceBox) -> Option<SquareRoi> {
    SquareRoi::around_rect(face.x0, face.y0, face.x1, face.y1, ROI_EXPANSION)
}

/// Maps model-space landmarks (input pixels) to normalized frame coordinates.
///
/// Depth is normalized by frame width, matching the x scale.
fn decode_landmarks(raw: &[f32], frame: &Frame, roi: SquareRoi, input_size: u32) -> LandmarkSet {
    let scale = roi.size / input_size as f64;
    let fw = frame.width() as f64;
    let fh = frame.height() as f64;
    let points = raw
        .chunks_exact(3)
        .take(FACE_MESH_LANDMARK_COUNT)
        .map(|p| {
            let px = roi.x + p[0] as f64 * scale;
            let py = roi.y + p[1] as f64 * scale;
            Landmark::new(px / fw, py / fh, p[2] as f64 * scale / fw)
        })
        .collect();
    LandmarkSet::new(points)
}
