pub const FACE_MESH_MODEL_NAME: &str = "face_landmark.onnx";
pub const FACE_DETECTOR_MODEL_NAME: &str = "face_detection_short_range.onnx";

/// Landmarks per face in the face-mesh topology.
pub const FACE_MESH_LANDMARK_COUNT: usize = 468;

/// Index of the nose tip in the face-mesh topology.
pub const NOSE_TIP_INDEX: usize = 1;

pub const DEFAULT_SYNTHETIC_COUNT: usize = 100;
pub const DEFAULT_SYNTHETIC_HALF_EXTENT: f64 = 0.5;
pub const DEFAULT_SYNTHETIC_DEPTH_OFFSET: f64 = -1.0;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
