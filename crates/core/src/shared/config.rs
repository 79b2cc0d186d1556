use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::shared::constants::{
    DEFAULT_SYNTHETIC_COUNT, DEFAULT_SYNTHETIC_DEPTH_OFFSET, DEFAULT_SYNTHETIC_HALF_EXTENT,
    FACE_MESH_LANDMARK_COUNT, NOSE_TIP_INDEX,
};
use crate::shared::error::ReconstructionError;

/// How the landmark detector treats consecutive inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectorMode {
    /// Every input is analysed independently.
    Static,
    /// The previous face location seeds the search in the next frame.
    Streaming,
}

impl std::fmt::Display for DetectorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DetectorMode::Static => write!(f, "static"),
            DetectorMode::Streaming => write!(f, "streaming"),
        }
    }
}

/// Tunables for both reconstruction pipelines.
///
/// Missing JSON fields fall back to [`ReconstructionConfig::default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructionConfig {
    /// Landmark placed at the origin by the video-path aligner.
    pub reference_index: usize,
    /// Landmarks every detected set must contain.
    pub landmark_count: usize,
    pub synthetic_count: usize,
    /// Synthetic points are drawn from `[-half_extent, half_extent)` per axis.
    pub synthetic_half_extent: f64,
    pub synthetic_depth_offset: f64,
    /// Minimum gap between the cloud's deepest point and any synthetic point.
    pub synthetic_depth_margin: f64,
    /// Fixed seed for synthetic completion; `None` seeds from the OS.
    pub seed: Option<u64>,
    pub detector_mode: DetectorMode,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            reference_index: NOSE_TIP_INDEX,
            landmark_count: FACE_MESH_LANDMARK_COUNT,
            synthetic_count: DEFAULT_SYNTHETIC_COUNT,
            synthetic_half_extent: DEFAULT_SYNTHETIC_HALF_EXTENT,
            synthetic_depth_offset: DEFAULT_SYNTHETIC_DEPTH_OFFSET,
            synthetic_depth_margin: 0.0,
            seed: None,
            detector_mode: DetectorMode::Streaming,
        }
    }
}

impl ReconstructionConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, ReconstructionError> {
        let json = fs::read_to_string(path)
            .map_err(|e| ReconstructionError::Io(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, ReconstructionError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ReconstructionError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconstructionError> {
        if self.landmark_count == 0 {
            return Err(ReconstructionError::InvalidConfig(
                "landmark_count must be positive".into(),
            ));
        }
        if self.reference_index >= self.landmark_count {
            return Err(ReconstructionError::InvalidConfig(format!(
                "reference_index {} is out of range for {} landmarks",
                self.reference_index, self.landmark_count
            )));
        }
        if !(self.synthetic_half_extent.is_finite() && self.synthetic_half_extent > 0.0) {
            return Err(ReconstructionError::InvalidConfig(format!(
                "synthetic_half_extent must be a positive number, got {}",
                self.synthetic_half_extent
            )));
        }
        if !self.synthetic_depth_offset.is_finite() {
            return Err(ReconstructionError::InvalidConfig(
                "synthetic_depth_offset must be finite".into(),
            ));
        }
        if !(self.synthetic_depth_margin.is_finite() && self.synthetic_depth_margin >= 0.0) {
            return Err(ReconstructionError::InvalidConfig(format!(
                "synthetic_depth_margin must be non-negative, got {}",
                self.synthetic_depth_margin
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults() {
        let config = ReconstructionConfig::default();
        assert_eq!(config.reference_index, 1);
        assert_eq!(config.landmark_count, 468);
        assert_eq!(config.synthetic_count, 100);
        assert_eq!(config.synthetic_half_extent, 0.5);
        assert_eq!(config.synthetic_depth_offset, -1.0);
        assert_eq!(config.seed, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ReconstructionConfig::from_json(
            r#"{ "synthetic_count": 250, "seed": 7, "detector_mode": "static" }"#,
        )
        .unwrap();
        assert_eq!(config.synthetic_count, 250);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.detector_mode, DetectorMode::Static);
        assert_eq!(config.reference_index, 1);
    }

    #[test]
    fn test_json_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = ReconstructionConfig {
            synthetic_depth_margin: 0.25,
            ..ReconstructionConfig::default()
        };
        fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
        assert_eq!(ReconstructionConfig::from_json_file(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ReconstructionConfig::from_json_file(Path::new("/nonexistent/config.json"))
            .unwrap_err();
        assert!(matches!(err, ReconstructionError::Io(_)));
    }

    #[test]
    fn test_garbage_json_is_invalid_config() {
        let err = ReconstructionConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ReconstructionError::InvalidConfig(_)));
    }

    #[rstest]
    #[case::reference_out_of_range(ReconstructionConfig { reference_index: 468, ..Default::default() })]
    #[case::zero_landmarks(ReconstructionConfig { landmark_count: 0, ..Default::default() })]
    #[case::zero_extent(ReconstructionConfig { synthetic_half_extent: 0.0, ..Default::default() })]
    #[case::nan_offset(ReconstructionConfig { synthetic_depth_offset: f64::NAN, ..Default::default() })]
    #[case::negative_margin(ReconstructionConfig { synthetic_depth_margin: -0.1, ..Default::default() })]
    fn test_validate_rejects(#[case] config: ReconstructionConfig) {
        assert!(matches!(
            config.validate(),
            Err(ReconstructionError::InvalidConfig(_))
        ));
    }
}
