use thiserror::Error;

/// Failure kinds surfaced by the reconstruction pipelines.
///
/// Infrastructure collaborators report `Box<dyn Error>`; the use cases fold
/// those into [`ReconstructionError::Io`] or [`ReconstructionError::Detection`].
#[derive(Error, Debug)]
pub enum ReconstructionError {
    #[error("no face detected in {0}")]
    NoFaceDetected(String),
    #[error("malformed landmark set: expected {expected} landmarks, got {actual}")]
    MalformedLandmarkSet { expected: usize, actual: usize },
    #[error("no frame yielded usable landmarks")]
    EmptyLandmarkSequence,
    #[error("degenerate geometry: {0}")]
    DegenerateGeometry(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("landmark detection failed: {0}")]
    Detection(String),
    #[error("I/O error: {0}")]
    Io(String),
}

impl ReconstructionError {
    pub fn io(err: impl std::fmt::Display) -> Self {
        Self::Io(err.to_string())
    }

    pub fn detection(err: impl std::fmt::Display) -> Self {
        Self::Detection(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_message_names_counts() {
        let err = ReconstructionError::MalformedLandmarkSet {
            expected: 468,
            actual: 12,
        };
        assert_eq!(
            err.to_string(),
            "malformed landmark set: expected 468 landmarks, got 12"
        );
    }

    #[test]
    fn test_io_wraps_display() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.mp4");
        let err = ReconstructionError::io(source);
        assert!(matches!(err, ReconstructionError::Io(ref m) if m.contains("missing.mp4")));
    }
}
