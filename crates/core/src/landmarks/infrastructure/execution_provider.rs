use std::path::Path;

use ort::execution_providers::ExecutionProviderDispatch;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;

/// Hardware execution providers to try for the current platform.
///
/// ONNX Runtime falls back to its CPU provider when none of these can be
/// registered, so an empty list means CPU only.
pub fn platform_execution_providers() -> Vec<ExecutionProviderDispatch> {
    #[cfg(target_os = "macos")]
    let providers = vec![ort::execution_providers::CoreMLExecutionProvider::default().build()];
    #[cfg(target_os = "windows")]
    let providers = vec![ort::execution_providers::DirectMLExecutionProvider::default().build()];
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let providers = Vec::new();

    log::debug!("Requesting {} hardware execution provider(s)", providers.len());
    providers
}

/// Loads an ONNX model with full graph optimization on the platform providers.
pub fn build_session(model_path: &Path) -> Result<Session, Box<dyn std::error::Error>> {
    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_execution_providers(platform_execution_providers())?
        .commit_from_file(model_path)?;
    log::debug!("Loaded ONNX model {}", model_path.display());
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_at_most_one_provider_per_platform() {
        assert!(platform_execution_providers().len() <= 1);
    }

    #[test]
    fn test_build_session_rejects_missing_model() {
        assert!(build_session(Path::new("/nonexistent/model.onnx")).is_err());
    }
}
