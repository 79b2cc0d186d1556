use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use headmesh_core::landmarks::domain::landmark_provider::LandmarkProvider;
use headmesh_core::landmarks::infrastructure::model_resolver::{self, ModelSource};
use headmesh_core::landmarks::infrastructure::onnx_blazeface_detector::{
    OnnxBlazefaceDetector, DEFAULT_FACE_CONFIDENCE,
};
use headmesh_core::landmarks::infrastructure::onnx_face_mesh_provider::{
    OnnxFaceMeshProvider, DEFAULT_PRESENCE_THRESHOLD,
};
use headmesh_core::mesh::infrastructure::mesh_writer_factory::create_mesh_writer;
use headmesh_core::overlay::infrastructure::dot_overlay_renderer::DotOverlayRenderer;
use headmesh_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use headmesh_core::pipeline::reconstruct_image_use_case::ReconstructImageUseCase;
use headmesh_core::pipeline::reconstruct_video_use_case::ReconstructVideoUseCase;
use headmesh_core::shared::config::{DetectorMode, ReconstructionConfig};
use headmesh_core::shared::constants::{
    FACE_DETECTOR_MODEL_NAME, FACE_MESH_MODEL_NAME, IMAGE_EXTENSIONS,
};
use headmesh_core::video::infrastructure::ffmpeg_reader::FfmpegReader;
use headmesh_core::video::infrastructure::image_file_reader::ImageFileReader;
use headmesh_core::video::infrastructure::image_file_writer::ImageFileWriter;

/// Reconstruct a 3D head mesh from facial landmarks in a video or image.
#[derive(Parser)]
#[command(name = "headmesh")]
struct Cli {
    /// Input video or image file.
    input: PathBuf,

    /// Output mesh file (.obj or .ply).
    output: PathBuf,

    /// Landmark overlay image (image input only). Defaults to
    /// `<output stem>_landmarks.png` next to the mesh.
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Skip writing the landmark overlay.
    #[arg(long)]
    no_overlay: bool,

    /// JSON configuration file; flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Face-mesh ONNX model to use instead of the cached one.
    #[arg(long)]
    model: Option<PathBuf>,

    /// BlazeFace ONNX model to use instead of the cached one.
    #[arg(long)]
    detector_model: Option<PathBuf>,

    /// Directory searched for both models after the user cache.
    #[arg(long)]
    models_dir: Option<PathBuf>,

    /// URL to download the face-mesh model from when it is not found locally.
    #[arg(long)]
    model_url: Option<String>,

    /// URL to download the BlazeFace model from when it is not found locally.
    #[arg(long)]
    detector_model_url: Option<String>,

    /// Face presence threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_PRESENCE_THRESHOLD)]
    presence: f64,

    /// Face detector confidence threshold (0.0-1.0).
    #[arg(long, default_value_t = DEFAULT_FACE_CONFIDENCE)]
    face_confidence: f64,

    /// Detector mode: static or streaming.
    #[arg(long)]
    detector_mode: Option<String>,

    /// Seed for the synthetic back-of-head points.
    #[arg(long)]
    seed: Option<u64>,

    /// Landmark moved to the origin before alignment.
    #[arg(long)]
    reference_index: Option<usize>,

    /// Number of synthetic back-of-head points.
    #[arg(long)]
    synthetic_count: Option<usize>,

    /// Half edge length of the synthetic point cube.
    #[arg(long)]
    synthetic_extent: Option<f64>,

    /// Depth shift applied to the synthetic point cube.
    #[arg(long, allow_hyphen_values = true)]
    depth_offset: Option<f64>,

    /// Minimum depth gap between the face and the synthetic points.
    #[arg(long)]
    depth_margin: Option<f64>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;
    let config = build_config(&cli)?;

    let provider = build_provider(&cli, config.detector_mode)?;
    let mesh_writer = create_mesh_writer(&cli.output)?;
    let logger = Box::new(StdoutPipelineLogger::default());

    let summary = if is_image(&cli.input) {
        let overlay_path = overlay_path(&cli);
        let mut use_case = ReconstructImageUseCase::new(
            Box::new(ImageFileReader::new()),
            provider,
            mesh_writer,
            Box::new(DotOverlayRenderer::new(Box::new(ImageFileWriter::new()))),
            config,
            logger,
        );
        use_case.execute(&cli.input, &cli.output, overlay_path.as_deref())?
    } else {
        let mut use_case = ReconstructVideoUseCase::new(
            Box::new(FfmpegReader::new()),
            provider,
            mesh_writer,
            config,
            logger,
        );
        use_case.execute(&cli.input, &cli.output)?
    };

    log::info!("Mesh written to {} ({summary})", cli.output.display());
    Ok(())
}

fn build_config(cli: &Cli) -> Result<ReconstructionConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => ReconstructionConfig::from_json_file(path)?,
        None => ReconstructionConfig::default(),
    };

    if let Some(mode) = &cli.detector_mode {
        config.detector_mode = parse_detector_mode(mode)?;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    if let Some(index) = cli.reference_index {
        config.reference_index = index;
    }
    if let Some(count) = cli.synthetic_count {
        config.synthetic_count = count;
    }
    if let Some(extent) = cli.synthetic_extent {
        config.synthetic_half_extent = extent;
    }
    if let Some(offset) = cli.depth_offset {
        config.synthetic_depth_offset = offset;
    }
    if let Some(margin) = cli.depth_margin {
        config.synthetic_depth_margin = margin;
    }

    config.validate()?;
    log::debug!("Configuration: {config:?}");
    Ok(config)
}

fn build_provider(
    cli: &Cli,
    mode: DetectorMode,
) -> Result<Box<dyn LandmarkProvider>, Box<dyn std::error::Error>> {
    let detector_path = resolve_model(
        FACE_DETECTOR_MODEL_NAME,
        cli.detector_model.as_deref(),
        cli.models_dir.as_deref(),
        cli.detector_model_url.as_deref(),
    )?;
    let mesh_path = resolve_model(
        FACE_MESH_MODEL_NAME,
        cli.model.as_deref(),
        cli.models_dir.as_deref(),
        cli.model_url.as_deref(),
    )?;
    log::info!("Using {} in {mode} mode", mesh_path.display());

    let face_detector = OnnxBlazefaceDetector::new(&detector_path, cli.face_confidence)?;
    Ok(Box::new(OnnxFaceMeshProvider::new(
        &mesh_path,
        face_detector,
        mode,
        cli.presence,
    )?))
}

fn resolve_model(
    name: &str,
    explicit_path: Option<&Path>,
    bundled_dir: Option<&Path>,
    download_url: Option<&str>,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {name}");
    let source = ModelSource {
        explicit_path,
        bundled_dir,
        download_url,
    };
    Ok(model_resolver::resolve(
        name,
        &source,
        Some(Box::new(download_progress)),
    )?)
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    if !(0.0..=1.0).contains(&cli.presence) {
        return Err(format!(
            "Presence threshold must be between 0.0 and 1.0, got {}",
            cli.presence
        )
        .into());
    }
    if !(0.0..=1.0).contains(&cli.face_confidence) {
        return Err(format!(
            "Face confidence must be between 0.0 and 1.0, got {}",
            cli.face_confidence
        )
        .into());
    }
    if cli.overlay.is_some() && cli.no_overlay {
        return Err("--overlay and --no-overlay are mutually exclusive".into());
    }
    if cli.overlay.is_some() && !is_image(&cli.input) {
        log::warn!("--overlay is ignored for video input");
    }
    Ok(())
}

fn parse_detector_mode(mode: &str) -> Result<DetectorMode, Box<dyn std::error::Error>> {
    match mode {
        "static" => Ok(DetectorMode::Static),
        "streaming" => Ok(DetectorMode::Streaming),
        other => Err(format!("Detector mode must be 'static' or 'streaming', got '{other}'").into()),
    }
}

fn overlay_path(cli: &Cli) -> Option<PathBuf> {
    if cli.no_overlay {
        return None;
    }
    cli.overlay.clone().or_else(|| {
        let stem = cli.output.file_stem()?.to_string_lossy().into_owned();
        Some(cli.output.with_file_name(format!("{stem}_landmarks.png")))
    })
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading model... {pct}%");
    } else {
        eprint!("\rDownloading model... {downloaded} bytes");
    }
}
