use std::path::Path;
use std::time::Instant;

use crate::landmarks::domain::landmark_provider::LandmarkProvider;
use crate::mesh::domain::mesh_writer::MeshWriter;
use crate::overlay::domain::overlay_renderer::OverlayRenderer;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::reconstruction_summary::ReconstructionSummary;
use crate::reconstruction::domain::frame_aligner::{AlignmentMode, FrameAligner};
use crate::reconstruction::domain::surface_builder::{SurfaceBuilder, SurfaceStrategy};
use crate::shared::config::ReconstructionConfig;
use crate::shared::error::ReconstructionError;
use crate::shared::frame::Frame;
use crate::video::domain::video_reader::VideoReader;

/// Single-image pipeline: read → detect → overlay → align → planar
/// Delaunay → write.
///
/// The mesh is an open sheet over the visible face; every landmark becomes
/// a vertex, so vertex `i` is landmark `i`.
pub struct ReconstructImageUseCase {
    reader: Box<dyn VideoReader>,
    provider: Box<dyn LandmarkProvider>,
    mesh_writer: Box<dyn MeshWriter>,
    overlay: Box<dyn OverlayRenderer>,
    config: ReconstructionConfig,
    logger: Box<dyn PipelineLogger>,
}

impl ReconstructImageUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        provider: Box<dyn LandmarkProvider>,
        mesh_writer: Box<dyn MeshWriter>,
        overlay: Box<dyn OverlayRenderer>,
        config: ReconstructionConfig,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            reader,
            provider,
            mesh_writer,
            overlay,
            config,
            logger,
        }
    }

    /// Writes the mesh to `mesh_path` and, when given, the landmark overlay
    /// to `overlay_path`.
    pub fn execute(
        &mut self,
        input_path: &Path,
        mesh_path: &Path,
        overlay_path: Option<&Path>,
    ) -> Result<ReconstructionSummary, ReconstructionError> {
        self.config.validate()?;

        let frame = self.read_frame(input_path);
        self.reader.close();
        let frame = frame?;
        let mut summary = ReconstructionSummary {
            frames_read: 1,
            ..ReconstructionSummary::default()
        };

        let started = Instant::now();
        let landmarks = self
            .provider
            .detect(&frame)
            .map_err(ReconstructionError::detection)?
            .ok_or_else(|| ReconstructionError::NoFaceDetected(input_path.display().to_string()))?;
        self.logger.timing("detect", elapsed_ms(started));
        landmarks.ensure_cardinality(self.config.landmark_count)?;
        summary.frames_used = 1;

        if let Some(path) = overlay_path {
            let pixels = landmarks.pixel_coordinates(frame.width(), frame.height());
            self.overlay
                .render(&frame, &pixels, path)
                .map_err(|e| ReconstructionError::io(format!("{}: {e}", path.display())))?;
            self.logger.info(&format!("Wrote overlay {}", path.display()));
        }

        let aligned = FrameAligner::new(AlignmentMode::CentroidFlip, self.config.landmark_count)
            .align(&landmarks)?;
        summary.point_count = aligned.len();

        let started = Instant::now();
        let mesh = SurfaceBuilder::new(SurfaceStrategy::PlanarDelaunay).build(aligned.points())?;
        self.logger.timing("triangulate", elapsed_ms(started));
        summary.vertex_count = mesh.vertex_count();
        summary.triangle_count = mesh.triangle_count();
        self.logger.metric("triangles", mesh.triangle_count() as f64);

        self.mesh_writer
            .write(mesh_path, &mesh)
            .map_err(|e| ReconstructionError::io(format!("{}: {e}", mesh_path.display())))?;

        self.logger.info(&format!("Wrote {}: {summary}", mesh_path.display()));
        self.logger.summary();
        Ok(summary)
    }

    fn read_frame(&mut self, input_path: &Path) -> Result<Frame, ReconstructionError> {
        let with_path = |e: Box<dyn std::error::Error>| {
            ReconstructionError::io(format!("{}: {e}", input_path.display()))
        };
        self.reader.open(input_path).map_err(with_path)?;
        self.reader
            .frames()
            .next()
            .ok_or_else(|| ReconstructionError::io(format!("{}: no image data", input_path.display())))?
            .map_err(with_path)
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
