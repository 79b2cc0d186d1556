use std::path::Path;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::landmarks::domain::landmark_provider::LandmarkProvider;
use crate::landmarks::domain::landmark_set::LandmarkSet;
use crate::mesh::domain::mesh_writer::MeshWriter;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::reconstruction_summary::ReconstructionSummary;
use crate::reconstruction::domain::frame_aligner::{AlignmentMode, FrameAligner};
use crate::reconstruction::domain::sequence_assembler::SequenceAssembler;
use crate::reconstruction::domain::surface_builder::{SurfaceBuilder, SurfaceStrategy};
use crate::reconstruction::domain::synthetic_completer::SyntheticCompleter;
use crate::shared::config::ReconstructionConfig;
use crate::shared::error::ReconstructionError;
use crate::video::domain::video_reader::VideoReader;

/// Multi-frame pipeline: decode → detect → align → assemble → complete →
/// convex hull → write.
///
/// Frames without a face are skipped with a warning. The run fails only when
/// no frame contributed landmarks.
pub struct ReconstructVideoUseCase {
    reader: Box<dyn VideoReader>,
    provider: Box<dyn LandmarkProvider>,
    mesh_writer: Box<dyn MeshWriter>,
    config: ReconstructionConfig,
    logger: Box<dyn PipelineLogger>,
}

impl ReconstructVideoUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        provider: Box<dyn LandmarkProvider>,
        mesh_writer: Box<dyn MeshWriter>,
        config: ReconstructionConfig,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            reader,
            provider,
            mesh_writer,
            config,
            logger,
        }
    }

    /// Runs with a generator seeded from `config.seed`, or from the OS when unset.
    pub fn execute(
        &mut self,
        input_path: &Path,
        output_path: &Path,
    ) -> Result<ReconstructionSummary, ReconstructionError> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.execute_with_rng(input_path, output_path, &mut rng)
    }

    pub fn execute_with_rng<R: Rng + ?Sized>(
        &mut self,
        input_path: &Path,
        output_path: &Path,
        rng: &mut R,
    ) -> Result<ReconstructionSummary, ReconstructionError> {
        self.config.validate()?;

        let collected = self.collect_landmarks(input_path);
        self.reader.close();
        let (sets, mut summary) = collected?;

        let aligner = FrameAligner::new(
            AlignmentMode::ReferencePca {
                reference_index: self.config.reference_index,
            },
            self.config.landmark_count,
        );
        let started = Instant::now();
        let cloud = SequenceAssembler::new(aligner).assemble(&sets)?;
        let completed = SyntheticCompleter::from_config(&self.config)?.complete(&cloud, rng);
        self.logger.timing("assemble", elapsed_ms(started));
        summary.point_count = completed.len();
        self.logger.metric("points", completed.len() as f64);

        let started = Instant::now();
        let mesh = SurfaceBuilder::new(SurfaceStrategy::ConvexHull).build(completed.points())?;
        self.logger.timing("hull", elapsed_ms(started));
        summary.vertex_count = mesh.vertex_count();
        summary.triangle_count = mesh.triangle_count();
        self.logger.metric("vertices", mesh.vertex_count() as f64);
        self.logger.metric("triangles", mesh.triangle_count() as f64);

        let started = Instant::now();
        self.mesh_writer
            .write(output_path, &mesh)
            .map_err(|e| ReconstructionError::io(format!("{}: {e}", output_path.display())))?;
        self.logger.timing("write", elapsed_ms(started));

        self.logger.info(&format!("Wrote {}: {summary}", output_path.display()));
        self.logger.summary();
        Ok(summary)
    }

    /// Decodes every frame and keeps the landmark sets of frames with a face.
    fn collect_landmarks(
        &mut self,
        input_path: &Path,
    ) -> Result<(Vec<LandmarkSet>, ReconstructionSummary), ReconstructionError> {
        let metadata = self
            .reader
            .open(input_path)
            .map_err(|e| ReconstructionError::io(format!("{}: {e}", input_path.display())))?;
        self.logger.info(&format!(
            "Reading {} ({}x{}, {} frames)",
            input_path.display(),
            metadata.width,
            metadata.height,
            metadata.total_frames
        ));

        let mut sets = Vec::new();
        let mut summary = ReconstructionSummary::default();
        for frame in self.reader.frames() {
            let frame = frame.map_err(ReconstructionError::io)?;
            summary.frames_read += 1;

            let started = Instant::now();
            let detected = self
                .provider
                .detect(&frame)
                .map_err(|e| ReconstructionError::detection(format!("frame {}: {e}", frame.index())))?;
            self.logger.timing("detect", elapsed_ms(started));

            match detected {
                Some(set) => sets.push(set),
                None => {
                    summary.frames_skipped += 1;
                    self.logger
                        .warn(&format!("No face detected in frame {}, skipping", frame.index()));
                }
            }
            self.logger.progress(summary.frames_read, metadata.total_frames);
        }

        summary.frames_used = sets.len();
        Ok((sets, summary))
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
