use std::fmt;

/// Counts describing one finished reconstruction run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconstructionSummary {
    pub frames_read: usize,
    /// Frames whose landmarks went into the point cloud.
    pub frames_used: usize,
    /// Frames where no face was found.
    pub frames_skipped: usize,
    /// Points handed to the surface builder, synthetic points included.
    pub point_count: usize,
    pub vertex_count: usize,
    pub triangle_count: usize,
}

impl fmt::Display for ReconstructionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} frames used ({} skipped), {} points -> {} vertices, {} triangles",
            self.frames_used,
            self.frames_read,
            self.frames_skipped,
            self.point_count,
            self.vertex_count,
            self.triangle_count
        )
    }
}
