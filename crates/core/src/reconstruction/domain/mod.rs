pub mod convex_hull;
pub mod delaunay;
pub mod frame_aligner;
pub mod point_cloud;
pub mod sequence_assembler;
pub mod surface_builder;
pub mod synthetic_completer;
