pub mod mesh;
pub mod mesh_writer;
