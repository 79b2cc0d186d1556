pub mod mesh_writer_factory;
pub mod obj_mesh_writer;
pub mod ply_mesh_writer;
