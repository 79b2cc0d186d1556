use std::path::Path;

use crate::mesh::domain::mesh_writer::MeshWriter;

use super::obj_mesh_writer::ObjMeshWriter;
use super::ply_mesh_writer::PlyMeshWriter;

/// Mesh file format, chosen from the output extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeshFormat {
    Obj,
    Ply,
}

impl MeshFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "obj" => Some(Self::Obj),
            "ply" => Some(Self::Ply),
            _ => None,
        }
    }
}

/// Creates the writer matching the output file's extension.
pub fn create_mesh_writer(path: &Path) -> Result<Box<dyn MeshWriter>, Box<dyn std::error::Error>> {
    let format = MeshFormat::from_path(path).ok_or_else(|| {
        format!(
            "Unsupported mesh format for {} (expected .obj or .ply)",
            path.display()
        )
    })?;
    log::info!("Writing {:?} mesh to {}", format, path.display());
    Ok(match format {
        MeshFormat::Obj => Box::new(ObjMeshWriter::new()),
        MeshFormat::Ply => Box::new(PlyMeshWriter::new()),
    })
}
