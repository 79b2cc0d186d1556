use std::path::Path;

use crate::mesh::domain::mesh::Mesh;

/// Persists a mesh (positions, vertex normals, triangles) to a file.
pub trait MeshWriter: Send {
    fn write(&self, path: &Path, mesh: &Mesh) -> Result<(), Box<dyn std::error::Error>>;
}
