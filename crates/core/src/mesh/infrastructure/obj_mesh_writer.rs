use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::mesh::domain::mesh::Mesh;
use crate::mesh::domain::mesh_writer::MeshWriter;

/// Writes a mesh as Wavefront OBJ.
///
/// Each vertex gets a `v` and a matching `vn` line, so faces reference
/// position and normal by the same 1-based index (`f a//a b//b c//c`).
pub struct ObjMeshWriter;

impl ObjMeshWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ObjMeshWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshWriter for ObjMeshWriter {
    fn write(&self, path: &Path, mesh: &Mesh) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut out = BufWriter::new(File::create(path)?);
        writeln!(
            out,
            "# {} vertices, {} faces",
            mesh.vertex_count(),
            mesh.triangle_count()
        )?;
        for v in mesh.vertices() {
            writeln!(out, "v {} {} {}", v.x, v.y, v.z)?;
        }
        for n in mesh.vertex_normals() {
            writeln!(out, "vn {} {} {}", n.x, n.y, n.z)?;
        }
        for &[a, b, c] in mesh.triangles() {
            let (a, b, c) = (a + 1, b + 1, c + 1);
            writeln!(out, "f {a}//{a} {b}//{b} {c}//{c}")?;
        }
        out.flush()?;

        log::debug!("Wrote OBJ mesh to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn triangle_mesh() -> Mesh {
        Mesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
        )
        .unwrap()
    }

    #[test]
    fn test_writes_vertices_normals_and_one_based_faces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("head.obj");
        ObjMeshWriter::new().write(&path, &triangle_mesh()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.iter().filter(|l| l.starts_with("v ")).count(), 3);
        assert_eq!(lines.iter().filter(|l| l.starts_with("vn ")).count(), 3);
        assert!(lines.contains(&"v 1 0 0"));
        assert!(lines.contains(&"vn 0 0 1"));
        assert!(lines.contains(&"f 1//1 2//2 3//3"));
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("head.obj");
        ObjMeshWriter::new().write(&path, &triangle_mesh()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_empty_mesh_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.obj");
        let mesh = Mesh::new(Vec::new(), Vec::new()).unwrap();
        ObjMeshWriter::new().write(&path, &mesh).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
