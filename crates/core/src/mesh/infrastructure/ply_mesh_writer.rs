use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use ply_rs_bw::ply::{
    Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType,
    ScalarType,
};
use ply_rs_bw::writer::Writer;

use crate::mesh::domain::mesh::Mesh;
use crate::mesh::domain::mesh_writer::MeshWriter;

const VERTEX_PROPERTIES: [&str; 6] = ["x", "y", "z", "nx", "ny", "nz"];

/// Writes a mesh as ASCII PLY with per-vertex normals.
pub struct PlyMeshWriter;

impl PlyMeshWriter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PlyMeshWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshWriter for PlyMeshWriter {
    fn write(&self, path: &Path, mesh: &Mesh) -> Result<(), Box<dyn std::error::Error>> {
        let mut ply = to_ply(mesh)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = BufWriter::new(File::create(path)?);
        Writer::<DefaultElement>::new().write_ply(&mut out, &mut ply)?;
        out.flush()?;

        log::debug!("Wrote PLY mesh to {}", path.display());
        Ok(())
    }
}

fn to_ply(mesh: &Mesh) -> Result<Ply<DefaultElement>, Box<dyn std::error::Error>> {
    let mut ply = Ply::<DefaultElement>::new();
    ply.header.encoding = Encoding::Ascii;
    ply.header.comments.push("headmesh reconstruction".to_string());

    let mut vertex_def = ElementDef::new("vertex".to_string());
    for name in VERTEX_PROPERTIES {
        vertex_def.properties.add(PropertyDef::new(
            name.to_string(),
            PropertyType::Scalar(ScalarType::Double),
        ));
    }
    ply.header.elements.add(vertex_def);

    let mut face_def = ElementDef::new("face".to_string());
    face_def.properties.add(PropertyDef::new(
        "vertex_indices".to_string(),
        PropertyType::List(ScalarType::UChar, ScalarType::Int),
    ));
    ply.header.elements.add(face_def);

    let vertices = mesh
        .vertices()
        .iter()
        .zip(mesh.vertex_normals())
        .map(|(v, n)| {
            let mut element = DefaultElement::new();
            for (name, value) in VERTEX_PROPERTIES.iter().zip([v.x, v.y, v.z, n.x, n.y, n.z]) {
                element.insert(name.to_string(), Property::Double(value));
            }
            element
        })
        .collect();
    ply.payload.insert("vertex".to_string(), vertices);

    let faces = mesh
        .triangles()
        .iter()
        .map(|triangle| {
            let indices = triangle
                .iter()
                .map(|&i| i32::try_from(i))
                .collect::<Result<Vec<i32>, _>>()?;
            let mut element = DefaultElement::new();
            element.insert("vertex_indices".to_string(), Property::ListInt(indices));
            Ok(element)
        })
        .collect::<Result<Vec<_>, std::num::TryFromIntError>>()?;
    ply.payload.insert("face".to_string(), faces);

    ply.make_consistent()
        .map_err(|e| format!("inconsistent PLY data: {e:?}"))?;
    Ok(ply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;
    use ply_rs_bw::parser::Parser;
    use std::io::BufReader;

    fn tetrahedron() -> Mesh {
        Mesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
            ],
            vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
        )
        .unwrap()
    }

    fn read_back(path: &Path) -> Ply<DefaultElement> {
        let file = File::open(path).unwrap();
        Parser::<DefaultElement>::new()
            .read_ply(&mut BufReader::new(file))
            .unwrap()
    }

    #[test]
    fn test_header_declares_counts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("head.ply");
        PlyMeshWriter::new().write(&path, &tetrahedron()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("ply"));
        assert_eq!(lines.next(), Some("format ascii 1.0"));
        assert!(text.contains("element vertex 4"));
        assert!(text.contains("element face 4"));
        assert!(text.contains("property double nz"));
        assert!(text.contains("property list uchar int vertex_indices"));
    }

    #[test]
    fn test_faces_and_normals_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("head.ply");
        let mesh = tetrahedron();
        PlyMeshWriter::new().write(&path, &mesh).unwrap();

        let ply = read_back(&path);
        let faces = &ply.payload["face"];
        assert_eq!(faces.len(), 4);
        assert_eq!(faces[0]["vertex_indices"], Property::ListInt(vec![0, 2, 1]));
        assert_eq!(faces[3]["vertex_indices"], Property::ListInt(vec![1, 2, 3]));

        let vertices = &ply.payload["vertex"];
        assert_eq!(vertices.len(), 4);
        let expected = mesh.vertex_normals()[3];
        assert_eq!(vertices[3]["z"], Property::Double(1.0));
        assert_eq!(vertices[3]["nz"], Property::Double(expected.z));
    }

    #[test]
    fn test_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/meshes/head.ply");
        PlyMeshWriter::new().write(&path, &tetrahedron()).unwrap();
        assert_eq!(read_back(&path).payload["vertex"].len(), 4);
    }
}
