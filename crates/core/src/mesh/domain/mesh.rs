use nalgebra::{Point3, Vector3};

use crate::shared::error::ReconstructionError;

/// Indexed triangle mesh with derived per-vertex normals.
///
/// Every triangle references three distinct, in-bounds vertices. The mesh is
/// not required to be watertight or manifold.
#[derive(Clone, Debug, PartialEq)]
pub struct Mesh {
    vertices: Vec<Point3<f64>>,
    triangles: Vec<[usize; 3]>,
    normals: Vec<Vector3<f64>>,
}

impl Mesh {
    /// Validates the triangle indices and computes vertex normals.
    pub fn new(
        vertices: Vec<Point3<f64>>,
        triangles: Vec<[usize; 3]>,
    ) -> Result<Self, ReconstructionError> {
        for (t, &[a, b, c]) in triangles.iter().enumerate() {
            if a == b || b == c || a == c {
                return Err(ReconstructionError::DegenerateGeometry(format!(
                    "triangle {t} repeats a vertex: [{a}, {b}, {c}]"
                )));
            }
            if a.max(b).max(c) >= vertices.len() {
                return Err(ReconstructionError::DegenerateGeometry(format!(
                    "triangle {t} references a vertex beyond {}",
                    vertices.len()
                )));
            }
        }
        let normals = vertex_normals(&vertices, &triangles);
        Ok(Self {
            vertices,
            triangles,
            normals,
        })
    }

    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// Unit normals, one per vertex; zero for vertices no triangle touches.
    pub fn vertex_normals(&self) -> &[Vector3<f64>] {
        &self.normals
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}

/// Area-weighted average of incident face normals.
///
/// The unnormalized cross product of a triangle's edges has length twice its
/// area, so summing those weights each face by area.
fn vertex_normals(vertices: &[Point3<f64>], triangles: &[[usize; 3]]) -> Vec<Vector3<f64>> {
    let mut normals = vec![Vector3::zeros(); vertices.len()];
    for &[a, b, c] in triangles {
        let face = (vertices[b] - vertices[a]).cross(&(vertices[c] - vertices[a]));
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }
    for n in &mut normals {
        *n = n.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::zeros);
    }
    normals
}
