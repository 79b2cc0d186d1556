use nalgebra::Point3;

use crate::mesh::domain::mesh::Mesh;
use crate::reconstruction::domain::convex_hull::convex_hull;
use crate::reconstruction::domain::delaunay::delaunay_2d;
use crate::shared::error::ReconstructionError;

/// Surface construction strategy, selected by pipeline path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceStrategy {
    /// Closed hull around a (completed) multi-frame point cloud.
    ConvexHull,
    /// Open sheet over a single aligned landmark set, triangulated in x/y.
    PlanarDelaunay,
}

/// Builds a triangle mesh from a 3D point set.
///
/// Concave features (eye sockets, nostrils) vanish under the convex hull;
/// that smoothing is accepted, not corrected.
#[derive(Clone, Debug)]
pub struct SurfaceBuilder {
    strategy: SurfaceStrategy,
}

impl SurfaceBuilder {
    pub fn new(strategy: SurfaceStrategy) -> Self {
        Self { strategy }
    }

    pub fn build(&self, points: &[Point3<f64>]) -> Result<Mesh, ReconstructionError> {
        match self.strategy {
            SurfaceStrategy::ConvexHull => build_hull(points),
            SurfaceStrategy::PlanarDelaunay => build_planar(points),
        }
    }
}

/// Only hull points become vertices, kept in input order.
fn build_hull(points: &[Point3<f64>]) -> Result<Mesh, ReconstructionError> {
    let faces = convex_hull(points)?;

    let mut remap = vec![usize::MAX; points.len()];
    for &i in faces.iter().flatten() {
        remap[i] = 0;
    }
    let mut vertices = Vec::new();
    for (i, slot) in remap.iter_mut().enumerate() {
        if *slot == 0 {
            *slot = vertices.len();
            vertices.push(points[i]);
        }
    }

    let triangles = faces.into_iter().map(|f| f.map(|i| remap[i])).collect();
    log::debug!(
        "Convex hull kept {} of {} points",
        vertices.len(),
        points.len()
    );
    Mesh::new(vertices, triangles)
}

/// Every input point stays a vertex so landmark indices survive into the mesh.
fn build_planar(points: &[Point3<f64>]) -> Result<Mesh, ReconstructionError> {
    let projected: Vec<(f64, f64)> = points.iter().map(|p| (p.x, p.y)).collect();
    let triangles = delaunay_2d(&projected)?;
    Mesh::new(points.to_vec(), triangles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_cloud(n: usize, seed: u64) -> Vec<Point3<f64>> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| Point3::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), rng.gen_range(-0.5..0.5)))
            .collect()
    }

    #[test]
    fn test_hull_vertices_are_input_points() {
        let pts = random_cloud(400, 8);
        let mesh = SurfaceBuilder::new(SurfaceStrategy::ConvexHull).build(&pts).unwrap();
        assert!(mesh.vertex_count() < pts.len());
        for v in mesh.vertices() {
            assert!(pts.contains(v));
        }
    }

    #[test]
    fn test_hull_vertices_keep_input_order() {
        let pts = random_cloud(200, 1);
        let mesh = SurfaceBuilder::new(SurfaceStrategy::ConvexHull).build(&pts).unwrap();
        let positions: Vec<usize> = mesh
            .vertices()
            .iter()
            .map(|v| pts.iter().position(|p| p == v).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_hull_indices_in_range_and_every_vertex_used() {
        let pts = random_cloud(300, 21);
        let mesh = SurfaceBuilder::new(SurfaceStrategy::ConvexHull).build(&pts).unwrap();
        let mut used = vec![false; mesh.vertex_count()];
        for &[a, b, c] in mesh.triangles() {
            assert!(a < mesh.vertex_count() && b < mesh.vertex_count() && c < mesh.vertex_count());
            used[a] = true;
            used[b] = true;
            used[c] = true;
        }
        assert!(used.into_iter().all(|u| u));
        assert_eq!(mesh.vertex_normals().len(), mesh.vertex_count());
    }

    #[test]
    fn test_hull_rejects_three_points() {
        let pts = random_cloud(3, 0);
        assert!(matches!(
            SurfaceBuilder::new(SurfaceStrategy::ConvexHull).build(&pts),
            Err(ReconstructionError::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn test_hull_rejects_flat_cloud() {
        let pts: Vec<_> = random_cloud(50, 3).into_iter().map(|p| Point3::new(p.x, p.y, 0.0)).collect();
        assert!(matches!(
            SurfaceBuilder::new(SurfaceStrategy::ConvexHull).build(&pts),
            Err(ReconstructionError::DegenerateGeometry(_))
        ));
    }

    #[test]
    fn test_planar_keeps_all_vertices() {
        let pts = random_cloud(60, 12);
        let mesh = SurfaceBuilder::new(SurfaceStrategy::PlanarDelaunay).build(&pts).unwrap();
        assert_eq!(mesh.vertices(), &pts[..]);
        assert!(mesh.triangle_count() > 0);
    }

    #[test]
    fn test_planar_lifts_onto_3d_points() {
        let pts = vec![
            Point3::new(0.0, 0.0, 0.3),
            Point3::new(2.0, 0.0, -0.1),
            Point3::new(0.0, 2.0, 0.2),
        ];
        let mesh = SurfaceBuilder::new(SurfaceStrategy::PlanarDelaunay).build(&pts).unwrap();
        assert_eq!(mesh.triangle_count(), 1);
        assert_eq!(mesh.vertices()[1].z, -0.1);
    }

    #[test]
    fn test_planar_rejects_collinear_projection() {
        // Distinct in 3D, collinear once z is dropped.
        let pts = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 5.0),
            Point3::new(2.0, 2.0, -5.0),
        ];
        assert!(matches!(
            SurfaceBuilder::new(SurfaceStrategy::PlanarDelaunay).build(&pts),
            Err(ReconstructionError::DegenerateGeometry(_))
        ));
    }
}
