//! Incremental 3D convex hull.
//!
//! Starts from the most spread-out tetrahedron, then inserts the remaining
//! points one at a time: faces a point can see are removed and the hole is
//! closed by fanning the horizon edges to the new point. Points within the
//! tolerance of the current hull are treated as interior.

use std::collections::HashSet;

use nalgebra::{Point3, Vector3};

use crate::shared::error::ReconstructionError;

/// Relative tolerance, scaled by the bounding-box diagonal.
const RELATIVE_EPSILON: f64 = 1e-10;

#[derive(Clone, Debug)]
struct Face {
    vertices: [usize; 3],
    /// Unit outward normal.
    normal: Vector3<f64>,
    offset: f64,
}

impl Face {
    fn new(points: &[Point3<f64>], a: usize, b: usize, c: usize) -> Self {
        let n = (points[b] - points[a]).cross(&(points[c] - points[a]));
        let len = n.norm();
        let normal = if len > 0.0 { n / len } else { n };
        Self {
            vertices: [a, b, c],
            normal,
            offset: normal.dot(&points[a].coords),
        }
    }

    /// Face through `a, b, c`, wound so that `interior` is on its negative side.
    fn facing_away(points: &[Point3<f64>], a: usize, b: usize, c: usize, interior: &Point3<f64>) -> Self {
        let face = Self::new(points, a, b, c);
        if face.signed_distance(interior) > 0.0 {
            Self::new(points, a, c, b)
        } else {
            face
        }
    }

    fn signed_distance(&self, p: &Point3<f64>) -> f64 {
        self.normal.dot(&p.coords) - self.offset
    }

    fn edges(&self) -> [(usize, usize); 3] {
        let [a, b, c] = self.vertices;
        [(a, b), (b, c), (c, a)]
    }
}

/// Outward-wound hull triangles as index triples into `points`.
///
/// Fails with [`ReconstructionError::DegenerateGeometry`] unless the input
/// contains at least four affinely independent points.
pub fn convex_hull(points: &[Point3<f64>]) -> Result<Vec<[usize; 3]>, ReconstructionError> {
    if points.len() < 4 {
        return Err(ReconstructionError::DegenerateGeometry(format!(
            "convex hull needs at least 4 points, got {}",
            points.len()
        )));
    }

    let eps = tolerance(points);
    let [i0, i1, i2, i3] = initial_simplex(points, eps)?;
    let interior = Point3::from(
        (points[i0].coords + points[i1].coords + points[i2].coords + points[i3].coords) / 4.0,
    );

    let mut faces = vec![
        Face::facing_away(points, i0, i1, i2, &interior),
        Face::facing_away(points, i0, i1, i3, &interior),
        Face::facing_away(points, i0, i2, i3, &interior),
        Face::facing_away(points, i1, i2, i3, &interior),
    ];

    for (i, p) in points.iter().enumerate() {
        if i == i0 || i == i1 || i == i2 || i == i3 {
            continue;
        }

        let visible: Vec<bool> = faces.iter().map(|f| f.signed_distance(p) > eps).collect();
        if !visible.contains(&true) {
            continue;
        }

        let visible_edges: HashSet<(usize, usize)> = faces
            .iter()
            .zip(&visible)
            .filter(|(_, &v)| v)
            .flat_map(|(f, _)| f.edges())
            .collect();
        let horizon: Vec<(usize, usize)> = faces
            .iter()
            .zip(&visible)
            .filter(|(_, &v)| v)
            .flat_map(|(f, _)| f.edges())
            .filter(|&(a, b)| !visible_edges.contains(&(b, a)))
            .collect();

        let mut keep = visible.iter().map(|v| !v);
        faces.retain(|_| keep.next().unwrap_or(true));
        faces.extend(horizon.into_iter().map(|(a, b)| Face::new(points, a, b, i)));
    }

    Ok(faces.into_iter().map(|f| f.vertices).collect())
}

fn tolerance(points: &[Point3<f64>]) -> f64 {
    let first = points[0].coords;
    let (lo, hi) = points.iter().fold((first, first), |(lo, hi), p| {
        (lo.inf(&p.coords), hi.sup(&p.coords))
    });
    (hi - lo).norm() * RELATIVE_EPSILON
}

/// Picks four points spanning a tetrahedron of non-negligible volume.
fn initial_simplex(points: &[Point3<f64>], eps: f64) -> Result<[usize; 4], ReconstructionError> {
    let degenerate = |what: &str| {
        ReconstructionError::DegenerateGeometry(format!("all points are {what}"))
    };

    let i0 = argmax(points, |p| -p.x);
    let i1 = argmax(points, |p| (p - points[i0]).norm());
    if (points[i1] - points[i0]).norm() <= eps {
        return Err(degenerate("coincident"));
    }

    let axis = (points[i1] - points[i0]).normalize();
    let line_distance = |p: &Point3<f64>| (p - points[i0]).cross(&axis).norm();
    let i2 = argmax(points, &line_distance);
    if line_distance(&points[i2]) <= eps {
        return Err(degenerate("collinear"));
    }

    let base = Face::new(points, i0, i1, i2);
    let i3 = argmax(points, |p| base.signed_distance(p).abs());
    if base.signed_distance(&points[i3]).abs() <= eps {
        return Err(degenerate("coplanar"));
    }

    Ok([i0, i1, i2, i3])
}

fn argmax(points: &[Point3<f64>], key: impl Fn(&Point3<f64>) -> f64) -> usize {
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (i, p) in points.iter().enumerate() {
        let value = key(p);
        if value > best_value {
            best = i;
            best_value = value;
        }
    }
    best
}
