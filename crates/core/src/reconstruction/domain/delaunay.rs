//! Bowyer-Watson Delaunay triangulation of a planar point set.
//!
//! The triangulation is seeded with one real triangle and three ghost cells
//! that join each hull edge to a single vertex at infinity. A ghost cell's
//! circumcircle is the open half-plane outside its hull edge plus the open
//! edge itself.

use std::collections::{HashMap, HashSet};

use crate::shared::error::ReconstructionError;

/// Relative tolerance for collinearity and circumcircle tests.
const RELATIVE_EPSILON: f64 = 1e-12;

/// Index standing in for the vertex at infinity.
const INFINITE: usize = usize::MAX;

#[derive(Clone, Copy, Debug)]
enum Cell {
    /// Counter-clockwise.
    Finite([usize; 3]),
    /// Outside of the hull edge `u -> v`; the hull lies to the right.
    Ghost { u: usize, v: usize },
}

impl Cell {
    /// Builds the cell closing the directed cavity edge `a -> b` at `p`.
    fn close(points: &[(f64, f64)], a: usize, b: usize, p: usize) -> Option<Self> {
        if a == INFINITE {
            return Some(Cell::Ghost { u: b, v: p });
        }
        if b == INFINITE {
            return Some(Cell::Ghost { u: p, v: a });
        }
        let o = orient(points[a], points[b], points[p]);
        if o > 0.0 {
            Some(Cell::Finite([a, b, p]))
        } else if o < 0.0 {
            Some(Cell::Finite([a, p, b]))
        } else {
            None
        }
    }

    fn conflicts_with(&self, points: &[(f64, f64)], p: (f64, f64), tolerance: f64) -> bool {
        match *self {
            Cell::Finite([a, b, c]) => in_circle(points[a], points[b], points[c], p) > tolerance,
            Cell::Ghost { u, v } => {
                let (pu, pv) = (points[u], points[v]);
                let o = orient(pu, pv, p);
                o > 0.0 || (o == 0.0 && strictly_between(pu, pv, p))
            }
        }
    }

    fn edges(&self) -> [(usize, usize); 3] {
        match *self {
            Cell::Finite([a, b, c]) => [(a, b), (b, c), (c, a)],
            Cell::Ghost { u, v } => [(u, v), (v, INFINITE), (INFINITE, u)],
        }
    }
}

/// Delaunay triangles as counter-clockwise index triples into `points`.
///
/// The triangles tile the convex hull of the distinct input points. Exact
/// duplicate points are collapsed onto their first occurrence, so a
/// duplicate's index never appears in the output. Fails with
/// [`ReconstructionError::DegenerateGeometry`] when fewer than three
/// non-collinear points remain.
pub fn delaunay_2d(points: &[(f64, f64)]) -> Result<Vec<[usize; 3]>, ReconstructionError> {
    let unique = dedup(points);
    if unique.len() < 3 {
        return Err(ReconstructionError::DegenerateGeometry(format!(
            "triangulation needs 3 distinct points, got {}",
            unique.len()
        )));
    }

    let local: Vec<(f64, f64)> = unique.iter().map(|&i| points[i]).collect();
    let extent = bounding_extent(&local);
    let Some([a, b, c]) = seed_triangle(&local, extent) else {
        return Err(ReconstructionError::DegenerateGeometry(
            "all points are collinear".into(),
        ));
    };
    let tolerance = extent.powi(4) * RELATIVE_EPSILON;

    let mut cells = vec![
        Cell::Finite([a, b, c]),
        Cell::Ghost { u: b, v: a },
        Cell::Ghost { u: c, v: b },
        Cell::Ghost { u: a, v: c },
    ];

    for i in (0..local.len()).filter(|i| ![a, b, c].contains(i)) {
        let p = local[i];
        let (bad, good): (Vec<Cell>, Vec<Cell>) = cells
            .into_iter()
            .partition(|cell| cell.conflicts_with(&local, p, tolerance));
        cells = good;
        if bad.is_empty() {
            log::trace!("Delaunay: point {i} fell on existing circumcircles, skipped");
            continue;
        }

        let mut edge_count: HashMap<(usize, usize), usize> = HashMap::new();
        for cell in &bad {
            for (u, v) in cell.edges() {
                *edge_count.entry((u.min(v), u.max(v))).or_default() += 1;
            }
        }
        for cell in &bad {
            for (u, v) in cell.edges() {
                if edge_count[&(u.min(v), u.max(v))] != 1 {
                    continue;
                }
                match Cell::close(&local, u, v, i) {
                    Some(new_cell) => cells.push(new_cell),
                    None => log::trace!("Delaunay: point {i} is collinear with edge ({u}, {v})"),
                }
            }
        }
    }

    let result: Vec<[usize; 3]> = cells
        .iter()
        .filter_map(|cell| match cell {
            Cell::Finite(vertices) => Some(vertices.map(|v| unique[v])),
            Cell::Ghost { .. } => None,
        })
        .collect();

    if result.is_empty() {
        return Err(ReconstructionError::DegenerateGeometry(
            "triangulation produced no triangles".into(),
        ));
    }
    Ok(result)
}

/// Indices of the first occurrence of each distinct point.
fn dedup(points: &[(f64, f64)]) -> Vec<usize> {
    let mut seen = HashSet::new();
    points
        .iter()
        .enumerate()
        .filter(|(_, &(x, y))| seen.insert(((x + 0.0).to_bits(), (y + 0.0).to_bits())))
        .map(|(i, _)| i)
        .collect()
}

fn bounds(points: &[(f64, f64)]) -> (f64, f64, f64, f64) {
    points.iter().fold(
        (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        |(x0, y0, x1, y1), &(x, y)| (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
    )
}

fn bounding_extent(points: &[(f64, f64)]) -> f64 {
    let (x0, y0, x1, y1) = bounds(points);
    (x1 - x0).max(y1 - y0)
}

/// A counter-clockwise triangle spanning the point set: the first point, the
/// point farthest from it, and the point farthest from the line through both.
fn seed_triangle(points: &[(f64, f64)], extent: f64) -> Option<[usize; 3]> {
    let a = 0;
    let pa = points[a];
    let b = (0..points.len()).max_by(|&p, &q| {
        distance_sq(pa, points[p]).total_cmp(&distance_sq(pa, points[q]))
    })?;
    let c = (0..points.len()).max_by(|&p, &q| {
        orient(pa, points[b], points[p])
            .abs()
            .total_cmp(&orient(pa, points[b], points[q]).abs())
    })?;

    let o = orient(pa, points[b], points[c]);
    if o.abs() <= extent * extent * RELATIVE_EPSILON {
        return None;
    }
    Some(if o > 0.0 { [a, b, c] } else { [a, c, b] })
}

fn distance_sq(p: (f64, f64), q: (f64, f64)) -> f64 {
    (p.0 - q.0).powi(2) + (p.1 - q.1).powi(2)
}

/// Twice the signed area of `abc`; positive when counter-clockwise.
fn orient(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
    (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
}

/// Positive when `p` lies inside the circumcircle of counter-clockwise `abc`.
fn in_circle(a: (f64, f64), b: (f64, f64), c: (f64, f64), p: (f64, f64)) -> f64 {
    let (adx, ady) = (a.0 - p.0, a.1 - p.1);
    let (bdx, bdy) = (b.0 - p.0, b.1 - p.1);
    let (cdx, cdy) = (c.0 - p.0, c.1 - p.1);
    (adx * adx + ady * ady) * (bdx * cdy - cdx * bdy)
        + (bdx * bdx + bdy * bdy) * (cdx * ady - adx * cdy)
        + (cdx * cdx + cdy * cdy) * (adx * bdy - bdx * ady)
}

/// `p` is on the open segment `uv`, given that the three are collinear.
fn strictly_between(u: (f64, f64), v: (f64, f64), p: (f64, f64)) -> bool {
    let along_u = (p.0 - u.0) * (v.0 - u.0) + (p.1 - u.1) * (v.1 - u.1);
    let along_v = (p.0 - v.0) * (u.0 - v.0) + (p.1 - v.1) * (u.1 - v.1);
    along_u > 0.0 && along_v > 0.0
}
