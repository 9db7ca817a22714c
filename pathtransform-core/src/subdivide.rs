/// Path subdivision: inserting transformed points along source segments
use nalgebra::{Point2, Point3};

use crate::config::{CROSSING_EPS, MAX_BISECTION_DEPTH};
use crate::mesh::TriangleMesh;

/// Strategy used by `transform` to insert points along a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubdivisionMode {
    /// One point wherever the source segment crosses a triangle edge, so the
    /// output is exact within every traversed triangle
    #[default]
    EdgeCrossings,
    /// Recursive midpoint bisection down to a line distance, dropping
    /// midpoints that are nearly collinear with their neighbours
    Bisection,
}

/// Segment parameters in `(0, 1)` where `start -> end` crosses an edge of a
/// usable triangle, sorted and with near duplicates merged.
pub fn edge_crossings(mesh: &TriangleMesh, start: &Point2<f64>, end: &Point2<f64>) -> Vec<f64> {
    let mut crossings: Vec<f64> = mesh
        .transformations()
        .iter()
        .filter(|t| t.is_usable())
        .flat_map(|t| t.edges())
        .filter_map(|(p, q)| segment_intersection(start, end, &p, &q))
        .filter(|&t| t > CROSSING_EPS && t < 1.0 - CROSSING_EPS)
        .collect();
    crossings.sort_by(f64::total_cmp);
    crossings.dedup_by(|a, b| (*a - *b).abs() < CROSSING_EPS);
    crossings
}

/// Parameter along `a -> b` where it meets the segment `p -> q`, if it does.
/// Parallel and collinear segments report no intersection.
fn segment_intersection(
    a: &Point2<f64>,
    b: &Point2<f64>,
    p: &Point2<f64>,
    q: &Point2<f64>,
) -> Option<f64> {
    let d = b - a;
    let e = q - p;
    let denom = d.perp(&e);
    if denom.abs() <= f64::EPSILON * d.norm() * e.norm() {
        return None;
    }

    let ap = p - a;
    let t = ap.perp(&e) / denom;
    let u = ap.perp(&d) / denom;
    if (0.0..=1.0).contains(&t) && (-CROSSING_EPS..=1.0 + CROSSING_EPS).contains(&u) {
        Some(t)
    } else {
        None
    }
}

/// Transform `points` inserting a point at every triangle edge crossing.
/// `map` is the single point transform; z is interpolated along the segment.
pub fn subdivide_at_crossings<F>(mesh: &TriangleMesh, points: &[Point3<f64>], map: F) -> Vec<Point3<f64>>
where
    F: Fn(&Point3<f64>) -> Point3<f64>,
{
    let mut out = Vec::with_capacity(points.len());
    let Some(first) = points.first() else {
        return out;
    };
    out.push(map(first));

    for segment in points.windows(2) {
        let (start, end) = (&segment[0], &segment[1]);
        for t in edge_crossings(mesh, &start.xy(), &end.xy()) {
            let crossing = Point3::from(start.coords.lerp(&end.coords, t));
            out.push(map(&crossing));
        }
        out.push(map(end));
    }
    out
}

/// Recursive midpoint bisection.
///
/// A segment longer than `line_distance` is split at its midpoint and both
/// halves are processed; afterwards the midpoint is removed again when the
/// transformed triangle it spans with its neighbours is smaller than
/// `min_area_with_neighbors`. Input points are never removed. Splitting stops
/// after `MAX_BISECTION_DEPTH` levels, whatever the segment length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bisection {
    pub line_distance: f64,
    pub min_area_with_neighbors: f64,
}

impl Bisection {
    pub fn new(line_distance: f64, min_area_with_neighbors: f64) -> Self {
        Self {
            line_distance,
            min_area_with_neighbors,
        }
    }

    pub fn run<F>(&self, points: &[Point3<f64>], map: F) -> Vec<Point3<f64>>
    where
        F: Fn(&Point3<f64>) -> Point3<f64>,
    {
        let mut out = Vec::with_capacity(points.len());
        let Some(first) = points.first() else {
            return out;
        };
        out.push(map(first));

        for segment in points.windows(2) {
            let end = map(&segment[1]);
            self.subdivide(&mut out, &segment[0], &segment[1], end, &map, 0);
        }
        out
    }

    /// Expects the transformed `start` to be the last point of `out`; pushes
    /// the inserted points and finally `transformed_end`.
    fn subdivide<F>(
        &self,
        out: &mut Vec<Point3<f64>>,
        start: &Point3<f64>,
        end: &Point3<f64>,
        transformed_end: Point3<f64>,
        map: &F,
        depth: u32,
    ) where
        F: Fn(&Point3<f64>) -> Point3<f64>,
    {
        if depth >= MAX_BISECTION_DEPTH || (end - start).norm() <= self.line_distance {
            out.push(transformed_end);
            return;
        }

        let mid = Point3::from(start.coords.lerp(&end.coords, 0.5));
        let transformed_mid = map(&mid);
        self.subdivide(out, start, &mid, transformed_mid, map, depth + 1);
        let mid_index = out.len() - 1;
        self.subdivide(out, &mid, end, transformed_end, map, depth + 1);

        let before = out[mid_index - 1];
        let after = out[mid_index + 1];
        let area = 0.5 * (after.xy() - before.xy()).perp(&(transformed_mid.xy() - before.xy())).abs();
        if area < self.min_area_with_neighbors {
            out.remove(mid_index);
        }
    }
}
