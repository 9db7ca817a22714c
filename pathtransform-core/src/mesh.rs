/// Triangulated correspondence between source and destination control points
use nalgebra::{Matrix2x3, Point2, Vector3};

use crate::config::MIN_TRIANGLE_AREA;
use crate::error::{Result, TransformError};
use crate::geometry::MatchedPoint;
use crate::locator::{self, FallbackPolicy};

/// Source and destination control points, in engine units
#[derive(Debug, Clone, PartialEq)]
pub struct ControlPoints {
    pub source: Vec<Point2<f64>>,
    pub destination: Vec<Point2<f64>>,
}

impl ControlPoints {
    pub fn new(source: Vec<Point2<f64>>, destination: Vec<Point2<f64>>) -> Self {
        Self {
            source,
            destination,
        }
    }

    pub fn from_matched(points: &[MatchedPoint]) -> Self {
        Self {
            source: points.iter().map(|m| m.source).collect(),
            destination: points.iter().map(|m| m.measured).collect(),
        }
    }
}

/// Indices of a triangle's corners on the source and on the destination side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triangle {
    pub source: [u32; 3],
    pub destination: [u32; 3],
}

impl Triangle {
    pub fn new(source: [u32; 3], destination: [u32; 3]) -> Self {
        Self {
            source,
            destination,
        }
    }

    /// A triangle whose corners use the same index on both sides
    pub fn shared(indices: [u32; 3]) -> Self {
        Self::new(indices, indices)
    }
}

/// Per-triangle affine map, precomputed once at construction
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleTransformation {
    vertices: [Point2<f64>; 3],
    /// Twice the signed source area; the denominator of every barycentric weight
    signed_double_area: f64,
    /// Barycentric weights to destination cartesian coordinates
    to_destination: Matrix2x3<f64>,
}

impl TriangleTransformation {
    pub fn new(source: [Point2<f64>; 3], destination: [Point2<f64>; 3]) -> Self {
        let [s0, s1, s2] = source;
        let [d0, d1, d2] = destination;
        Self {
            vertices: source,
            signed_double_area: (s1 - s0).perp(&(s2 - s0)),
            to_destination: Matrix2x3::new(
                d0.x, d1.x, d2.x,
                d0.y, d1.y, d2.y,
            ),
        }
    }

    pub fn area(&self) -> f64 {
        0.5 * self.signed_double_area.abs()
    }

    /// Whether the triangle is large enough for stable barycentric coordinates
    pub fn is_usable(&self) -> bool {
        self.area() > MIN_TRIANGLE_AREA
    }

    pub fn vertices(&self) -> &[Point2<f64>; 3] {
        &self.vertices
    }

    /// Barycentric coordinates of `point` by area ratios.
    ///
    /// Exact at the corners: a corner gets the weight vector `(1, 0, 0)` and
    /// permutations thereof, without rounding.
    pub fn barycentric(&self, point: &Point2<f64>) -> Vector3<f64> {
        let [a, b, c] = self.vertices;
        let d = self.signed_double_area;
        Vector3::new(
            (b - point).perp(&(c - point)) / d,
            (c - point).perp(&(a - point)) / d,
            (a - point).perp(&(b - point)) / d,
        )
    }

    /// Destination point for the given barycentric weights
    pub fn apply(&self, barycentric: &Vector3<f64>) -> Point2<f64> {
        Point2::from(self.to_destination * barycentric)
    }

    /// Source edges as `(start, end)` pairs, opposite corners 0, 1 and 2
    pub fn edges(&self) -> [(Point2<f64>, Point2<f64>); 3] {
        let [a, b, c] = self.vertices;
        [(b, c), (a, c), (a, b)]
    }

    /// Smallest distance from `point` to any of the source edges
    pub fn distance_to_edges(&self, point: &Point2<f64>) -> f64 {
        self.edges()
            .iter()
            .map(|(start, end)| distance_to_segment(point, start, end))
            .fold(f64::INFINITY, f64::min)
    }
}

fn distance_to_segment(point: &Point2<f64>, start: &Point2<f64>, end: &Point2<f64>) -> f64 {
    let direction = end - start;
    let length = direction.norm();
    let offset = point - start;
    if length <= f64::EPSILON {
        return offset.norm();
    }
    let along = offset.dot(&direction) / length;
    if along < 0.0 {
        offset.norm()
    } else if along > length {
        (point - end).norm()
    } else {
        (offset - direction * (along / length)).norm()
    }
}

/// The mesh model: control points, triangles and their affine maps.
///
/// Built once and immutable afterwards, so it can be evaluated from many
/// threads at once.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleMesh {
    controls: ControlPoints,
    triangles: Vec<Triangle>,
    transformations: Vec<TriangleTransformation>,
}

impl TriangleMesh {
    /// Validate the triangles against the control points and precompute the
    /// per-triangle maps. Fails when any index is out of range, a triangle
    /// repeats a corner, or no triangle has a usable area.
    pub fn new(controls: ControlPoints, triangles: Vec<Triangle>) -> Result<Self> {
        for (i, triangle) in triangles.iter().enumerate() {
            check_corners(i, "source", &triangle.source, controls.source.len())?;
            check_corners(
                i,
                "destination",
                &triangle.destination,
                controls.destination.len(),
            )?;
        }

        let transformations: Vec<TriangleTransformation> = triangles
            .iter()
            .map(|t| {
                TriangleTransformation::new(
                    t.source.map(|i| controls.source[i as usize]),
                    t.destination.map(|i| controls.destination[i as usize]),
                )
            })
            .collect();

        let usable = transformations.iter().filter(|t| t.is_usable()).count();
        if usable == 0 {
            return Err(TransformError::mesh(format!(
                "none of the {} triangles has an area above {}",
                triangles.len(),
                MIN_TRIANGLE_AREA
            )));
        }
        if usable < transformations.len() {
            log::debug!(
                "skipping {} degenerate triangles",
                transformations.len() - usable
            );
        }

        Ok(Self {
            controls,
            triangles,
            transformations,
        })
    }

    /// Build a mesh from matched points and a flat index list where every
    /// three indices form one triangle shared by both sides
    pub fn from_shared_topology(points: &[MatchedPoint], indices: &[u32]) -> Result<Self> {
        if indices.len() % 3 != 0 {
            return Err(TransformError::mesh(format!(
                "index count {} is not a multiple of 3",
                indices.len()
            )));
        }
        let triangles = indices
            .chunks_exact(3)
            .map(|c| Triangle::shared([c[0], c[1], c[2]]))
            .collect();
        Self::new(ControlPoints::from_matched(points), triangles)
    }

    pub fn controls(&self) -> &ControlPoints {
        &self.controls
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn transformations(&self) -> &[TriangleTransformation] {
        &self.transformations
    }

    /// Map a source point to the destination through the located triangle
    pub fn evaluate(&self, point: &Point2<f64>, fallback: FallbackPolicy) -> Point2<f64> {
        match locator::locate(self, point, fallback) {
            Some(location) => {
                self.transformations[location.triangle].apply(&location.barycentric)
            }
            None => *point,
        }
    }
}

fn check_corners(triangle: usize, side: &str, corners: &[u32; 3], len: usize) -> Result<()> {
    if let Some(&index) = corners.iter().find(|&&i| i as usize >= len) {
        return Err(TransformError::mesh(format!(
            "triangle {triangle}: {side} index {index} out of range for {len} points"
        )));
    }
    let [a, b, c] = *corners;
    if a == b || b == c || a == c {
        return Err(TransformError::mesh(format!(
            "triangle {triangle}: {side} indices {a}, {b}, {c} are not distinct"
        )));
    }
    Ok(())
}
