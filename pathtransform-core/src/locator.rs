/// Finds the source triangle responsible for a query point
use nalgebra::{Point2, Vector3};

use crate::config::BARYCENTRIC_EPS;
use crate::mesh::TriangleMesh;

/// How a point outside every triangle picks the triangle that extrapolates it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Triangle whose most negative barycentric weight is closest to zero
    #[default]
    LeastViolation,
    /// Triangle with the smallest distance from the point to one of its edges
    NearestEdge,
}

/// Result of a locate query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    /// Index into the mesh's triangle list
    pub triangle: usize,
    pub barycentric: Vector3<f64>,
    /// False when the triangle was chosen by the fallback policy
    pub inside: bool,
}

pub fn is_inside(barycentric: &Vector3<f64>) -> bool {
    barycentric.iter().all(|&w| w >= -BARYCENTRIC_EPS)
}

/// Locate `point` in the mesh.
///
/// Scans the usable triangles in construction order and returns the first one
/// containing the point. Points outside every triangle get the best triangle
/// under `fallback`; ties keep the earlier triangle. Returns `None` only for a
/// mesh without usable triangles.
pub fn locate(mesh: &TriangleMesh, point: &Point2<f64>, fallback: FallbackPolicy) -> Option<Location> {
    let mut best: Option<(f64, Location)> = None;

    for (i, t) in mesh.transformations().iter().enumerate() {
        if !t.is_usable() {
            continue;
        }
        let barycentric = t.barycentric(point);
        if is_inside(&barycentric) {
            return Some(Location {
                triangle: i,
                barycentric,
                inside: true,
            });
        }

        let score = match fallback {
            FallbackPolicy::LeastViolation => -barycentric.min(),
            FallbackPolicy::NearestEdge => t.distance_to_edges(point),
        };
        if best.as_ref().map_or(true, |(s, _)| score < *s) {
            best = Some((
                score,
                Location {
                    triangle: i,
                    barycentric,
                    inside: false,
                },
            ));
        }
    }

    if let Some((score, location)) = &best {
        log::trace!(
            "point ({}, {}) outside mesh, extrapolating from triangle {} (score {score})",
            point.x,
            point.y,
            location.triangle
        );
    }
    best.map(|(_, location)| location)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{ControlPoints, Triangle};

    /// Two triangles sharing the diagonal of the unit-10 square, plus a tiny
    /// sliver that must never be picked
    fn mesh() -> TriangleMesh {
        let source = vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
            Point2::new(5.0, 5.0 + 1e-7),
        ];
        TriangleMesh::new(
            ControlPoints::new(source.clone(), source),
            vec![
                Triangle::shared([0, 2, 4]),
                Triangle::shared([0, 1, 2]),
                Triangle::shared([0, 2, 3]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_locates_enclosing_triangle() {
        let mesh = mesh();
        let location = locate(&mesh, &Point2::new(8.0, 1.0), FallbackPolicy::default()).unwrap();
        assert_eq!(location.triangle, 1);
        assert!(location.inside);

        let location = locate(&mesh, &Point2::new(1.0, 8.0), FallbackPolicy::default()).unwrap();
        assert_eq!(location.triangle, 2);
    }

    #[test]
    fn test_shared_edge_goes_to_first_triangle() {
        let mesh = mesh();
        let location = locate(&mesh, &Point2::new(3.0, 3.0), FallbackPolicy::default()).unwrap();
        assert_eq!(location.triangle, 1);
        assert!(location.inside);
    }

    #[test]
    fn test_degenerate_triangle_is_skipped() {
        let mesh = mesh();
        assert!(!mesh.transformations()[0].is_usable());
        let location = locate(&mesh, &Point2::new(5.0, 5.0), FallbackPolicy::default()).unwrap();
        assert_ne!(location.triangle, 0);
    }

    #[test]
    fn test_least_violation_fallback() {
        let mesh = mesh();
        // Just right of the square: only triangle 1 is violated by a small amount
        let location = locate(&mesh, &Point2::new(11.0, 5.0), FallbackPolicy::LeastViolation).unwrap();
        assert_eq!(location.triangle, 1);
        assert!(!location.inside);
    }

    #[test]
    fn test_nearest_edge_fallback() {
        let mesh = mesh();
        let location = locate(&mesh, &Point2::new(-1.0, 6.0), FallbackPolicy::NearestEdge).unwrap();
        assert_eq!(location.triangle, 2);
        assert!(!location.inside);
    }

    #[test]
    fn test_fallback_is_deterministic() {
        let mesh = mesh();
        let query = Point2::new(-50.0, 70.0);
        let first = locate(&mesh, &query, FallbackPolicy::default());
        for _ in 0..10 {
            assert_eq!(locate(&mesh, &query, FallbackPolicy::default()), first);
        }
    }
}
