/// Piecewise-affine transform over a triangulated mesh of control points
use nalgebra::{Point2, Point3};

use crate::config::TransformOptions;
use crate::error::{Result, TransformError};
use crate::geometry::{MatchedPoint, Path};
use crate::locator::FallbackPolicy;
use crate::mesh::TriangleMesh;
use crate::representation::{self, Record, RepresentationWriter, TriangulatedRecord};
use crate::subdivide::{self, Bisection, SubdivisionMode};
use crate::transform::{PathTransform, TransformKind};
use crate::triangulate;

/// Maps every point through the affine map of the source triangle that
/// contains it (or extrapolates from the best triangle when none does).
///
/// The mesh is decoded once and never changes, so a transform can be shared
/// between threads and evaluated concurrently.
#[derive(Debug, Clone, PartialEq)]
pub struct TriangulatedPathTransform {
    mesh: TriangleMesh,
    line_distance: f64,
    min_area_with_neighbors: f64,
    subdivision: SubdivisionMode,
    fallback: FallbackPolicy,
}

impl TriangulatedPathTransform {
    pub fn new(mesh: TriangleMesh, line_distance: f64, min_area_with_neighbors: f64) -> Result<Self> {
        if !(line_distance > 0.0 && line_distance.is_finite()) {
            return Err(TransformError::mesh(format!(
                "line distance must be positive, got {line_distance}"
            )));
        }
        // The representation pairs control points and shares one index list
        let controls = mesh.controls();
        if controls.source.len() != controls.destination.len() {
            return Err(TransformError::mesh(format!(
                "{} source control points but {} destination control points",
                controls.source.len(),
                controls.destination.len()
            )));
        }
        if let Some(i) = mesh.triangles().iter().position(|t| t.source != t.destination) {
            return Err(TransformError::mesh(format!(
                "triangle {i} uses different source and destination corners"
            )));
        }
        Ok(Self {
            mesh,
            line_distance,
            min_area_with_neighbors,
            subdivision: SubdivisionMode::default(),
            fallback: FallbackPolicy::default(),
        })
    }

    /// Decode a `TriangulatedPathTransform` representation
    pub fn from_representation(representation: &str) -> Result<Self> {
        match representation::parse(representation)? {
            Record::Triangulated(record) => {
                Self::from_record(record).map_err(TransformError::into_representation_error)
            }
            other => Err(other.mismatch(TransformKind::Triangulated)),
        }
    }

    pub fn from_record(record: TriangulatedRecord) -> Result<Self> {
        let mesh = TriangleMesh::from_shared_topology(&record.points, &record.indices)?;
        let transform = Self::new(mesh, record.line_distance, record.min_area_with_neighbors)?;
        log::debug!(
            "triangulated transform with {} control points and {} triangles",
            record.points.len(),
            transform.mesh.triangles().len()
        );
        Ok(transform)
    }

    /// Triangulate the source points and map each triangle onto the measured
    /// points. Needs at least three matched points that are not all collinear.
    pub fn from_matched_points(points: &[MatchedPoint], options: &TransformOptions) -> Result<Self> {
        if points.len() < 3 {
            return Err(TransformError::InsufficientPoints {
                kind: TransformKind::Triangulated,
                needed: 3,
                got: points.len(),
            });
        }
        let mut sorted = points.to_vec();
        sorted.sort_by(|a, b| a.source.x.total_cmp(&b.source.x));

        let sources: Vec<Point2<f64>> = sorted.iter().map(|m| m.source).collect();
        let indices = triangulate::delaunay(&sources, options.distance_eps);
        let mesh = TriangleMesh::from_shared_topology(&sorted, &indices)?;
        Ok(Self::new(mesh, options.line_distance, options.min_area_with_neighbors)?
            .with_subdivision(options.subdivision)
            .with_fallback(options.fallback))
    }

    pub fn with_subdivision(mut self, subdivision: SubdivisionMode) -> Self {
        self.subdivision = subdivision;
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn mesh(&self) -> &TriangleMesh {
        &self.mesh
    }

    pub fn line_distance(&self) -> f64 {
        self.line_distance
    }

    pub fn min_area_with_neighbors(&self) -> f64 {
        self.min_area_with_neighbors
    }

    pub fn subdivision(&self) -> SubdivisionMode {
        self.subdivision
    }

    pub fn fallback(&self) -> FallbackPolicy {
        self.fallback
    }
}

impl PathTransform for TriangulatedPathTransform {
    fn kind(&self) -> TransformKind {
        TransformKind::Triangulated
    }

    fn to_representation(&self) -> String {
        let controls = self.mesh.controls();
        let mut writer = RepresentationWriter::new(self.kind());
        writer
            .scalar(self.line_distance)
            .scalar(self.min_area_with_neighbors)
            .count(controls.source.len());
        for (source, destination) in controls.source.iter().zip(&controls.destination) {
            writer.vector(source.x, source.y).vector(destination.x, destination.y);
        }
        // The format carries a single topology shared by both sides
        writer.count(self.mesh.triangles().len() * 3);
        for triangle in self.mesh.triangles() {
            for index in triangle.source {
                writer.count(index as usize);
            }
        }
        writer.finish()
    }

    fn map_point(&self, point: &Point3<f64>) -> Point3<f64> {
        let mapped = self.mesh.evaluate(&point.xy(), self.fallback);
        Point3::new(mapped.x, mapped.y, point.z)
    }

    fn transform(&self, path: &Path) -> Path {
        let points = path.engine_points();
        let map = |p: &Point3<f64>| self.map_point(p);
        let transformed = match self.subdivision {
            SubdivisionMode::EdgeCrossings => subdivide::subdivide_at_crossings(&self.mesh, points, map),
            SubdivisionMode::Bisection => {
                Bisection::new(self.line_distance, self.min_area_with_neighbors).run(points, map)
            }
        };
        log::debug!(
            "subdivided {} points into {} ({:?})",
            points.len(),
            transformed.len(),
            self.subdivision
        );
        Path::from(transformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use approx::assert_abs_diff_eq;

    /// Unit-10 square stretched to twice its width
    const SQUARE: &str = "TriangulatedPathTransform,2,10,4,0,0,0,0,10,0,20,0,10,10,20,10,0,10,0,10,6,0,1,2,0,2,3";

    #[test]
    fn test_interpolation_is_exact_at_control_points() {
        let transform = TriangulatedPathTransform::from_representation(SQUARE).unwrap();
        let controls = transform.mesh().controls().clone();
        for (source, destination) in controls.source.iter().zip(&controls.destination) {
            let mapped = transform.map_point(&Point3::new(source.x, source.y, 0.0));
            assert_eq!(mapped.xy(), *destination);
        }
    }

    #[test]
    fn test_z_passes_through() {
        let transform = TriangulatedPathTransform::from_representation(SQUARE).unwrap();
        let mapped = transform.transform_single(Point::new(5000, 1000, 123));
        assert_eq!(mapped.z, 123);
    }

    #[test]
    fn test_seam_is_continuous_along_shared_edge() {
        let transform = TriangulatedPathTransform::from_representation(SQUARE).unwrap();
        let on_edge = transform.map_point(&Point3::new(4.0, 4.0, 0.0));
        assert_abs_diff_eq!(on_edge.x, 8.0, epsilon = 1e-9);
        assert_abs_diff_eq!(on_edge.y, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_representation_round_trip() {
        let transform = TriangulatedPathTransform::from_representation(SQUARE).unwrap();
        let written = transform.to_representation();
        assert_eq!(written, SQUARE);
        assert_eq!(TriangulatedPathTransform::from_representation(&written).unwrap(), transform);
    }

    #[test]
    fn test_rejects_other_kinds_and_bad_meshes() {
        assert!(TriangulatedPathTransform::from_representation("PathTranslation,1,1").is_err());
        let out_of_range = SQUARE.replace(",6,0,1,2,0,2,3", ",3,0,1,9");
        assert!(matches!(
            TriangulatedPathTransform::from_representation(&out_of_range),
            Err(TransformError::InvalidRepresentation { .. })
        ));
        let zero_line = SQUARE.replacen(",2,10,", ",0,10,", 1);
        assert!(TriangulatedPathTransform::from_representation(&zero_line).is_err());
    }

    #[test]
    fn test_rejects_meshes_the_format_cannot_carry() {
        use crate::mesh::{ControlPoints, Triangle};

        let source = vec![Point2::new(0.0, 0.0), Point2::new(10.0, 0.0), Point2::new(0.0, 10.0)];
        let destination = vec![Point2::new(0.0, 20.0), Point2::new(10.0, 0.0), Point2::new(0.0, 0.0)];

        let crossed = TriangleMesh::new(
            ControlPoints::new(source.clone(), destination.clone()),
            vec![Triangle::new([0, 1, 2], [2, 1, 0])],
        )
        .unwrap();
        assert!(matches!(
            TriangulatedPathTransform::new(crossed, 2.0, 10.0),
            Err(TransformError::InvalidMesh { .. })
        ));

        let mut longer = source.clone();
        longer.push(Point2::new(5.0, 5.0));
        let uneven = TriangleMesh::new(
            ControlPoints::new(longer, destination.clone()),
            vec![Triangle::shared([0, 1, 2])],
        )
        .unwrap();
        assert!(matches!(
            TriangulatedPathTransform::new(uneven, 2.0, 10.0),
            Err(TransformError::InvalidMesh { .. })
        ));

        let shared = TriangleMesh::new(
            ControlPoints::new(source, destination),
            vec![Triangle::shared([0, 1, 2])],
        )
        .unwrap();
        let transform = TriangulatedPathTransform::new(shared, 2.0, 10.0).unwrap();
        let reparsed = TriangulatedPathTransform::from_representation(&transform.to_representation()).unwrap();
        assert_eq!(reparsed, transform);
        let origin = Point3::new(0.0, 0.0, 0.0);
        assert_eq!(reparsed.map_point(&origin), transform.map_point(&origin));
    }

    #[test]
    fn test_bisection_mode_keeps_endpoints() {
        let transform = TriangulatedPathTransform::from_representation(SQUARE)
            .unwrap()
            .with_subdivision(SubdivisionMode::Bisection);
        let path: Path = [Point::new(0, 5000, 0), Point::new(10000, 5000, 0)]
            .into_iter()
            .collect();
        let out = transform.transform(&path);
        assert!(out.len() >= 2);
        assert_eq!(out.get(0), Some(Point::new(0, 5000, 0)));
        assert_eq!(out.get(out.len() - 1), Some(Point::new(20000, 5000, 0)));
    }

    #[test]
    fn test_from_matched_points_needs_three() {
        let points = [
            MatchedPoint::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)),
            MatchedPoint::new(Point2::new(1.0, 0.0), Point2::new(2.0, 1.0)),
        ];
        assert_eq!(
            TriangulatedPathTransform::from_matched_points(&points, &TransformOptions::default()),
            Err(TransformError::InsufficientPoints {
                kind: TransformKind::Triangulated,
                needed: 3,
                got: 2,
            })
        );
    }

    #[test]
    fn test_from_matched_points_interpolates_measurements() {
        let points = [
            MatchedPoint::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)),
            MatchedPoint::new(Point2::new(10.0, 0.0), Point2::new(11.0, 1.0)),
            MatchedPoint::new(Point2::new(10.0, 10.0), Point2::new(11.0, 11.0)),
            MatchedPoint::new(Point2::new(0.0, 10.0), Point2::new(1.0, 11.0)),
        ];
        let transform =
            TriangulatedPathTransform::from_matched_points(&points, &TransformOptions::default()).unwrap();
        assert_eq!(transform.mesh().triangles().len(), 2);
        for m in &points {
            let mapped = transform.map_point(&Point3::new(m.source.x, m.source.y, 0.0));
            assert_eq!(mapped.xy(), m.measured);
        }
        let inside = transform.map_point(&Point3::new(3.0, 7.0, 0.0));
        assert_abs_diff_eq!(inside.x, 4.0, epsilon = 1e-9);
        assert_abs_diff_eq!(inside.y, 8.0, epsilon = 1e-9);
    }
}
