/// Delaunay triangulation of control points (Bowyer–Watson)
use nalgebra::Point2;
use robust::{incircle, orient2d, Coord};

/// How far the enclosing triangle reaches beyond the bounding box, in
/// multiples of its larger side
const SUPER_TRIANGLE_SCALE: f64 = 20.0;

fn coord(p: &Point2<f64>) -> Coord<f64> {
    Coord { x: p.x, y: p.y }
}

fn in_circumcircle(vertices: &[Point2<f64>], triangle: &[usize; 3], p: &Point2<f64>) -> bool {
    let [a, b, c] = triangle.map(|i| coord(&vertices[i]));
    incircle(a, b, c, coord(p)) > 0.0
}

/// Triangulate `points`, returning counter-clockwise index triples into it.
///
/// Points closer than `distance_eps` to an already inserted point are
/// skipped. Fewer than three distinct points, or points that are all
/// collinear, give no triangles.
pub fn delaunay(points: &[Point2<f64>], distance_eps: f64) -> Vec<u32> {
    let n = points.len();
    if n < 3 {
        return Vec::new();
    }

    let (min, max) = points.iter().fold(
        (Point2::new(f64::MAX, f64::MAX), Point2::new(f64::MIN, f64::MIN)),
        |(lo, hi), p| (lo.inf(p), hi.sup(p)),
    );
    let delta = (max - min).max().max(1.0);
    let mid = nalgebra::center(&min, &max);
    let reach = SUPER_TRIANGLE_SCALE * delta;

    let mut vertices = points.to_vec();
    vertices.extend([
        Point2::new(mid.x - reach, mid.y - delta),
        Point2::new(mid.x + reach, mid.y - delta),
        Point2::new(mid.x, mid.y + reach),
    ]);
    let mut triangles: Vec<[usize; 3]> = vec![[n, n + 1, n + 2]];
    let mut inserted: Vec<usize> = Vec::with_capacity(n);

    for (i, p) in points.iter().enumerate() {
        if inserted.iter().any(|&j| (points[j] - p).norm() <= distance_eps) {
            log::trace!("skipping control point {i} at {p}, too close to another");
            continue;
        }

        let (bad, kept): (Vec<[usize; 3]>, Vec<[usize; 3]>) = triangles
            .into_iter()
            .partition(|t| in_circumcircle(&vertices, t, p));

        // Cavity boundary: edges of removed triangles not shared with another
        let edges: Vec<(usize, usize)> = bad
            .iter()
            .flat_map(|&[a, b, c]| [(a, b), (b, c), (c, a)])
            .collect();
        triangles = kept;
        for &(u, v) in &edges {
            if !edges.contains(&(v, u)) {
                triangles.push([u, v, i]);
            }
        }
        inserted.push(i);
    }

    triangles
        .into_iter()
        .filter(|t| t.iter().all(|&v| v < n))
        .filter(|&[a, b, c]| orient2d(coord(&vertices[a]), coord(&vertices[b]), coord(&vertices[c])) > 0.0)
        .flat_map(|t| t.map(|v| v as u32))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triples(indices: &[u32]) -> Vec<[usize; 3]> {
        indices
            .chunks(3)
            .map(|c| [c[0] as usize, c[1] as usize, c[2] as usize])
            .collect()
    }

    #[test]
    fn test_square_gives_two_triangles() {
        let points = [
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
        ];
        let indices = delaunay(&points, 1e-4);
        assert_eq!(indices.len(), 6);
        for [a, b, c] in triples(&indices) {
            let o = orient2d(coord(&points[a]), coord(&points[b]), coord(&points[c]));
            assert!(o > 0.0);
        }
    }

    #[test]
    fn test_empty_circumcircles() {
        let points = [
            Point2::new(0.0, 0.0),
            Point2::new(7.0, 1.0),
            Point2::new(3.0, 5.0),
            Point2::new(9.0, 8.0),
            Point2::new(1.0, 9.0),
            Point2::new(5.0, 3.0),
        ];
        let triangles = triples(&delaunay(&points, 1e-4));
        assert!(!triangles.is_empty());
        for t in &triangles {
            for (i, p) in points.iter().enumerate() {
                if !t.contains(&i) {
                    assert!(!in_circumcircle(&points, t, p), "{i} inside {t:?}");
                }
            }
        }
    }

    #[test]
    fn test_near_duplicates_are_skipped() {
        let points = [
            Point2::new(0.0, 0.0),
            Point2::new(0.00001, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(0.0, 10.0),
        ];
        let indices = delaunay(&points, 1e-4);
        assert_eq!(indices.len(), 3);
        assert!(!indices.contains(&1));
    }

    #[test]
    fn test_degenerate_inputs_give_nothing() {
        assert!(delaunay(&[Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)], 1e-4).is_empty());
        let collinear = [Point2::new(0.0, 0.0), Point2::new(1.0, 1.0), Point2::new(2.0, 2.0)];
        assert!(delaunay(&collinear, 1e-4).is_empty());
    }
}
