/// Whole-plane transforms: translation, rotation and scale.
///
/// Orientations are stored as half-angle unit complex numbers
/// (`cos(a/2) + i sin(a/2)`), which is what the representation strings carry.
/// Squaring one gives the rotation by `a`; a number and its negation describe
/// the same rotation.
use nalgebra::{Complex, Matrix2, Matrix3, Point2, Point3, Vector2, Vector3};

use crate::geometry::MatchedPoint;
use crate::representation::RepresentationWriter;
use crate::transform::{PathTransform, TransformKind};

/// Below this dot product slerp switches to lerp
const SLERP_THRESHOLD: f64 = 0.05;

fn identity_orientation() -> Complex<f64> {
    Complex::new(1.0, 0.0)
}

/// Half-angle orientation of a direction vector
pub fn orientation_of(direction: &Vector2<f64>) -> Complex<f64> {
    let half = direction.y.atan2(direction.x) / 2.0;
    Complex::new(half.cos(), half.sin())
}

pub fn inverse_orientation(orientation: &Complex<f64>) -> Complex<f64> {
    Complex::new(-orientation.re, orientation.im)
}

pub fn rotation_matrix(orientation: &Complex<f64>) -> Matrix2<f64> {
    let full = orientation * orientation;
    Matrix2::new(
        full.re, -full.im,
        full.im, full.re,
    )
}

fn normalized(orientation: Complex<f64>) -> Complex<f64> {
    let length = orientation.re.hypot(orientation.im);
    if length > 0.0 {
        orientation / length
    } else {
        identity_orientation()
    }
}

/// Spherical interpolation between two orientations, `time` in `[0, 1]`
pub fn slerp(start: Complex<f64>, end: Complex<f64>, time: f64) -> Complex<f64> {
    let mut start = start;
    let mut d = (start.re * end.re + start.im * end.im).clamp(-1.0, 1.0);
    if d < 0.0 {
        // interpolate on the same side
        start = -start;
        d = -d;
    }
    let blended = if d <= 1.0 - SLERP_THRESHOLD {
        let theta = d.acos();
        let inv_sin = 1.0 / theta.sin();
        start * ((theta * (1.0 - time)).sin() * inv_sin) + end * ((theta * time).sin() * inv_sin)
    } else {
        start * (1.0 - time) + end * time
    };
    normalized(blended)
}

fn homogeneous(rotation: &Matrix2<f64>, translation: &Vector2<f64>) -> Matrix3<f64> {
    Matrix3::new(
        rotation[(0, 0)], rotation[(0, 1)], translation.x,
        rotation[(1, 0)], rotation[(1, 1)], translation.y,
        0.0, 0.0, 1.0,
    )
}

fn apply(matrix: &Matrix3<f64>, point: &Point3<f64>) -> Point3<f64> {
    let v = matrix * Vector3::new(point.x, point.y, 1.0);
    Point3::new(v.x, v.y, point.z)
}

/// Shifts every point by a fixed offset
#[derive(Debug, Clone, PartialEq)]
pub struct PathTranslation {
    offset: Vector2<f64>,
}

impl PathTranslation {
    pub fn new(offset: Vector2<f64>) -> Self {
        Self { offset }
    }

    /// Mean offset between source and measured points; zero without points
    pub fn from_matched_points(points: &[MatchedPoint]) -> Self {
        if points.is_empty() {
            return Self::new(Vector2::zeros());
        }
        let sum: Vector2<f64> = points.iter().map(|m| m.measured - m.source).sum();
        Self::new(sum / points.len() as f64)
    }

    pub fn offset(&self) -> &Vector2<f64> {
        &self.offset
    }
}

impl PathTransform for PathTranslation {
    fn kind(&self) -> TransformKind {
        TransformKind::Translation
    }

    fn to_representation(&self) -> String {
        RepresentationWriter::new(self.kind())
            .vector(self.offset.x, self.offset.y)
            .finish()
    }

    fn map_point(&self, point: &Point3<f64>) -> Point3<f64> {
        Point3::new(point.x + self.offset.x, point.y + self.offset.y, point.z)
    }
}

/// Rigid motion: rotation followed by translation
#[derive(Debug, Clone, PartialEq)]
pub struct PathTranslationAndRotation {
    translation: Vector2<f64>,
    orientation: Complex<f64>,
    homogeneous: Matrix3<f64>,
}

impl PathTranslationAndRotation {
    pub fn new(translation: Vector2<f64>, orientation: Complex<f64>) -> Self {
        Self {
            homogeneous: homogeneous(&rotation_matrix(&orientation), &translation),
            translation,
            orientation,
        }
    }

    pub fn identity() -> Self {
        Self::new(Vector2::zeros(), identity_orientation())
    }

    /// Fit from matched points.
    ///
    /// Starts from the offset of the first point, then folds in one estimate
    /// per point pair: the rotation taking the source direction onto the
    /// measured direction, and the translation that maps the pair's source
    /// midpoint onto its measured midpoint. Estimates are averaged with
    /// equal weight (lerp for translation, slerp for orientation).
    pub fn from_matched_points(points: &[MatchedPoint]) -> Self {
        let Some(first) = points.first() else {
            return Self::identity();
        };
        let mut translation = first.measured - first.source;
        let mut orientation = identity_orientation();
        let mut used = 0u32;

        for (i, b) in points.iter().enumerate().skip(1) {
            for a in &points[..i] {
                used += 1;
                let (pair_translation, pair_orientation) = pair_estimate(a, b);
                let time = 1.0 / used as f64;
                translation = translation.lerp(&pair_translation, time);
                orientation = slerp(orientation, pair_orientation, time);
            }
        }
        Self::new(translation, orientation)
    }

    pub fn translation(&self) -> &Vector2<f64> {
        &self.translation
    }

    pub fn orientation(&self) -> &Complex<f64> {
        &self.orientation
    }

    /// Rotation angle in radians
    pub fn angle(&self) -> f64 {
        let full = self.orientation * self.orientation;
        full.im.atan2(full.re)
    }

    pub fn homogeneous(&self) -> &Matrix3<f64> {
        &self.homogeneous
    }

    /// The inverse motion as a homogeneous matrix
    fn inverse_homogeneous(&self) -> Matrix3<f64> {
        let inverse = inverse_orientation(&self.orientation);
        let rotation = rotation_matrix(&inverse);
        homogeneous(&rotation, &-(rotation * self.translation))
    }

    fn write_fields(&self, writer: &mut RepresentationWriter) {
        writer
            .vector(self.translation.x, self.translation.y)
            .vector(self.orientation.re, self.orientation.im);
    }
}

fn pair_estimate(a: &MatchedPoint, b: &MatchedPoint) -> (Vector2<f64>, Complex<f64>) {
    let source = orientation_of(&(b.source - a.source));
    let measured = orientation_of(&(b.measured - a.measured));
    let rotation = measured * inverse_orientation(&source);

    let source_center = a.source.coords.lerp(&b.source.coords, 0.5);
    let measured_center = a.measured.coords.lerp(&b.measured.coords, 0.5);
    let translation = measured_center - rotation_matrix(&rotation) * source_center;
    (translation, rotation)
}

impl PathTransform for PathTranslationAndRotation {
    fn kind(&self) -> TransformKind {
        TransformKind::TranslationAndRotation
    }

    fn to_representation(&self) -> String {
        let mut writer = RepresentationWriter::new(self.kind());
        self.write_fields(&mut writer);
        writer.finish()
    }

    fn map_point(&self, point: &Point3<f64>) -> Point3<f64> {
        apply(&self.homogeneous, point)
    }
}

/// Rigid motion applied after a per-axis scale about a centre of mass
#[derive(Debug, Clone, PartialEq)]
pub struct PathTranslationRotationAndScale {
    rigid: PathTranslationAndRotation,
    scale: Vector2<f64>,
    center_of_mass: Point2<f64>,
    homogeneous: Matrix3<f64>,
}

impl PathTranslationRotationAndScale {
    pub fn new(rigid: PathTranslationAndRotation, scale: Vector2<f64>, center_of_mass: Point2<f64>) -> Self {
        let c = center_of_mass;
        let scaling = Matrix3::new(
            scale.x, 0.0, c.x - scale.x * c.x,
            0.0, scale.y, c.y - scale.y * c.y,
            0.0, 0.0, 1.0,
        );
        Self {
            homogeneous: rigid.homogeneous() * scaling,
            rigid,
            scale,
            center_of_mass,
        }
    }

    /// Fit the rigid part first, pull the measured points back through its
    /// inverse and average the per-axis ratios of their spread around the
    /// source centre of mass. Axes where a source point lies within
    /// `scale_eps` of the centre keep the running estimate.
    pub fn from_matched_points(points: &[MatchedPoint], scale_eps: f64) -> Self {
        let rigid = PathTranslationAndRotation::from_matched_points(points);
        if points.is_empty() {
            return Self::new(rigid, Vector2::new(1.0, 1.0), Point2::origin());
        }

        let inverse = rigid.inverse_homogeneous();
        let center_of_mass = Point2::from(
            points.iter().map(|m| m.source.coords).sum::<Vector2<f64>>() / points.len() as f64,
        );

        let mut scale = Vector2::new(1.0, 1.0);
        for (i, m) in points.iter().enumerate() {
            let pulled = inverse * Vector3::new(m.measured.x, m.measured.y, 1.0);
            let s = m.source - center_of_mass;
            let p = pulled.xy() - center_of_mass.coords;
            let candidate = Vector2::new(
                if s.x.abs() > scale_eps { p.x / s.x } else { scale.x },
                if s.y.abs() > scale_eps { p.y / s.y } else { scale.y },
            );
            scale = scale.lerp(&candidate, 1.0 / (i + 1) as f64);
        }
        Self::new(rigid, scale, center_of_mass)
    }

    pub fn rigid(&self) -> &PathTranslationAndRotation {
        &self.rigid
    }

    pub fn scale(&self) -> &Vector2<f64> {
        &self.scale
    }

    pub fn center_of_mass(&self) -> &Point2<f64> {
        &self.center_of_mass
    }
}

impl PathTransform for PathTranslationRotationAndScale {
    fn kind(&self) -> TransformKind {
        TransformKind::TranslationRotationAndScale
    }

    fn to_representation(&self) -> String {
        let mut writer = RepresentationWriter::new(self.kind());
        self.rigid.write_fields(&mut writer);
        writer
            .vector(self.scale.x, self.scale.y)
            .vector(self.center_of_mass.x, self.center_of_mass.y);
        writer.finish()
    }

    fn map_point(&self, point: &Point3<f64>) -> Point3<f64> {
        apply(&self.homogeneous, point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::parse_path_transform;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    fn matched(sx: f64, sy: f64, mx: f64, my: f64) -> MatchedPoint {
        MatchedPoint::new(Point2::new(sx, sy), Point2::new(mx, my))
    }

    #[test]
    fn test_orientation_squares_to_direction() {
        let orientation = orientation_of(&Vector2::new(0.0, 3.0));
        let rotation = rotation_matrix(&orientation);
        let turned = rotation * Vector2::new(1.0, 0.0);
        assert_abs_diff_eq!(turned.x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(turned.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_inverse_orientation_undoes_rotation() {
        let orientation = orientation_of(&Vector2::new(1.0, 2.0));
        let product = rotation_matrix(&orientation) * rotation_matrix(&inverse_orientation(&orientation));
        assert_abs_diff_eq!((product - Matrix2::identity()).norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_slerp_endpoints() {
        let a = orientation_of(&Vector2::new(1.0, 0.0));
        let b = orientation_of(&Vector2::new(0.0, 1.0));
        let start = slerp(a, b, 0.0);
        let end = slerp(a, b, 1.0);
        assert_abs_diff_eq!(start.re, a.re, epsilon = 1e-12);
        assert_abs_diff_eq!(end.im, b.im, epsilon = 1e-12);
        let half = slerp(a, b, 0.5);
        assert_abs_diff_eq!(half.re.hypot(half.im), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_translation_fit_is_mean_offset() {
        let t = PathTranslation::from_matched_points(&[
            matched(0.0, 0.0, 1.0, 2.0),
            matched(5.0, 5.0, 8.0, 9.0),
        ]);
        assert_eq!(*t.offset(), Vector2::new(2.0, 3.0));
        assert_eq!(*PathTranslation::from_matched_points(&[]).offset(), Vector2::zeros());
    }

    #[test]
    fn test_rotation_fit_recovers_quarter_turn() {
        // Rotate by 90 degrees, then shift by (5, 0)
        let t = PathTranslationAndRotation::from_matched_points(&[
            matched(0.0, 0.0, 5.0, 0.0),
            matched(1.0, 0.0, 5.0, 1.0),
            matched(0.0, 1.0, 4.0, 0.0),
        ]);
        assert_abs_diff_eq!(t.angle(), FRAC_PI_2, epsilon = 1e-9);
        let mapped = t.map_point(&Point3::new(2.0, 3.0, 7.0));
        assert_abs_diff_eq!(mapped.x, 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(mapped.y, 2.0, epsilon = 1e-9);
        assert_eq!(mapped.z, 7.0);
    }

    #[test]
    fn test_scale_fit_recovers_uniform_scale() {
        let points: Vec<MatchedPoint> = [(0.0, 0.0), (2.0, 0.0), (0.0, 2.0), (2.0, 2.0)]
            .into_iter()
            .map(|(x, y)| matched(x, y, 2.0 * x + 1.0, 2.0 * y + 1.0))
            .collect();
        let t = PathTranslationRotationAndScale::from_matched_points(&points, 0.1);
        assert_abs_diff_eq!(t.scale().x, 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(t.scale().y, 2.0, epsilon = 1e-9);
        assert_eq!(*t.center_of_mass(), Point2::new(1.0, 1.0));

        let mapped = t.map_point(&Point3::new(0.5, 1.5, 0.0));
        assert_abs_diff_eq!(mapped.x, 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(mapped.y, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_representation_round_trips() {
        let rigid = PathTranslationAndRotation::new(Vector2::new(1.5, -2.0), orientation_of(&Vector2::new(1.0, 1.0)));
        let scaled = PathTranslationRotationAndScale::new(rigid.clone(), Vector2::new(2.0, 0.5), Point2::new(3.0, 4.0));

        for representation in [rigid.to_representation(), scaled.to_representation()] {
            let parsed = parse_path_transform(&representation).unwrap();
            assert_eq!(parsed.to_representation(), representation);
            let probe = Point3::new(10.0, -3.0, 1.0);
            let expected = if parsed.kind() == TransformKind::TranslationAndRotation {
                rigid.map_point(&probe)
            } else {
                scaled.map_point(&probe)
            };
            assert_eq!(parsed.map_point(&probe), expected);
        }
    }

    #[test]
    fn test_scale_applies_about_center_of_mass() {
        let t = PathTranslationRotationAndScale::new(
            PathTranslationAndRotation::identity(),
            Vector2::new(2.0, 3.0),
            Point2::new(1.0, 1.0),
        );
        assert_eq!(t.map_point(&Point3::new(1.0, 1.0, 0.0)), Point3::new(1.0, 1.0, 0.0));
        assert_eq!(t.map_point(&Point3::new(2.0, 2.0, 0.0)), Point3::new(3.0, 4.0, 0.0));
    }
}
