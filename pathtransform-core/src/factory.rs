/// Fitting transforms to matched point sets
use crate::config::TransformOptions;
use crate::error::{Result, TransformError};
use crate::geometry::MatchedPoint;
use crate::rigid::{PathTranslation, PathTranslationAndRotation, PathTranslationRotationAndScale};
use crate::transform::{AnyPathTransform, PathTransform, TransformKind};
use crate::triangulated::TriangulatedPathTransform;

/// Fit a transform of `kind` to matched source/measured points.
///
/// A triangulated transform needs at least three points spanning a
/// triangle; with fewer, or with collinear points, the closest whole-plane
/// fit (translation, rotation and scale) is returned instead.
pub fn create_path_transform(
    kind: TransformKind,
    points: &[MatchedPoint],
    options: &TransformOptions,
) -> Result<AnyPathTransform> {
    let scaled = || {
        AnyPathTransform::TranslationRotationAndScale(PathTranslationRotationAndScale::from_matched_points(
            points,
            options.scale_eps,
        ))
    };

    let transform = match kind {
        TransformKind::Translation => AnyPathTransform::Translation(PathTranslation::from_matched_points(points)),
        TransformKind::TranslationAndRotation => {
            AnyPathTransform::TranslationAndRotation(PathTranslationAndRotation::from_matched_points(points))
        }
        TransformKind::TranslationRotationAndScale => scaled(),
        TransformKind::Triangulated => match TriangulatedPathTransform::from_matched_points(points, options) {
            Ok(t) => AnyPathTransform::Triangulated(t),
            Err(err @ (TransformError::InsufficientPoints { .. } | TransformError::InvalidMesh { .. })) => {
                log::warn!("{err}; falling back to {}", TransformKind::TranslationRotationAndScale);
                scaled()
            }
            Err(err) => return Err(err),
        },
    };
    log::debug!("fitted {} to {} matched points", transform.kind(), points.len());
    Ok(transform)
}
