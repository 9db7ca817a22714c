/// Error types for transform construction and path access
use thiserror::Error;

use crate::transform::TransformKind;

/// Errors reported by the engine.
///
/// Geometric edge cases (points outside the mesh, degenerate triangles among
/// usable ones) are never errors; they are resolved by the locator's fallback.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    /// The representation string could not be decoded into a transform.
    #[error("invalid representation: {reason}")]
    InvalidRepresentation { reason: String },

    /// Control points and triangles do not form a usable mesh.
    #[error("invalid mesh: {reason}")]
    InvalidMesh { reason: String },

    /// Fitting a transform needs more matched points than were given.
    #[error("{kind} needs at least {needed} matched points, got {got}")]
    InsufficientPoints {
        kind: TransformKind,
        needed: usize,
        got: usize,
    },

    /// A path was read past its end.
    #[error("point index {index} out of range for a path of {len} points")]
    IndexOutOfRange { index: usize, len: usize },
}

impl TransformError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidRepresentation {
            reason: reason.into(),
        }
    }

    pub(crate) fn mesh(reason: impl Into<String>) -> Self {
        Self::InvalidMesh {
            reason: reason.into(),
        }
    }

    /// Mesh problems found while decoding a representation are reported as
    /// representation failures.
    pub(crate) fn into_representation_error(self) -> Self {
        match self {
            Self::InvalidMesh { reason } => Self::InvalidRepresentation { reason },
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransformError>;
