/// PathTransform Core Library - Triangulated path transforms
/// 
/// This library provides the stateless core for transforming 3D integer paths:
/// representation string parsing, point location in a triangle mesh,
/// piecewise-affine evaluation and path subdivision, plus the whole-plane
/// transforms used when too few control points are available.

pub mod config;
pub mod error;
pub mod factory;
pub mod geometry;
pub mod locator;
pub mod mesh;
pub mod representation;
pub mod rigid;
pub mod subdivide;
pub mod transform;
pub mod triangulate;
pub mod triangulated;

// Re-export commonly used types
pub use config::TransformOptions;
pub use error::{Result, TransformError};
pub use factory::create_path_transform;
pub use geometry::{MatchedPoint, Path, Point};
pub use locator::FallbackPolicy;
pub use mesh::TriangleMesh;
pub use rigid::{PathTranslation, PathTranslationAndRotation, PathTranslationRotationAndScale};
pub use subdivide::SubdivisionMode;
pub use transform::{parse_path_transform, AnyPathTransform, PathTransform, TransformKind};
pub use triangulated::TriangulatedPathTransform;
