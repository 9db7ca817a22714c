/// Tolerances, unit conversion and runtime options shared by all transforms
use crate::locator::FallbackPolicy;
use crate::subdivide::SubdivisionMode;

/// Boundary integers are micro-units of the engine unit
pub const UNIT_SCALE: f64 = 1000.0;

/// Triangles with a smaller source area are skipped by the locator
pub const MIN_TRIANGLE_AREA: f64 = 0.00001;

/// Barycentric weights down to `-BARYCENTRIC_EPS` still count as inside
pub const BARYCENTRIC_EPS: f64 = 1e-9;

/// Segment parameters closer than this are treated as the same crossing
pub const CROSSING_EPS: f64 = 1e-9;

/// Bisection never splits a single input segment deeper than this, so one
/// segment yields at most `2^MAX_BISECTION_DEPTH + 1` points
pub const MAX_BISECTION_DEPTH: u32 = 16;

pub const DEFAULT_LINE_DISTANCE: f64 = 2.0;
pub const DEFAULT_MIN_AREA_WITH_NEIGHBORS: f64 = 10.0;

/// Two source points closer than this are the same control point
pub const DEFAULT_DISTANCE_EPS: f64 = 0.0001;

/// Source spread below which an axis does not contribute to scale fitting
pub const DEFAULT_SCALE_EPS: f64 = 0.1;

/// Options used when building a transform from matched points or when
/// overriding the behaviour of a parsed one
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformOptions {
    pub subdivision: SubdivisionMode,
    pub fallback: FallbackPolicy,
    /// Source distance after which bisection inserts a midpoint
    pub line_distance: f64,
    /// Area of the transformed triangle below which a bisection midpoint is dropped
    pub min_area_with_neighbors: f64,
    pub distance_eps: f64,
    pub scale_eps: f64,
}

impl TransformOptions {
    pub fn new() -> Self {
        Self {
            subdivision: SubdivisionMode::default(),
            fallback: FallbackPolicy::default(),
            line_distance: DEFAULT_LINE_DISTANCE,
            min_area_with_neighbors: DEFAULT_MIN_AREA_WITH_NEIGHBORS,
            distance_eps: DEFAULT_DISTANCE_EPS,
            scale_eps: DEFAULT_SCALE_EPS,
        }
    }

    pub fn with_subdivision(mut self, subdivision: SubdivisionMode) -> Self {
        self.subdivision = subdivision;
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self::new()
    }
}
