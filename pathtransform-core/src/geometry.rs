/// Points, paths and matched point pairs
use nalgebra::{Point2, Point3};

use crate::config::UNIT_SCALE;
use crate::error::{Result, TransformError};

/// A path point as seen at the boundary, in integer micro-units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl Point {
    pub fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }

    /// Convert to engine units
    pub fn to_engine(self) -> Point3<f64> {
        Point3::new(
            self.x as f64 / UNIT_SCALE,
            self.y as f64 / UNIT_SCALE,
            self.z as f64 / UNIT_SCALE,
        )
    }

    /// Convert from engine units, rounding to the nearest micro-unit
    pub fn from_engine(point: &Point3<f64>) -> Self {
        Self {
            x: (point.x * UNIT_SCALE).round() as i64,
            y: (point.y * UNIT_SCALE).round() as i64,
            z: (point.z * UNIT_SCALE).round() as i64,
        }
    }
}

impl From<(i64, i64, i64)> for Point {
    fn from((x, y, z): (i64, i64, i64)) -> Self {
        Self::new(x, y, z)
    }
}

/// An ordered poly-line of points.
///
/// Points are kept in engine units so repeated transforms do not accumulate
/// rounding; the boundary accessors convert on the way in and out. The point
/// count only changes through [`Path::push_back`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    points: Vec<Point3<f64>>,
}

impl Path {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
        }
    }

    pub fn push_back(&mut self, point: Point) {
        self.points.push(point.to_engine());
    }

    pub fn push_engine(&mut self, point: Point3<f64>) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.points.capacity()
    }

    pub fn get(&self, index: usize) -> Option<Point> {
        self.points.get(index).map(Point::from_engine)
    }

    /// Like [`Path::get`] but reports the path length on failure
    pub fn point(&self, index: usize) -> Result<Point> {
        self.get(index).ok_or(TransformError::IndexOutOfRange {
            index,
            len: self.points.len(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Point> + '_ {
        self.points.iter().map(Point::from_engine)
    }

    pub fn engine_points(&self) -> &[Point3<f64>] {
        &self.points
    }

    /// Mutable view of the coordinates; the slice cannot change the point count
    pub fn engine_points_mut(&mut self) -> &mut [Point3<f64>] {
        &mut self.points
    }
}

impl From<Vec<Point3<f64>>> for Path {
    fn from(points: Vec<Point3<f64>>) -> Self {
        Self { points }
    }
}

impl FromIterator<Point> for Path {
    fn from_iter<I: IntoIterator<Item = Point>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().map(Point::to_engine).collect(),
        }
    }
}

/// A source point paired with where it was measured, both in engine units.
/// A fitted transform maps `source` as close to `measured` as it can.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchedPoint {
    pub source: Point2<f64>,
    pub measured: Point2<f64>,
}

impl MatchedPoint {
    pub fn new(source: Point2<f64>, measured: Point2<f64>) -> Self {
        Self { source, measured }
    }
}
