/// The path transform interface and the set of transform kinds
use std::fmt;
use std::str::FromStr;

use nalgebra::Point3;

use crate::error::{Result, TransformError};
use crate::geometry::{Path, Point};
use crate::representation::{self, Record};
use crate::rigid::{PathTranslation, PathTranslationAndRotation, PathTranslationRotationAndScale};
use crate::triangulated::TriangulatedPathTransform;

/// Identifies a transform and prefixes its representation string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformKind {
    Translation,
    TranslationAndRotation,
    TranslationRotationAndScale,
    Triangulated,
}

impl TransformKind {
    pub const ALL: [TransformKind; 4] = [
        Self::Translation,
        Self::TranslationAndRotation,
        Self::TranslationRotationAndScale,
        Self::Triangulated,
    ];

    pub fn identifier(self) -> &'static str {
        match self {
            Self::Translation => "PathTranslation",
            Self::TranslationAndRotation => "PathTranslationAndRotation",
            Self::TranslationRotationAndScale => "PathTranslationRotationAndScale",
            Self::Triangulated => "TriangulatedPathTransform",
        }
    }

    /// Resolve a representation tag. The misspelled triangulated tag written
    /// by older producers is accepted as well.
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        match identifier {
            "TriangulatedPathTransfrom" => Some(Self::Triangulated),
            _ => Self::ALL.into_iter().find(|k| k.identifier() == identifier),
        }
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}

/// A transform of 3D paths. Only x and y are transformed; z passes through.
pub trait PathTransform {
    fn kind(&self) -> TransformKind;

    /// Canonical representation string; parsing it yields an equal transform
    fn to_representation(&self) -> String;

    /// Transform one point in engine units
    fn map_point(&self, point: &Point3<f64>) -> Point3<f64>;

    /// Transform one boundary point
    fn transform_single(&self, point: Point) -> Point {
        Point::from_engine(&self.map_point(&point.to_engine()))
    }

    /// Replace every point by its transform; the point count never changes
    fn transform_in_place(&self, path: &mut Path) {
        for point in path.engine_points_mut() {
            *point = self.map_point(point);
        }
    }

    /// Transform into a new path. Transforms that subdivide segments override
    /// this; the output never has fewer points than the input.
    fn transform(&self, path: &Path) -> Path {
        let mut transformed = path.clone();
        self.transform_in_place(&mut transformed);
        transformed
    }
}

/// Any transform that can be decoded from a representation string
#[derive(Debug, Clone, PartialEq)]
pub enum AnyPathTransform {
    Translation(PathTranslation),
    TranslationAndRotation(PathTranslationAndRotation),
    TranslationRotationAndScale(PathTranslationRotationAndScale),
    Triangulated(TriangulatedPathTransform),
}

impl AnyPathTransform {
    fn inner(&self) -> &dyn PathTransform {
        match self {
            Self::Translation(t) => t,
            Self::TranslationAndRotation(t) => t,
            Self::TranslationRotationAndScale(t) => t,
            Self::Triangulated(t) => t,
        }
    }

    pub fn as_triangulated(&self) -> Option<&TriangulatedPathTransform> {
        match self {
            Self::Triangulated(t) => Some(t),
            _ => None,
        }
    }
}

impl PathTransform for AnyPathTransform {
    fn kind(&self) -> TransformKind {
        self.inner().kind()
    }

    fn to_representation(&self) -> String {
        self.inner().to_representation()
    }

    fn map_point(&self, point: &Point3<f64>) -> Point3<f64> {
        self.inner().map_point(point)
    }

    fn transform_in_place(&self, path: &mut Path) {
        self.inner().transform_in_place(path)
    }

    fn transform(&self, path: &Path) -> Path {
        self.inner().transform(path)
    }
}

impl TryFrom<Record> for AnyPathTransform {
    type Error = TransformError;

    fn try_from(record: Record) -> Result<Self> {
        Ok(match record {
            Record::Translation { offset } => Self::Translation(PathTranslation::new(offset)),
            Record::TranslationAndRotation {
                translation,
                orientation,
            } => Self::TranslationAndRotation(PathTranslationAndRotation::new(translation, orientation)),
            Record::TranslationRotationAndScale {
                translation,
                orientation,
                scale,
                center_of_mass,
            } => Self::TranslationRotationAndScale(PathTranslationRotationAndScale::new(
                PathTranslationAndRotation::new(translation, orientation),
                scale,
                center_of_mass,
            )),
            Record::Triangulated(record) => Self::Triangulated(
                TriangulatedPathTransform::from_record(record)
                    .map_err(TransformError::into_representation_error)?,
            ),
        })
    }
}

/// Decode any transform from its representation string
pub fn parse_path_transform(representation: &str) -> Result<AnyPathTransform> {
    let transform = AnyPathTransform::try_from(representation::parse(representation)?)?;
    log::debug!("created {}", transform.kind());
    Ok(transform)
}

impl FromStr for AnyPathTransform {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self> {
        parse_path_transform(s)
    }
}
