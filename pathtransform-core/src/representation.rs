/// Representation string codec.
///
/// A representation is a comma separated record whose first field is the
/// transform identifier:
///
/// ```text
/// TriangulatedPathTransform,<line distance>,<min area>,<point count>,
///     <sx>,<sy>,<dx>,<dy>, ... ,<index count>,<index>, ...
/// PathTranslation,<tx>,<ty>
/// PathTranslationAndRotation,<tx>,<ty>,<ox>,<oy>
/// PathTranslationRotationAndScale,<tx>,<ty>,<ox>,<oy>,<sx>,<sy>,<cx>,<cy>
/// ```
///
/// Every triangulated control point is a source/destination pair and the index
/// list is shared by both sides.
use nalgebra::{Complex, Point2, Vector2};
use nom::{
    character::complete::{alphanumeric1, char, multispace0, u32 as index},
    combinator::all_consuming,
    multi::count,
    number::complete::double,
    sequence::{delimited, preceded, terminated},
    IResult,
};

use crate::error::{Result, TransformError};
use crate::geometry::MatchedPoint;
use crate::transform::TransformKind;

/// Decoded fields of a triangulated representation
#[derive(Debug, Clone, PartialEq)]
pub struct TriangulatedRecord {
    pub line_distance: f64,
    pub min_area_with_neighbors: f64,
    pub points: Vec<MatchedPoint>,
    pub indices: Vec<u32>,
}

/// Decoded fields of any representation, not yet validated as a transform
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Translation {
        offset: Vector2<f64>,
    },
    TranslationAndRotation {
        translation: Vector2<f64>,
        orientation: Complex<f64>,
    },
    TranslationRotationAndScale {
        translation: Vector2<f64>,
        orientation: Complex<f64>,
        scale: Vector2<f64>,
        center_of_mass: Point2<f64>,
    },
    Triangulated(TriangulatedRecord),
}

impl Record {
    pub fn kind(&self) -> TransformKind {
        match self {
            Self::Translation { .. } => TransformKind::Translation,
            Self::TranslationAndRotation { .. } => TransformKind::TranslationAndRotation,
            Self::TranslationRotationAndScale { .. } => TransformKind::TranslationRotationAndScale,
            Self::Triangulated(_) => TransformKind::Triangulated,
        }
    }

    /// Error for a record decoded where another kind was required
    pub fn mismatch(&self, expected: TransformKind) -> TransformError {
        TransformError::invalid(format!("expected {expected}, found {}", self.kind()))
    }
}

/// Decode a representation string into its record
pub fn parse(input: &str) -> Result<Record> {
    let (body, identifier) = identifier(input)
        .map_err(|_| TransformError::invalid("missing transform identifier"))?;
    let kind = TransformKind::from_identifier(identifier)
        .ok_or_else(|| TransformError::invalid(format!("unknown transform identifier {identifier:?}")))?;

    let parsed = match kind {
        TransformKind::Translation => finish(body, translation),
        TransformKind::TranslationAndRotation => finish(body, translation_and_rotation),
        TransformKind::TranslationRotationAndScale => finish(body, translation_rotation_and_scale),
        TransformKind::Triangulated => finish(body, triangulated),
    };
    let record = parsed.map_err(|e| describe_failure(input, kind, e))?;
    check_finite(&record)?;
    Ok(record)
}

fn finish<'a, O>(
    body: &'a str,
    parser: impl FnMut(&'a str) -> IResult<&'a str, O>,
) -> std::result::Result<O, nom::Err<nom::error::Error<&'a str>>> {
    all_consuming(terminated(parser, multispace0))(body).map(|(_, out)| out)
}

fn describe_failure(input: &str, kind: TransformKind, err: nom::Err<nom::error::Error<&str>>) -> TransformError {
    match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let position = input.len() - e.input.len();
            if e.input.trim().is_empty() {
                TransformError::invalid(format!("{kind} record ends early at byte {position}"))
            } else {
                TransformError::invalid(format!(
                    "{kind} record has unexpected input at byte {position} ({:?})",
                    e.code
                ))
            }
        }
        nom::Err::Incomplete(_) => TransformError::invalid(format!("{kind} record is truncated")),
    }
}

fn check_finite(record: &Record) -> Result<()> {
    let mut values: Vec<f64> = Vec::new();
    match record {
        Record::Translation { offset } => values.extend(offset.iter()),
        Record::TranslationAndRotation {
            translation,
            orientation,
        } => {
            values.extend(translation.iter());
            values.extend([orientation.re, orientation.im]);
        }
        Record::TranslationRotationAndScale {
            translation,
            orientation,
            scale,
            center_of_mass,
        } => {
            values.extend(translation.iter());
            values.extend([orientation.re, orientation.im]);
            values.extend(scale.iter());
            values.extend(center_of_mass.iter());
        }
        Record::Triangulated(t) => {
            values.extend([t.line_distance, t.min_area_with_neighbors]);
            for m in &t.points {
                values.extend(m.source.iter().chain(m.measured.iter()));
            }
        }
    }
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(TransformError::invalid(format!(
            "{} record contains a non-finite number",
            record.kind()
        )))
    }
}

fn identifier(input: &str) -> IResult<&str, &str> {
    preceded(multispace0, alphanumeric1)(input)
}

fn separator(input: &str) -> IResult<&str, char> {
    delimited(multispace0, char(','), multispace0)(input)
}

fn scalar(input: &str) -> IResult<&str, f64> {
    preceded(separator, double)(input)
}

fn count_field(input: &str) -> IResult<&str, u32> {
    preceded(separator, index)(input)
}

fn vector(input: &str) -> IResult<&str, Vector2<f64>> {
    let (input, x) = scalar(input)?;
    let (input, y) = scalar(input)?;
    Ok((input, Vector2::new(x, y)))
}

fn matched_point(input: &str) -> IResult<&str, MatchedPoint> {
    let (input, source) = vector(input)?;
    let (input, measured) = vector(input)?;
    Ok((input, MatchedPoint::new(source.into(), measured.into())))
}

fn translation(input: &str) -> IResult<&str, Record> {
    let (input, offset) = vector(input)?;
    Ok((input, Record::Translation { offset }))
}

fn translation_and_rotation(input: &str) -> IResult<&str, Record> {
    let (input, translation) = vector(input)?;
    let (input, orientation) = vector(input)?;
    Ok((
        input,
        Record::TranslationAndRotation {
            translation,
            orientation: Complex::new(orientation.x, orientation.y),
        },
    ))
}

fn translation_rotation_and_scale(input: &str) -> IResult<&str, Record> {
    let (input, translation) = vector(input)?;
    let (input, orientation) = vector(input)?;
    let (input, scale) = vector(input)?;
    let (input, center_of_mass) = vector(input)?;
    Ok((
        input,
        Record::TranslationRotationAndScale {
            translation,
            orientation: Complex::new(orientation.x, orientation.y),
            scale,
            center_of_mass: center_of_mass.into(),
        },
    ))
}

/// Every repeated field takes at least two bytes, which bounds how many a
/// count can honestly announce.
fn announced(input: &str, n: u32) -> IResult<&str, usize> {
    let n = n as usize;
    if n > input.len() / 2 {
        return Err(nom::Err::Failure(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Count,
        )));
    }
    Ok((input, n))
}

fn triangulated(input: &str) -> IResult<&str, Record> {
    let (input, line_distance) = scalar(input)?;
    let (input, min_area_with_neighbors) = scalar(input)?;
    let (input, point_count) = count_field(input)?;
    let (input, point_count) = announced(input, point_count)?;
    let (input, points) = count(matched_point, point_count)(input)?;
    let (input, index_count) = count_field(input)?;
    let (input, index_count) = announced(input, index_count)?;
    let (input, indices) = count(count_field, index_count)(input)?;
    Ok((
        input,
        Record::Triangulated(TriangulatedRecord {
            line_distance,
            min_area_with_neighbors,
            points,
            indices,
        }),
    ))
}

/// Builds a representation string field by field
pub struct RepresentationWriter {
    out: String,
}

impl RepresentationWriter {
    pub fn new(kind: TransformKind) -> Self {
        Self {
            out: kind.identifier().to_string(),
        }
    }

    pub fn scalar(&mut self, value: f64) -> &mut Self {
        self.out.push(',');
        self.out.push_str(&value.to_string());
        self
    }

    pub fn vector(&mut self, x: f64, y: f64) -> &mut Self {
        self.scalar(x).scalar(y)
    }

    pub fn count(&mut self, value: usize) -> &mut Self {
        self.out.push(',');
        self.out.push_str(&value.to_string());
        self
    }

    pub fn finish(&mut self) -> String {
        std::mem::take(&mut self.out)
    }
}
