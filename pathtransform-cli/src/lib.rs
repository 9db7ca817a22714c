/// Command line front end for path transforms
use clap::{Parser, Subcommand, ValueEnum};
use crossterm::{
    queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use std::io::{self, stdout, Write};
use nalgebra::Point2;
use pathtransform_core::{
    create_path_transform, parse_path_transform, AnyPathTransform, FallbackPolicy, MatchedPoint, Path,
    PathTransform, Point, SubdivisionMode, TransformError, TransformKind, TransformOptions,
};

pub mod report;

pub use report::PathReport;

/// Apply, inspect and fit triangulated path transforms
#[derive(Parser, Debug)]
#[command(name = "pathtransform")]
#[command(version)]
#[command(about = "Transform 3D paths through representation strings", long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Transform a path
    Apply {
        /// Representation string
        representation: String,

        /// Path point as x,y,z in micro-units; repeat for every point
        #[arg(short, long = "point", value_parser = parse_point, required = true, allow_hyphen_values = true)]
        points: Vec<Point>,

        /// Keep the point count instead of subdividing
        #[arg(long)]
        in_place: bool,

        /// Subdivision strategy for triangulated transforms
        #[arg(long, value_enum, default_value_t = ModeArg::Crossings)]
        mode: ModeArg,

        /// Policy for points outside every triangle
        #[arg(long, value_enum, default_value_t = FallbackArg::LeastViolation)]
        fallback: FallbackArg,
    },

    /// Transform a single point
    Single {
        /// Representation string
        representation: String,

        /// Point as x,y,z in micro-units
        #[arg(value_parser = parse_point, allow_hyphen_values = true)]
        point: Point,

        /// Policy for points outside every triangle
        #[arg(long, value_enum, default_value_t = FallbackArg::LeastViolation)]
        fallback: FallbackArg,
    },

    /// Decode a representation and summarize it
    Describe {
        /// Representation string
        representation: String,
    },

    /// Fit a transform to matched points and print its representation
    Fit {
        /// Transform kind to fit
        #[arg(short, long, value_enum, default_value_t = KindArg::Triangulated)]
        kind: KindArg,

        /// Matched pair as sx,sy,mx,my in engine units; repeat for every pair
        #[arg(short, long = "pair", value_parser = parse_pair, required = true, allow_hyphen_values = true)]
        pairs: Vec<MatchedPoint>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Crossings,
    Bisection,
}

impl From<ModeArg> for SubdivisionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Crossings => SubdivisionMode::EdgeCrossings,
            ModeArg::Bisection => SubdivisionMode::Bisection,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FallbackArg {
    LeastViolation,
    NearestEdge,
}

impl From<FallbackArg> for FallbackPolicy {
    fn from(fallback: FallbackArg) -> Self {
        match fallback {
            FallbackArg::LeastViolation => FallbackPolicy::LeastViolation,
            FallbackArg::NearestEdge => FallbackPolicy::NearestEdge,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Translation,
    Rotation,
    Scale,
    Triangulated,
}

impl From<KindArg> for TransformKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Translation => TransformKind::Translation,
            KindArg::Rotation => TransformKind::TranslationAndRotation,
            KindArg::Scale => TransformKind::TranslationRotationAndScale,
            KindArg::Triangulated => TransformKind::Triangulated,
        }
    }
}

fn numbers<T: std::str::FromStr>(input: &str, expected: usize) -> Result<Vec<T>, String> {
    let values = input
        .split(',')
        .map(|field| field.trim().parse::<T>())
        .collect::<Result<Vec<T>, _>>()
        .map_err(|_| format!("{input:?} is not a comma separated list of numbers"))?;
    if values.len() != expected {
        return Err(format!("expected {expected} values, got {}", values.len()));
    }
    Ok(values)
}

pub fn parse_point(input: &str) -> Result<Point, String> {
    let v = numbers::<i64>(input, 3)?;
    Ok(Point::new(v[0], v[1], v[2]))
}

pub fn parse_pair(input: &str) -> Result<MatchedPoint, String> {
    let v = numbers::<f64>(input, 4)?;
    Ok(MatchedPoint::new(Point2::new(v[0], v[1]), Point2::new(v[2], v[3])))
}

fn invalid_data(err: TransformError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err)
}

fn configured(transform: AnyPathTransform, mode: ModeArg, fallback: FallbackArg) -> AnyPathTransform {
    match transform {
        AnyPathTransform::Triangulated(t) => {
            AnyPathTransform::Triangulated(t.with_subdivision(mode.into()).with_fallback(fallback.into()))
        }
        other => other,
    }
}

/// Execute a parsed command line, writing to stdout
pub fn run(cli: Cli) -> io::Result<()> {
    let mut stdout = stdout();
    execute(cli.command, &mut stdout)?;
    stdout.flush()
}

pub fn execute<W: Write>(command: Commands, writer: &mut W) -> io::Result<()> {
    match command {
        Commands::Apply {
            representation,
            points,
            in_place,
            mode,
            fallback,
        } => {
            let transform = configured(parse_path_transform(&representation).map_err(invalid_data)?, mode, fallback);
            let input: Path = points.into_iter().collect();
            let output = if in_place {
                let mut output = input.clone();
                transform.transform_in_place(&mut output);
                output
            } else {
                transform.transform(&input)
            };
            log::info!("{} transformed {} points into {}", transform.kind(), input.len(), output.len());
            PathReport::new(&transform, &input, &output).draw(writer)?;
        }
        Commands::Single {
            representation,
            point,
            fallback,
        } => {
            let transform = configured(
                parse_path_transform(&representation).map_err(invalid_data)?,
                ModeArg::Crossings,
                fallback,
            );
            let mapped = transform.transform_single(point);
            queue!(
                writer,
                SetForegroundColor(Color::White),
                Print(format!(
                    "{} -> {}\n",
                    report::format_point(&point),
                    report::format_point(&mapped)
                )),
                ResetColor
            )?;
        }
        Commands::Describe { representation } => {
            let transform = parse_path_transform(&representation).map_err(invalid_data)?;
            report::describe(writer, &transform)?;
        }
        Commands::Fit { kind, pairs } => {
            let transform =
                create_path_transform(kind.into(), &pairs, &TransformOptions::default()).map_err(invalid_data)?;
            if transform.kind() != TransformKind::from(kind) {
                queue!(
                    writer,
                    SetForegroundColor(Color::Yellow),
                    Print(format!("fell back to {}\n", transform.kind())),
                    ResetColor
                )?;
            }
            queue!(writer, Print(format!("{}\n", transform.to_representation())))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_to_string(args: &[&str]) -> io::Result<String> {
        let cli = Cli::try_parse_from(args).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
        let mut out = Vec::new();
        execute(cli.command, &mut out)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    #[test]
    fn test_parse_point_and_pair() {
        assert_eq!(parse_point("1, -2,3"), Ok(Point::new(1, -2, 3)));
        assert!(parse_point("1,2").is_err());
        assert!(parse_point("1,2,x").is_err());
        let pair = parse_pair("0,0,1.5,2").unwrap();
        assert_eq!(pair.measured, Point2::new(1.5, 2.0));
    }

    #[test]
    fn test_single_command() {
        let out = run_to_string(&["pathtransform", "single", "PathTranslation,1,1", "0,0,5"]).unwrap();
        assert!(out.contains("(0, 0, 5) -> (1000, 1000, 5)"));
    }

    #[test]
    fn test_single_agrees_with_apply_under_fallback() {
        let representation = "TriangulatedPathTransform,2,10,4,0,0,0,0,10,0,10,0,0,10,0,10,10,10,30,10,6,0,1,2,1,3,2";
        for fallback in ["least-violation", "nearest-edge"] {
            let single = run_to_string(&[
                "pathtransform", "single", representation, "5000,25000,0", "--fallback", fallback,
            ])
            .unwrap();
            let after = &single[single.find("-> ").unwrap() + 3..];
            let mapped = &after[..=after.find(')').unwrap()];
            let applied = run_to_string(&[
                "pathtransform", "apply", representation, "-p", "5000,25000,0", "--in-place", "--fallback", fallback,
            ])
            .unwrap();
            assert!(applied.contains(&format!("out  {mapped}")), "{fallback}: {applied}");
        }
    }

    #[test]
    fn test_apply_rejects_bad_representation() {
        let err = run_to_string(&["pathtransform", "apply", "Nonsense,1", "-p", "0,0,0"]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_fit_reports_fallback() {
        let out = run_to_string(&["pathtransform", "fit", "--pair", "0,0,1,1", "--pair", "1,0,2,1"]).unwrap();
        assert!(out.contains("fell back to PathTranslationRotationAndScale"));
    }
}
