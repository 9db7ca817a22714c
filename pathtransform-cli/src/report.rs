/// Coloured terminal output for paths and transforms
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use std::io::{self, Write};
use pathtransform_core::{AnyPathTransform, Path, PathTransform, Point};

/// Prints a transformed path, highlighting points inserted by subdivision
pub struct PathReport<'a> {
    input: &'a Path,
    output: &'a Path,
    mapped_inputs: Vec<Point>,
}

impl<'a> PathReport<'a> {
    pub fn new(transform: &AnyPathTransform, input: &'a Path, output: &'a Path) -> Self {
        Self {
            input,
            output,
            mapped_inputs: input.iter().map(|p| transform.transform_single(p)).collect(),
        }
    }

    /// Output points that are not the image of an input point
    pub fn inserted_count(&self) -> usize {
        self.output
            .iter()
            .filter(|p| !self.mapped_inputs.contains(p))
            .count()
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.queue(SetForegroundColor(Color::Yellow))?;
        writer.queue(Print(format!(
            "{} input points -> {} output points ({} inserted)\n",
            self.input.len(),
            self.output.len(),
            self.inserted_count()
        )))?;

        for point in self.input.iter() {
            writer.queue(SetForegroundColor(Color::DarkGrey))?;
            writer.queue(Print(format!("  in   {}\n", format_point(&point))))?;
        }
        for point in self.output.iter() {
            let (tag, color) = if self.mapped_inputs.contains(&point) {
                ("out ", Color::White)
            } else {
                ("  + ", Color::Cyan)
            };
            writer.queue(SetForegroundColor(color))?;
            writer.queue(Print(format!("  {tag} {}\n", format_point(&point))))?;
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

pub fn format_point(point: &Point) -> String {
    format!("({}, {}, {})", point.x, point.y, point.z)
}

/// Summary of a decoded transform
pub fn describe<W: Write>(writer: &mut W, transform: &AnyPathTransform) -> io::Result<()> {
    writer.queue(SetForegroundColor(Color::Yellow))?;
    writer.queue(Print(format!("{}\n", transform.kind())))?;
    writer.queue(ResetColor)?;

    if let Some(triangulated) = transform.as_triangulated() {
        let mesh = triangulated.mesh();
        writer.queue(Print(format!(
            "  control points:          {}\n  triangles:               {}\n  line distance:           {}\n  min area with neighbors: {}\n",
            mesh.controls().source.len(),
            mesh.triangles().len(),
            triangulated.line_distance(),
            triangulated.min_area_with_neighbors()
        )))?;
        for (i, (triangle, t)) in mesh.triangles().iter().zip(mesh.transformations()).enumerate() {
            let color = if t.is_usable() { Color::White } else { Color::DarkGrey };
            writer.queue(SetForegroundColor(color))?;
            writer.queue(Print(format!(
                "  #{i} {:?} area {:.3}{}\n",
                triangle.source,
                t.area(),
                if t.is_usable() { "" } else { " (skipped)" }
            )))?;
        }
        writer.queue(ResetColor)?;
    }

    writer.queue(Print(format!("  {}\n", transform.to_representation())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathtransform_core::parse_path_transform;

    const SQUARE: &str = "TriangulatedPathTransform,2,10,4,0,0,0,0,10,0,10,0,10,10,10,10,0,10,0,10,6,0,1,2,0,2,3";

    fn render(report: &PathReport) -> String {
        let mut out = Vec::new();
        report.draw(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_in_place_has_no_inserted_points() {
        let transform = parse_path_transform("PathTranslation,1.5,-2").unwrap();
        let input: Path = [Point::new(0, 0, 7)].into_iter().collect();
        let output = transform.transform(&input);
        let report = PathReport::new(&transform, &input, &output);
        assert_eq!(report.inserted_count(), 0);
        assert!(render(&report).contains("(1500, -2000, 7)"));
    }

    #[test]
    fn test_subdivision_marks_inserted_points() {
        let transform = parse_path_transform(SQUARE).unwrap();
        let input: Path = [Point::new(8000, 2000, 0), Point::new(2000, 8000, 0)]
            .into_iter()
            .collect();
        let output = transform.transform(&input);
        let report = PathReport::new(&transform, &input, &output);
        assert_eq!(report.inserted_count(), 1);
        assert!(render(&report).contains("(5000, 5000, 0)"));
    }

    #[test]
    fn test_describe_lists_triangles() {
        let transform = parse_path_transform(SQUARE).unwrap();
        let mut out = Vec::new();
        describe(&mut out, &transform).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("triangles:               2"));
        assert!(text.contains("#1 [0, 2, 3]"));
        assert!(text.contains(SQUARE));
    }
}
