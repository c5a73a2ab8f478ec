//! Function plots rendered to PNG.

use std::io::Cursor;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{ImageFormat, RgbImage};
use plotters::prelude::*;

use super::PlotRenderer;
use super::expr::Expr;
use crate::error::ToolError;

const X_MIN: f64 = -10.0;
const X_MAX: f64 = 10.0;
const SAMPLES: usize = 400;
const WIDTH: u32 = 800;
const HEIGHT: u32 = 600;
const TITLE: &str = "Function Plot";

const GRID: RGBColor = RGBColor(225, 225, 225);
const CURVE: RGBColor = RGBColor(37, 99, 235);

/// Samples `f(x)` at 400 points on `[-10, 10]` and charts it as a PNG with
/// a title, grid, axes through the origin and `x`/`f(x)` labels.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImagePlotter;

impl PlotRenderer for ImagePlotter {
    fn render(&self, function: &str) -> Result<String, ToolError> {
        let expr = Expr::parse(strip_assignment(function))?;
        let png = render_png(&sample(&expr))?;
        Ok(STANDARD.encode(png))
    }
}

/// Accept `y = ...` and `f(x) = ...` as well as a bare expression.
fn strip_assignment(function: &str) -> &str {
    match function.split_once('=') {
        Some((lhs, rhs)) if matches!(lhs.trim(), "y" | "f(x)" | "Y") => rhs,
        _ => function,
    }
}

fn sample(expr: &Expr) -> Vec<(f64, f64)> {
    let step = (X_MAX - X_MIN) / (SAMPLES - 1) as f64;
    (0..SAMPLES)
        .map(|i| {
            let x = X_MIN + step * i as f64;
            (x, expr.eval(x))
        })
        .collect()
}

/// Vertical range covering the finite samples, trimmed at the 2nd and 98th
/// percentile when asymptotes blow the range up.
fn y_range(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    let mut ys: Vec<f64> = points
        .iter()
        .map(|(_, y)| *y)
        .filter(|y| y.is_finite())
        .collect();
    if ys.is_empty() {
        return None;
    }
    ys.sort_by(f64::total_cmp);

    let (mut lo, mut hi) = (ys[0], ys[ys.len() - 1]);
    let trim = ys.len() / 50;
    if trim > 0 && (hi - lo) > 1e3 {
        lo = ys[trim];
        hi = ys[ys.len() - 1 - trim];
    }
    if (hi - lo).abs() < 1e-9 {
        lo -= 1.0;
        hi += 1.0;
    }
    let pad = (hi - lo) * 0.05;
    Some((lo - pad, hi + pad))
}

fn render_error(e: impl std::fmt::Display) -> ToolError {
    ToolError::Render(e.to_string())
}

/// Runs of drawable samples. A run breaks at undefined or clipped samples and
/// at jumps across more than half the vertical range (asymptotes).
fn segments(points: &[(f64, f64)], y_min: f64, y_max: f64) -> Vec<Vec<(f64, f64)>> {
    let max_jump = (y_max - y_min) / 2.0;
    let mut runs = Vec::new();
    let mut current: Vec<(f64, f64)> = Vec::new();

    for &(x, y) in points {
        let drawable = y.is_finite() && y >= y_min && y <= y_max;
        let jumped = current.last().is_some_and(|&(_, prev)| (y - prev).abs() > max_jump);
        if (!drawable || jumped) && !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
        if drawable {
            current.push((x, y));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

fn render_png(points: &[(f64, f64)]) -> Result<Vec<u8>, ToolError> {
    let (y_min, y_max) = y_range(points)
        .ok_or_else(|| ToolError::Evaluation("function is undefined on [-10, 10]".to_string()))?;

    let mut buffer = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(TITLE, ("sans-serif", 28).into_font().style(FontStyle::Bold))
            .margin(20)
            .x_label_area_size(45)
            .y_label_area_size(60)
            .build_cartesian_2d(X_MIN..X_MAX, y_min..y_max)
            .map_err(render_error)?;

        chart
            .configure_mesh()
            .light_line_style(GRID)
            .x_desc("x")
            .y_desc("f(x)")
            .axis_desc_style(("sans-serif", 18))
            .draw()
            .map_err(render_error)?;

        let mut axes = vec![PathElement::new(vec![(0.0, y_min), (0.0, y_max)], BLACK)];
        if y_min <= 0.0 && 0.0 <= y_max {
            axes.push(PathElement::new(vec![(X_MIN, 0.0), (X_MAX, 0.0)], BLACK));
        }
        chart.draw_series(axes).map_err(render_error)?;

        for run in segments(points, y_min, y_max) {
            chart
                .draw_series(LineSeries::new(run, CURVE.stroke_width(2)))
                .map_err(render_error)?;
        }

        root.present().map_err(render_error)?;
    }

    let img = RgbImage::from_raw(WIDTH, HEIGHT, buffer)
        .ok_or_else(|| ToolError::Render("bitmap has the wrong size".to_string()))?;
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(render_error)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_produces_png() {
        let encoded = ImagePlotter.render("sin(x)").unwrap();
        let bytes = STANDARD.decode(encoded).unwrap();
        assert_eq!(&bytes[..4], &[0x89, 0x50, 0x4E, 0x47]);

        let img = image::load_from_memory_with_format(&bytes, ImageFormat::Png).unwrap();
        assert_eq!((img.width(), img.height()), (WIDTH, HEIGHT));
    }

    #[test]
    fn test_assignment_forms() {
        assert_eq!(strip_assignment("y = x^2").trim(), "x^2");
        assert_eq!(strip_assignment("f(x) = 2x").trim(), "2x");
        assert_eq!(strip_assignment("x^2"), "x^2");
        assert!(ImagePlotter.render("y = x^2").is_ok());
    }

    #[test]
    fn test_sampling_covers_interval() {
        let points = sample(&Expr::parse("x").unwrap());
        assert_eq!(points.len(), SAMPLES);
        assert_eq!(points[0].0, X_MIN);
        assert!((points[SAMPLES - 1].0 - X_MAX).abs() < 1e-9);
    }

    #[test]
    fn test_constant_and_asymptotic_functions() {
        assert!(ImagePlotter.render("3").is_ok());
        assert!(ImagePlotter.render("tan(x)").is_ok());
        assert!(ImagePlotter.render("1 / x").is_ok());
    }

    #[test]
    fn test_segments_break_at_gaps_and_asymptotes() {
        let points = [
            (0.0, 1.0),
            (1.0, 2.0),
            (2.0, f64::NAN),
            (3.0, 1.0),
            (4.0, 9.0),
            (5.0, -9.0),
            (6.0, 50.0),
        ];
        let runs = segments(&points, -10.0, 10.0);
        let lengths: Vec<usize> = runs.iter().map(Vec::len).collect();
        assert_eq!(lengths, vec![2, 2, 1]);
        assert_eq!(runs[2], vec![(5.0, -9.0)]);
    }

    #[test]
    fn test_chart_is_not_blank() {
        let bytes = STANDARD.decode(ImagePlotter.render("x^2").unwrap()).unwrap();
        let img = image::load_from_memory_with_format(&bytes, ImageFormat::Png)
            .unwrap()
            .to_rgb8();
        let curve_pixels = img.pixels().filter(|p| p.0 == [37, 99, 235]).count();
        assert!(curve_pixels > 100);
    }

    #[test]
    fn test_undefined_function_fails() {
        assert!(matches!(
            ImagePlotter.render("sqrt(-1 - x^2)"),
            Err(ToolError::Evaluation(_))
        ));
        assert!(matches!(
            ImagePlotter.render("sin("),
            Err(ToolError::Parse { .. })
        ));
    }
}
