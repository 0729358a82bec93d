//! Static Chart Renderer
//! Generates one PNG per compared column.
//!
//! Layout:
//! 1. Title: column name, wrapped at 70 characters, centered
//! 2. Chart: baseline and modified on the left axis, delta on the right axis
//! 3. Legend: bottom right (baseline / modified / delta)
//! 4. Footnote when markers are thinned out

use crate::compare::ComparisonResult;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::ops::Range;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Upper limit of marker icons per series.
pub const MAX_MARKERS: usize = 30;
/// Title line width in characters.
pub const TITLE_WRAP: usize = 70;

const BASE_COLOR: RGBColor = RGBColor(31, 119, 180); // Blue
const MOD_COLOR: RGBColor = RGBColor(255, 127, 14); // Orange
const DELTA_COLOR: RGBColor = RGBColor(214, 39, 40); // Red

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("no values to plot for '{0}'")]
    EmptySeries(String),
    #[error("failed to draw chart for '{column}': {message}")]
    Draw { column: String, message: String },
}

/// Turns one comparison into an artifact. Implementations must be shareable
/// across the worker threads that render columns in parallel.
pub trait ChartSink: Send + Sync {
    /// Render `result`, drawing a marker icon every `marker_every` points.
    fn emit(&self, result: &ComparisonResult, marker_every: usize) -> Result<PathBuf, RenderError>;
}

/// Marker spacing so a series never shows more than [`MAX_MARKERS`] icons.
pub fn marker_interval(row_count: usize) -> usize {
    row_count.div_ceil(MAX_MARKERS).max(1)
}

/// File name for a column's chart: whitespace runs become `_`, path
/// separators and other characters file systems reject become `-`.
pub fn chart_file_name(column: &str) -> String {
    let joined = column.split_whitespace().collect::<Vec<_>>().join("_");
    let stem: String = joined
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c if c.is_control() => '-',
            c => c,
        })
        .collect();

    if stem.is_empty() {
        "unnamed.png".to_string()
    } else {
        format!("{}.png", stem)
    }
}

/// Greedy word wrap. Words longer than `width` keep a line to themselves.
pub fn wrap_title(title: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in title.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Padded axis range over the finite values, never zero-width.
fn value_range<'a>(values: impl Iterator<Item = &'a f64>) -> Range<f64> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &v in values {
        if v.is_finite() {
            min = min.min(v);
            max = max.max(v);
        }
    }
    if min.is_infinite() {
        return -1.0..1.0;
    }
    if min == max {
        let pad = if min == 0.0 { 1.0 } else { min.abs() * 0.05 };
        return (min - pad)..(max + pad);
    }
    let pad = (max - min) * 0.05;
    (min - pad)..(max + pad)
}

fn points(rows: Range<usize>, values: &[f64]) -> Vec<(f64, f64)> {
    rows.zip(values)
        .filter(|(_, v)| v.is_finite())
        .map(|(x, &y)| (x as f64, y))
        .collect()
}

/// Writes PNG charts into a directory with plotters' bitmap backend.
pub struct PngRenderer {
    output_dir: PathBuf,
    size: (u32, u32),
}

impl PngRenderer {
    /// Renderer writing 1000x700 charts into `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            size: (1000, 700),
        }
    }

    /// Override the image size in pixels.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    fn draw(
        &self,
        result: &ComparisonResult,
        marker_every: usize,
        path: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let (width, _) = self.size;
        let root = BitMapBackend::new(path, self.size).into_drawing_area();
        root.fill(&WHITE)?;

        // Title
        let title_lines = wrap_title(&result.column, TITLE_WRAP);
        let title_h = 16 + 24 * title_lines.len().max(1) as u32;
        let (title_area, body) = root.split_vertically(title_h);
        let title_style = TextStyle::from(("sans-serif", 20).into_font())
            .pos(Pos::new(HPos::Center, VPos::Top));
        for (i, line) in title_lines.iter().enumerate() {
            title_area.draw(&Text::new(
                line.as_str(),
                ((width / 2) as i32, 10 + 24 * i as i32),
                title_style.clone(),
            ))?;
        }

        let note_h = if marker_every > 1 { 36 } else { 0 };
        let body_h = body.dim_in_pixel().1;
        let (plot_area, note_area) = body.split_vertically(body_h.saturating_sub(note_h));

        let base_pts = points(result.row_numbers(), &result.baseline);
        let mod_pts = points(result.row_numbers(), &result.modified);
        let diff_pts = points(result.row_numbers(), &result.difference);

        let x_range = {
            let rows = result.row_numbers();
            let (start, end) = (rows.start as f64, rows.end.saturating_sub(1) as f64);
            if end > start {
                start..end
            } else {
                (start - 0.5)..(start + 0.5)
            }
        };
        let y_range = value_range(result.baseline.iter().chain(&result.modified));
        let diff_range = value_range(result.difference.iter());

        let mut chart = ChartBuilder::on(&plot_area)
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(70)
            .right_y_label_area_size(80)
            .build_cartesian_2d(x_range.clone(), y_range)?
            .set_secondary_coord(x_range, diff_range);

        chart.configure_mesh().x_desc("Row").draw()?;
        chart
            .configure_secondary_axes()
            .y_desc("Delta (baseline - modified)")
            .draw()?;

        chart
            .draw_series(LineSeries::new(
                base_pts.iter().copied(),
                BASE_COLOR.stroke_width(2),
            ))?
            .label("baseline")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BASE_COLOR));
        chart.draw_series(base_pts.iter().step_by(marker_every).map(|&p| {
            EmptyElement::at(p) + Rectangle::new([(-3, -3), (3, 3)], BASE_COLOR.filled())
        }))?;

        chart
            .draw_series(DashedLineSeries::new(
                mod_pts.clone(),
                8,
                4,
                MOD_COLOR.stroke_width(2),
            ))?
            .label("modified")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], MOD_COLOR));
        chart.draw_series(
            mod_pts
                .iter()
                .step_by(marker_every)
                .map(|&p| TriangleMarker::new(p, 5, MOD_COLOR.filled())),
        )?;

        chart
            .draw_secondary_series(DashedLineSeries::new(
                diff_pts.clone(),
                6,
                3,
                DELTA_COLOR.stroke_width(1),
            ))?
            .label("delta")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], DELTA_COLOR));
        chart.draw_secondary_series(
            diff_pts
                .iter()
                .step_by(marker_every)
                .map(|&p| Circle::new(p, 2, DELTA_COLOR.filled())),
        )?;

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::LowerRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        if marker_every > 1 {
            let note_style = TextStyle::from(("sans-serif", 12).into_font());
            note_area.draw(&Text::new(
                format!("Note: marker icons only shown every {} points", marker_every),
                (10, 4),
                note_style.clone(),
            ))?;
            note_area.draw(&Text::new("for clarity", (10, 18), note_style))?;
        }

        root.present()?;
        Ok(())
    }
}

impl ChartSink for PngRenderer {
    fn emit(&self, result: &ComparisonResult, marker_every: usize) -> Result<PathBuf, RenderError> {
        let has_values = result
            .baseline
            .iter()
            .chain(&result.modified)
            .any(|v| v.is_finite());
        if !has_values {
            return Err(RenderError::EmptySeries(result.column.clone()));
        }

        let path = self.output_dir.join(chart_file_name(&result.column));
        self.draw(result, marker_every.max(1), &path)
            .map_err(|e| RenderError::Draw {
                column: result.column.clone(),
                message: e.to_string(),
            })?;

        log::debug!("Saved {}", path.display());
        Ok(path)
    }
}
