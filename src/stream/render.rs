//! Chart rendering for the live stream

use super::buffer::SampleBuffer;
use crate::config::PlotSettings;
use anyhow::{anyhow, Result};
use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;

/// X axis range: the buffered time span once more than two samples are
/// held, otherwise `0..idle_span`.
pub fn x_range(buffer: &SampleBuffer, idle_span: f64) -> Range<f64> {
    match buffer.time_span() {
        Some((first, last)) if buffer.len() > 2 && last > first => first..last,
        Some((first, _)) if buffer.len() > 2 => first..first + 1.0,
        _ => 0.0..idle_span,
    }
}

/// Draw the buffer as a line chart into an SVG file
pub fn render_chart(
    buffer: &SampleBuffer,
    settings: &PlotSettings,
    path: &Path,
    caption: &str,
) -> Result<()> {
    draw(buffer, settings, path, caption)
        .map_err(|e| anyhow!("Failed to render chart {}: {}", path.display(), e))
}

fn draw(
    buffer: &SampleBuffer,
    settings: &PlotSettings,
    path: &Path,
    caption: &str,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let root = SVGBackend::new(path, (settings.width, settings.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 20).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(
            x_range(buffer, settings.idle_x_span),
            settings.y_min..settings.y_max,
        )?;

    chart
        .configure_mesh()
        .x_desc("Time")
        .y_desc("Value")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    if !buffer.is_empty() {
        chart.draw_series(LineSeries::new(buffer.points(), &RED))?;
    }

    root.present()?;
    Ok(())
}
