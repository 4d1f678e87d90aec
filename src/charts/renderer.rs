//! Static Chart Renderer
//! Draws the ESG charts into an in-memory bitmap with plotters and encodes
//! them as PNG for the chart files and the report document.
//!
//! Layout:
//! 1. Overview: one green bar per metric total ("ESG Metrics Overview")
//! 2. Trends: one bar panel per column, one bar per data row

use image::{ImageFormat, RgbImage};
use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;
use std::io::Cursor;
use thiserror::Error;

use super::ChartData;

// Colors (RGB)
const BAR_GREEN: RGBColor = RGBColor(112, 173, 71);
const PANEL_COLORS: [RGBColor; 3] = [
    RGBColor(91, 155, 213),  // Emissions
    RGBColor(237, 125, 49),  // Energy
    RGBColor(112, 173, 71),  // Waste
];

pub const OVERVIEW_FILE_NAME: &str = "esg_metrics_chart.png";
pub const TRENDS_FILE_NAME: &str = "esg_trends_chart.png";

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Chart drawing failed: {0}")]
    Draw(String),
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("Chart buffer does not match {0}x{1}")]
    Buffer(u32, u32),
    #[error("No values to chart")]
    NoData,
}

fn draw_err<E: std::fmt::Display>(err: E) -> ChartError {
    ChartError::Draw(err.to_string())
}

/// A rendered PNG plus its pixel size.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartImage {
    pub file_name: String,
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl ChartImage {
    /// Height over width, used to size the image on a page.
    pub fn aspect_ratio(&self) -> f64 {
        self.height as f64 / self.width.max(1) as f64
    }
}

pub struct ChartRenderer;

impl ChartRenderer {
    /// Render every chart the data supports.
    pub fn render_all(data: &ChartData, width: u32, height: u32) -> Result<Vec<ChartImage>, ChartError> {
        let mut images = vec![Self::render_overview_png(data, width, height)?];
        if data.series.iter().any(|s| !s.values.is_empty()) {
            images.push(Self::render_trends_png(data, width, height)?);
        }
        Ok(images)
    }

    pub fn render_overview_png(data: &ChartData, width: u32, height: u32) -> Result<ChartImage, ChartError> {
        if data.overview.is_empty() {
            return Err(ChartError::NoData);
        }

        let labels: Vec<String> = data.overview.iter().map(|b| b.label.clone()).collect();
        let (y_min, y_max) = Self::value_range(data.overview.iter().map(|b| b.value));

        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;

            let mut chart = ChartBuilder::on(&root)
                .caption("ESG Metrics Overview", ("sans-serif", 28.0))
                .margin(16)
                .x_label_area_size(56)
                .y_label_area_size(80)
                .build_cartesian_2d((0..labels.len()).into_segmented(), y_min..y_max)
                .map_err(draw_err)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .y_desc("Amount")
                .x_label_formatter(&|v| Self::segment_label(v, &labels))
                .draw()
                .map_err(draw_err)?;

            chart
                .draw_series(
                    Histogram::vertical(&chart)
                        .style(BAR_GREEN.filled())
                        .margin(24)
                        .data(data.overview.iter().enumerate().map(|(i, b)| (i, b.value))),
                )
                .map_err(draw_err)?;

            root.present().map_err(draw_err)?;
        }

        Self::encode_png(OVERVIEW_FILE_NAME, buffer, width, height)
    }

    pub fn render_trends_png(data: &ChartData, width: u32, height: u32) -> Result<ChartImage, ChartError> {
        let series: Vec<_> = data.series.iter().filter(|s| !s.values.is_empty()).collect();
        if series.is_empty() {
            return Err(ChartError::NoData);
        }

        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;

            let panels = root.split_evenly((1, series.len()));
            for (idx, (area, column)) in panels.iter().zip(&series).enumerate() {
                let (y_min, y_max) = Self::value_range(column.values.iter().copied());
                let rows: Vec<String> = (1..=column.values.len()).map(|r| r.to_string()).collect();

                let mut chart = ChartBuilder::on(area)
                    .caption(&column.title, ("sans-serif", 22.0))
                    .margin(12)
                    .x_label_area_size(36)
                    .y_label_area_size(64)
                    .build_cartesian_2d((0..column.values.len()).into_segmented(), y_min..y_max)
                    .map_err(draw_err)?;

                chart
                    .configure_mesh()
                    .disable_x_mesh()
                    .x_desc("Row")
                    .x_label_formatter(&|v| Self::segment_label(v, &rows))
                    .draw()
                    .map_err(draw_err)?;

                chart
                    .draw_series(
                        Histogram::vertical(&chart)
                            .style(PANEL_COLORS[idx % PANEL_COLORS.len()].filled())
                            .margin(8)
                            .data(column.values.iter().enumerate().map(|(i, v)| (i, *v))),
                    )
                    .map_err(draw_err)?;
            }

            root.present().map_err(draw_err)?;
        }

        Self::encode_png(TRENDS_FILE_NAME, buffer, width, height)
    }

    fn segment_label(value: &SegmentValue<usize>, labels: &[String]) -> String {
        match value {
            SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
                labels.get(*i).cloned().unwrap_or_default()
            }
            SegmentValue::Last => String::new(),
        }
    }

    /// Axis range that always includes zero and leaves headroom above the bars.
    fn value_range(values: impl Iterator<Item = f64>) -> (f64, f64) {
        let (min, max) = values
            .filter(|v| v.is_finite())
            .fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
        let pad = (max - min) * 0.15;
        if pad == 0.0 {
            return (min, min + 1.0);
        }
        (if min < 0.0 { min - pad } else { 0.0 }, max + pad)
    }

    fn encode_png(file_name: &str, buffer: Vec<u8>, width: u32, height: u32) -> Result<ChartImage, ChartError> {
        let image = RgbImage::from_raw(width, height, buffer).ok_or(ChartError::Buffer(width, height))?;
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(ChartImage {
            file_name: file_name.to_string(),
            png,
            width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_range_starts_at_zero_with_headroom() {
        let (lo, hi) = ChartRenderer::value_range([3280.0, 41000.0, 900.0].into_iter());
        assert_eq!(lo, 0.0);
        assert!((hi - 47150.0).abs() < 1e-6);
    }

    #[test]
    fn value_range_of_zeros_is_not_degenerate() {
        let (lo, hi) = ChartRenderer::value_range([0.0, 0.0].into_iter());
        assert!(hi > lo);
    }

    #[test]
    fn segment_labels_follow_bar_order() {
        let labels = vec!["Total emissions".to_string(), "Total energy".to_string()];
        assert_eq!(
            ChartRenderer::segment_label(&SegmentValue::CenterOf(1), &labels),
            "Total energy"
        );
        assert_eq!(ChartRenderer::segment_label(&SegmentValue::Last, &labels), "");
    }

    #[test]
    fn empty_overview_is_rejected() {
        let data = ChartData {
            overview: Vec::new(),
            series: Vec::new(),
        };
        assert!(matches!(
            ChartRenderer::render_overview_png(&data, 400, 300),
            Err(ChartError::NoData)
        ));
    }
}
