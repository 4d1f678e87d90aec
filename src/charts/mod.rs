//! Charts module - Chart data and PNG rendering

mod renderer;

pub use renderer::{ChartError, ChartImage, ChartRenderer};

use polars::prelude::DataFrame;

use crate::data::DataLoader;
use crate::report::ReportContent;
use crate::stats::format_label;

/// One bar of the metrics overview.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

/// Row-by-row values of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSeries {
    pub column: String,
    pub title: String,
    pub values: Vec<f64>,
}

/// Everything the renderer needs, independent of the drawing backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub overview: Vec<Bar>,
    pub series: Vec<ColumnSeries>,
}

impl ChartData {
    /// Totals as overview bars plus per-row series for every aggregated
    /// column present in the dataset.
    pub fn from_report(df: &DataFrame, content: &ReportContent) -> Self {
        let totals: Vec<_> = content.metrics().totals().collect();

        let overview = totals
            .iter()
            .map(|m| Bar {
                label: m.label(),
                value: m.value,
            })
            .collect();

        let series = totals
            .iter()
            .filter_map(|m| {
                let values = DataLoader::column_values(df, &m.column)?;
                let key = m.key.strip_prefix("total_").unwrap_or(&m.key);
                Some(ColumnSeries {
                    column: m.column.clone(),
                    title: Self::series_title(key, &m.column),
                    values,
                })
            })
            .collect();

        Self { overview, series }
    }

    fn series_title(key: &str, column: &str) -> String {
        match key {
            "emissions" => "Emissions".to_string(),
            "energy" => "Energy Use".to_string(),
            "waste" => "Waste Generated".to_string(),
            _ => format_label(column),
        }
    }
}
