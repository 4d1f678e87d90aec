//! Stats module - aggregation and descriptive statistics

mod calculator;
mod metrics;

pub use calculator::{ColumnSummary, StatsCalculator};
pub use metrics::{
    format_label, format_quantity, format_thousands, Metric, MetricColumn, MetricKind,
    MetricsEngine, MetricsError, MetricsResult, Schema, DEFAULT_PERIOD_LABEL, EMISSIONS_COLUMN,
    ENERGY_COLUMN, REQUIRED_COLUMNS, WASTE_COLUMN,
};
