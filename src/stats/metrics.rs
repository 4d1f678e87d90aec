//! ESG Metrics Engine
//! Validates the required columns, aggregates totals and averages, and
//! assembles the narrative sentence handed to the summarizer.

use log::{info, warn};
use polars::prelude::DataFrame;
use serde::Serialize;
use thiserror::Error;

use super::calculator::{ColumnSummary, StatsCalculator};
use crate::data::DataLoader;
use crate::report::{Clock, ReportContent, ReportMetadata};

pub const EMISSIONS_COLUMN: &str = "Emissions_tCO2";
pub const ENERGY_COLUMN: &str = "Energy_kWh";
pub const WASTE_COLUMN: &str = "Waste_kg";

pub const REQUIRED_COLUMNS: [&str; 3] = [EMISSIONS_COLUMN, ENERGY_COLUMN, WASTE_COLUMN];

pub const DEFAULT_PERIOD_LABEL: &str = "period";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetricsError {
    #[error(
        "Missing required columns: {}. Make sure your file includes: {}",
        .missing.join(", "),
        .required.join(", ")
    )]
    MissingColumns {
        missing: Vec<String>,
        required: Vec<String>,
    },
}

/// A column the engine aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricColumn {
    /// Column name in the dataset
    pub name: String,
    /// Short key used in metric names (`total_<key>`)
    pub key: String,
    pub unit: String,
    pub required: bool,
}

impl MetricColumn {
    pub fn required(name: &str, key: &str, unit: &str) -> Self {
        Self {
            name: name.to_string(),
            key: key.to_string(),
            unit: unit.to_string(),
            required: true,
        }
    }

    /// Extra column aggregated with zero-fill when absent.
    pub fn optional(name: &str) -> Self {
        let key = name
            .trim()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
            .collect();
        Self {
            name: name.trim().to_string(),
            key,
            unit: String::new(),
            required: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<MetricColumn>,
}

impl Default for Schema {
    fn default() -> Self {
        Self::esg()
    }
}

impl Schema {
    /// Emissions, energy and waste, all required.
    pub fn esg() -> Self {
        Self {
            columns: vec![
                MetricColumn::required(EMISSIONS_COLUMN, "emissions", "tCO2"),
                MetricColumn::required(ENERGY_COLUMN, "energy", "kWh"),
                MetricColumn::required(WASTE_COLUMN, "waste", "kg"),
            ],
        }
    }

    pub fn with_optional_columns<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            let column = MetricColumn::optional(name.as_ref());
            if column.name.is_empty() || self.columns.iter().any(|c| c.name == column.name) {
                continue;
            }
            self.columns.push(column);
        }
        self
    }

    pub fn columns(&self) -> &[MetricColumn] {
        &self.columns
    }

    pub fn required(&self) -> impl Iterator<Item = &MetricColumn> {
        self.columns.iter().filter(|c| c.required)
    }

    pub fn required_names(&self) -> Vec<String> {
        self.required().map(|c| c.name.clone()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Total,
    Average,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub key: String,
    pub column: String,
    pub kind: MetricKind,
    pub unit: String,
    pub value: f64,
}

impl Metric {
    pub fn label(&self) -> String {
        format_label(&self.key)
    }
}

/// Ordered metric values: every total, then every average, in schema order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct MetricsResult {
    metrics: Vec<Metric>,
}

impl MetricsResult {
    pub fn get(&self, key: &str) -> Option<f64> {
        self.metrics.iter().find(|m| m.key == key).map(|m| m.value)
    }

    pub fn total(&self, column: &str) -> Option<f64> {
        self.find(column, MetricKind::Total)
    }

    pub fn average(&self, column: &str) -> Option<f64> {
        self.find(column, MetricKind::Average)
    }

    fn find(&self, column: &str, kind: MetricKind) -> Option<f64> {
        self.metrics
            .iter()
            .find(|m| m.column == column && m.kind == kind)
            .map(|m| m.value)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Metric> {
        self.metrics.iter()
    }

    pub fn totals(&self) -> impl Iterator<Item = &Metric> {
        self.metrics.iter().filter(|m| m.kind == MetricKind::Total)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

impl<'a> IntoIterator for &'a MetricsResult {
    type Item = &'a Metric;
    type IntoIter = std::slice::Iter<'a, Metric>;

    fn into_iter(self) -> Self::IntoIter {
        self.metrics.iter()
    }
}

/// Single-pass transform from a dataset to report content.
#[derive(Debug, Clone)]
pub struct MetricsEngine {
    schema: Schema,
    period_label: String,
}

impl MetricsEngine {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            period_label: DEFAULT_PERIOD_LABEL.to_string(),
        }
    }

    pub fn esg() -> Self {
        Self::new(Schema::esg())
    }

    /// Word used in "This <period>, ...", e.g. "quarter".
    pub fn with_period_label(mut self, label: impl Into<String>) -> Self {
        self.period_label = label.into();
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Fail with every missing required column, in schema order.
    pub fn validate(&self, df: &DataFrame) -> Result<(), MetricsError> {
        let present = DataLoader::column_names(df);
        let missing: Vec<String> = self
            .schema
            .required()
            .filter(|c| !present.contains(&c.name))
            .map(|c| c.name.clone())
            .collect();

        if missing.is_empty() {
            return Ok(());
        }

        warn!("Dataset is missing required columns: {}", missing.join(", "));
        Err(MetricsError::MissingColumns {
            missing,
            required: self.schema.required_names(),
        })
    }

    /// Sum and mean of every schema column.
    ///
    /// An absent column is read as a single zero, so optional columns never
    /// fail the report; required ones are gated by [`MetricsEngine::validate`].
    pub fn aggregate(&self, df: &DataFrame) -> MetricsResult {
        let mut totals = Vec::with_capacity(self.schema.columns().len() * 2);
        let mut averages = Vec::with_capacity(self.schema.columns().len());

        for column in self.schema.columns() {
            let values = DataLoader::column_values(df, &column.name).unwrap_or_else(|| {
                warn!("Column {} not found, using a zero-filled series", column.name);
                vec![0.0]
            });

            totals.push(Metric {
                key: format!("total_{}", column.key),
                column: column.name.clone(),
                kind: MetricKind::Total,
                unit: column.unit.clone(),
                value: StatsCalculator::sum(&values),
            });
            averages.push(Metric {
                key: format!("avg_{}", column.key),
                column: column.name.clone(),
                kind: MetricKind::Average,
                unit: column.unit.clone(),
                value: StatsCalculator::mean(&values),
            });
        }

        totals.extend(averages);
        MetricsResult { metrics: totals }
    }

    /// Descriptive statistics for the schema columns present in `df`.
    pub fn describe(&self, df: &DataFrame) -> Vec<ColumnSummary> {
        self.schema
            .columns()
            .iter()
            .filter_map(|c| {
                DataLoader::column_values(df, &c.name)
                    .map(|values| StatsCalculator::compute_descriptive_stats(&c.name, &values))
            })
            .collect()
    }

    /// The sentence handed to the summarizer: emissions, energy, then waste.
    pub fn narrative(&self, company_name: &str, metrics: &MetricsResult) -> String {
        let total = |column: &str| format_quantity(metrics.total(column).unwrap_or(0.0));
        format!(
            "This {}, {} produced {} tCO2 emissions, consumed {} kWh energy, and generated {} kg waste.",
            self.period_label,
            company_name,
            total(EMISSIONS_COLUMN),
            total(ENERGY_COLUMN),
            total(WASTE_COLUMN),
        )
    }

    /// Validate, aggregate, describe and narrate in one pass.
    pub fn assemble(
        &self,
        df: &DataFrame,
        company_name: &str,
        source: &str,
        clock: &dyn Clock,
    ) -> Result<ReportContent, MetricsError> {
        self.validate(df)?;

        let metrics = self.aggregate(df);
        let statistics = self.describe(df);
        let narrative = self.narrative(company_name, &metrics);

        info!(
            "Aggregated {} metrics over {} rows from {}",
            metrics.len(),
            df.height(),
            source
        );

        let metadata = ReportMetadata {
            company_name: company_name.to_string(),
            generated_at: clock.now(),
            source: source.to_string(),
            row_count: df.height(),
        };
        Ok(ReportContent::new(metadata, metrics, narrative, statistics))
    }
}

/// `total_emissions` -> `Total emissions`.
pub fn format_label(key: &str) -> String {
    let spaced: String = key
        .chars()
        .map(|c| if c == '_' || c == '-' { ' ' } else { c })
        .collect();
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Integral values print without a decimal point; others with up to two decimals.
pub fn format_quantity(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{:.0}", value);
    }
    let fixed = format!("{:.2}", value);
    fixed.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Group the integer part with commas: `13800` -> `13,800`, `1093.333` -> `1,093.33`.
pub fn format_thousands(value: f64) -> String {
    let decimals = if value.fract() == 0.0 { 0 } else { 2 };
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_replace_separators_and_capitalize() {
        assert_eq!(format_label("total_emissions"), "Total emissions");
        assert_eq!(format_label("avg-energy"), "Avg energy");
        assert_eq!(format_label(""), "");
    }

    #[test]
    fn quantities() {
        assert_eq!(format_quantity(3280.0), "3280");
        assert_eq!(format_quantity(1093.3333), "1093.33");
        assert_eq!(format_quantity(12.5), "12.5");
        assert_eq!(format_quantity(0.0), "0");
    }

    #[test]
    fn thousands_separators() {
        assert_eq!(format_thousands(3280.0), "3,280");
        assert_eq!(format_thousands(41000.0), "41,000");
        assert_eq!(format_thousands(1093.3333), "1,093.33");
        assert_eq!(format_thousands(320.0), "320");
        assert_eq!(format_thousands(-1234567.0), "-1,234,567");
    }

    #[test]
    fn optional_column_keys() {
        let schema = Schema::esg().with_optional_columns(["Water m3", "Energy_kWh", ""]);
        assert_eq!(schema.columns().len(), 4);
        assert_eq!(schema.columns()[3].key, "water_m3");
        assert!(!schema.columns()[3].required);
        assert_eq!(schema.required_names(), REQUIRED_COLUMNS.to_vec());
    }
}
