//! Report module - assembled report content and the pipeline around it

mod history;
mod pipeline;
mod summarizer;

pub use history::ReportHistory;
pub use pipeline::{ReportError, ReportOutcome, ReportPipeline};
pub use summarizer::{
    CommandSummarizer, PassthroughSummarizer, Summarizer, SummarizerError, SummaryBounds,
};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::stats::{ColumnSummary, MetricsResult};

/// Source of the report timestamp.
pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportMetadata {
    pub company_name: String,
    pub generated_at: DateTime<Local>,
    /// File name of the input, or the sample-data marker
    pub source: String,
    pub row_count: usize,
}

/// Metrics, narrative and metadata ready for export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportContent {
    metadata: ReportMetadata,
    metrics: MetricsResult,
    narrative: String,
    summary: Option<String>,
    statistics: Vec<ColumnSummary>,
}

impl ReportContent {
    pub fn new(
        metadata: ReportMetadata,
        metrics: MetricsResult,
        narrative: String,
        statistics: Vec<ColumnSummary>,
    ) -> Self {
        Self {
            metadata,
            metrics,
            narrative,
            summary: None,
            statistics,
        }
    }

    pub fn with_summary(self, summary: impl Into<String>) -> Self {
        Self {
            summary: Some(summary.into()),
            ..self
        }
    }

    pub fn metadata(&self) -> &ReportMetadata {
        &self.metadata
    }

    pub fn metrics(&self) -> &MetricsResult {
        &self.metrics
    }

    pub fn narrative(&self) -> &str {
        &self.narrative
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// The summary when one was produced, the raw narrative otherwise.
    pub fn summary_or_narrative(&self) -> &str {
        self.summary().unwrap_or(&self.narrative)
    }

    pub fn statistics(&self) -> &[ColumnSummary] {
        &self.statistics
    }

    pub fn title(&self) -> String {
        format!("Sustainability Report \u{2013} {}", self.metadata.company_name)
    }

    pub fn date_label(&self) -> String {
        self.metadata.generated_at.format("%Y-%m-%d").to_string()
    }
}
