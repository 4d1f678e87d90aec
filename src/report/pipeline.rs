//! Report pipeline: load -> validate -> aggregate -> assemble -> summarize -> export.

use log::info;
use polars::prelude::DataFrame;
use thiserror::Error;

use super::{Clock, ReportContent, Summarizer, SummarizerError};
use crate::config::ReportConfig;
use crate::data::{DataLoader, InputSource, LoaderError, SAMPLE_SOURCE_NAME};
use crate::export::{ExportError, ExportedFile, Exporter};
use crate::stats::{MetricsEngine, MetricsError, Schema};

#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error(transparent)]
    Metrics(#[from] MetricsError),
    #[error("Summarization failed: {0}")]
    Summarizer(#[from] SummarizerError),
    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
}

/// Content of a finished report and the files it was written to.
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub content: ReportContent,
    pub files: Vec<ExportedFile>,
}

pub struct ReportPipeline<'a> {
    config: &'a ReportConfig,
    summarizer: &'a dyn Summarizer,
    clock: &'a dyn Clock,
}

impl<'a> ReportPipeline<'a> {
    pub fn new(config: &'a ReportConfig, summarizer: &'a dyn Summarizer, clock: &'a dyn Clock) -> Self {
        Self {
            config,
            summarizer,
            clock,
        }
    }

    pub fn engine(&self) -> MetricsEngine {
        let schema = Schema::esg().with_optional_columns(&self.config.optional_columns);
        MetricsEngine::new(schema).with_period_label(&self.config.period_label)
    }

    /// Load and assemble; no summary and nothing written.
    pub fn analyze(&self, input: Option<&InputSource>) -> Result<(DataFrame, ReportContent), ReportError> {
        let df = DataLoader::load_or_sample(input)?;
        let source = input.map(|s| s.name.as_str()).unwrap_or(SAMPLE_SOURCE_NAME);
        let content = self
            .engine()
            .assemble(&df, &self.config.company_name, source, self.clock)?;
        Ok((df, content))
    }

    /// Full run. Any failure stops the attempt before a file is written.
    pub fn run(&self, input: Option<&InputSource>) -> Result<ReportOutcome, ReportError> {
        let (df, content) = self.analyze(input)?;

        let summary = self
            .summarizer
            .summarize(content.narrative(), self.config.summary)?;
        let content = content.with_summary(summary);

        let exporter = Exporter::new(&self.config.output_dir)
            .with_decimals(self.config.decimals)
            .with_chart_size(self.config.chart.width, self.config.chart.height);
        let files = exporter.export(&content, &df, &self.config.export_targets)?;

        info!(
            "Report for {} complete: {} file(s) written",
            content.metadata().company_name,
            files.len()
        );
        Ok(ReportOutcome { content, files })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{FixedClock, PassthroughSummarizer, SummaryBounds};
    use chrono::{Local, TimeZone};
    use std::collections::BTreeSet;

    struct FailingSummarizer;

    impl Summarizer for FailingSummarizer {
        fn summarize(&self, _text: &str, _bounds: SummaryBounds) -> Result<String, SummarizerError> {
            Err(SummarizerError::EmptyOutput("test".to_string()))
        }
    }

    fn clock() -> FixedClock {
        FixedClock(Local.with_ymd_and_hms(2024, 3, 31, 12, 0, 0).unwrap())
    }

    #[test]
    fn analyze_uses_sample_without_input() {
        let config = ReportConfig::default();
        let clock = clock();
        let pipeline = ReportPipeline::new(&config, &PassthroughSummarizer, &clock);
        let (df, content) = pipeline.analyze(None).unwrap();
        assert_eq!(df.height(), 3);
        assert_eq!(content.metadata().source, SAMPLE_SOURCE_NAME);
        assert_eq!(content.metrics().get("total_emissions"), Some(3280.0));
        assert!(content.summary().is_none());
    }

    #[test]
    fn period_label_reaches_the_narrative() {
        let config = ReportConfig {
            period_label: "quarter".to_string(),
            ..ReportConfig::default()
        };
        let clock = clock();
        let pipeline = ReportPipeline::new(&config, &PassthroughSummarizer, &clock);
        let (_, content) = pipeline.analyze(None).unwrap();
        assert!(content.narrative().starts_with("This quarter, DemoCo produced"));
    }

    #[test]
    fn summarizer_failure_stops_the_run() {
        let dir = std::env::temp_dir().join(format!("esg_pipeline_fail_{}", std::process::id()));
        let config = ReportConfig {
            output_dir: dir.clone(),
            export_targets: BTreeSet::from([crate::export::ExportTarget::Spreadsheet]),
            ..ReportConfig::default()
        };
        let clock = clock();
        let pipeline = ReportPipeline::new(&config, &FailingSummarizer, &clock);
        let result = pipeline.run(None);
        assert!(matches!(result, Err(ReportError::Summarizer(_))));
        assert!(!dir.exists());
    }
}
