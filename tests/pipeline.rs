//! End-to-end pipeline tests with a fixed clock and in-process summarizers.

use chrono::{Local, TimeZone};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::path::PathBuf;

use esg_report::config::ReportConfig;
use esg_report::data::{DataLoader, InputSource, LoaderError};
use esg_report::export::ExportTarget;
use esg_report::report::{
    FixedClock, PassthroughSummarizer, ReportError, ReportHistory, ReportPipeline, Summarizer,
    SummarizerError, SummaryBounds,
};
use esg_report::stats::MetricsError;

/// Records what it was asked and answers with a canned summary.
struct RecordingSummarizer {
    calls: RefCell<Vec<(String, SummaryBounds)>>,
}

impl Summarizer for RecordingSummarizer {
    fn summarize(&self, text: &str, bounds: SummaryBounds) -> Result<String, SummarizerError> {
        self.calls.borrow_mut().push((text.to_string(), bounds));
        Ok("Emissions fell while energy use held steady.".to_string())
    }
}

fn clock() -> FixedClock {
    FixedClock(Local.with_ymd_and_hms(2025, 1, 15, 8, 0, 0).unwrap())
}

fn scratch_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("esg_pipeline_{}_{}", name, std::process::id()))
}

fn spreadsheet_only(dir: PathBuf) -> ReportConfig {
    ReportConfig {
        output_dir: dir,
        export_targets: BTreeSet::from([ExportTarget::Spreadsheet]),
        ..ReportConfig::default()
    }
}

#[test]
fn summary_is_attached_and_bounds_forwarded() {
    let dir = scratch_dir("summary");
    let config = ReportConfig {
        summary: SummaryBounds {
            min_length: 10,
            max_length: 60,
        },
        ..spreadsheet_only(dir.clone())
    };
    let summarizer = RecordingSummarizer {
        calls: RefCell::new(Vec::new()),
    };
    let clock = clock();

    let outcome = ReportPipeline::new(&config, &summarizer, &clock)
        .run(None)
        .unwrap();

    let calls = summarizer.calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, outcome.content.narrative());
    assert_eq!(calls[0].1.max_length, 60);
    assert_eq!(
        outcome.content.summary(),
        Some("Emissions fell while energy use held steady.")
    );
    assert_eq!(outcome.files.len(), 1);
    assert!(outcome.files[0].path.ends_with("sustainability_report_democo_sample_data.xlsx"));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn history_lists_newest_first() {
    let dir = scratch_dir("history");
    let config = spreadsheet_only(dir.clone());
    let clock = clock();
    let pipeline = ReportPipeline::new(&config, &PassthroughSummarizer, &clock);

    let q1 = InputSource::new(
        "q1.csv",
        b"Emissions_tCO2,Energy_kWh,Waste_kg\n500,6000,120\n".to_vec(),
    );
    let q2 = InputSource::new(
        "q2.json",
        br#"[{"Emissions_tCO2": 450, "Energy_kWh": 5800, "Waste_kg": 110}]"#.to_vec(),
    );

    let mut history = ReportHistory::default();
    for source in [&q1, &q2] {
        history.push(pipeline.run(Some(source)).unwrap().content);
    }

    let sources: Vec<&str> = history
        .iter_newest_first()
        .map(|c| c.metadata().source.as_str())
        .collect();
    assert_eq!(sources, vec!["q2.json", "q1.csv"]);
    assert_eq!(history.latest().unwrap().metrics().get("total_emissions"), Some(450.0));
    assert_eq!(history.len(), 2);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn each_input_keeps_its_own_report_file() {
    let dir = scratch_dir("per_input");
    let config = spreadsheet_only(dir.clone());
    let clock = clock();
    let pipeline = ReportPipeline::new(&config, &PassthroughSummarizer, &clock);

    let q1 = InputSource::new(
        "q1.csv",
        b"Emissions_tCO2,Energy_kWh,Waste_kg\n500,6000,120\n".to_vec(),
    );
    let q2 = InputSource::new(
        "q2.csv",
        b"Emissions_tCO2,Energy_kWh,Waste_kg\n450,5800,110\n".to_vec(),
    );

    let first = pipeline.run(Some(&q1)).unwrap();
    let second = pipeline.run(Some(&q2)).unwrap();
    let first_path = &first.files[0].path;
    let second_path = &second.files[0].path;
    assert_ne!(first_path, second_path);
    assert!(first_path.ends_with("sustainability_report_democo_q1.xlsx"));
    assert!(second_path.ends_with("sustainability_report_democo_q2.xlsx"));

    // The first report survives the second run
    let reread = DataLoader::load_path(first_path, None).unwrap();
    assert_eq!(
        DataLoader::column_values(&reread, "total_emissions"),
        Some(vec![500.0])
    );

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn unsupported_format_writes_nothing() {
    let dir = scratch_dir("unsupported");
    let config = spreadsheet_only(dir.clone());
    let clock = clock();
    let source = InputSource::new("notes.txt", b"hello".to_vec());

    let err = ReportPipeline::new(&config, &PassthroughSummarizer, &clock)
        .run(Some(&source))
        .unwrap_err();

    assert!(matches!(
        err,
        ReportError::Loader(LoaderError::UnsupportedFormat(_))
    ));
    assert!(!dir.exists());
}

#[test]
fn missing_columns_write_nothing() {
    let dir = scratch_dir("missing");
    let config = spreadsheet_only(dir.clone());
    let clock = clock();
    let source = InputSource::new("partial.csv", b"Emissions_tCO2,Waste_kg\n1,2\n".to_vec());

    let err = ReportPipeline::new(&config, &PassthroughSummarizer, &clock)
        .run(Some(&source))
        .unwrap_err();

    match err {
        ReportError::Metrics(MetricsError::MissingColumns { missing, .. }) => {
            assert_eq!(missing, vec!["Energy_kWh".to_string()]);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(!dir.exists());
}

#[test]
fn format_hint_overrides_the_name() {
    let dir = scratch_dir("hint");
    let config = spreadsheet_only(dir.clone());
    let clock = clock();
    let source = InputSource::new(
        "upload.bin",
        b"Emissions_tCO2,Energy_kWh,Waste_kg\n1,2,3\n".to_vec(),
    )
    .with_format_hint("text/csv");

    let (df, content) = ReportPipeline::new(&config, &PassthroughSummarizer, &clock)
        .analyze(Some(&source))
        .unwrap();
    assert_eq!(df.height(), 1);
    assert_eq!(content.metrics().get("total_waste"), Some(3.0));
    assert!(!dir.exists());
}
