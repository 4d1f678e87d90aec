//! ESG Report - command line front end
//!
//! Generates one sustainability report per input file (or one from the
//! built-in sample when no file is given).

use anyhow::{bail, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command, ValueHint};
use log::{info, LevelFilter};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use esg_report::config::ReportConfig;
use esg_report::data::InputSource;
use esg_report::export::{source_slug, ExportTarget, ExportedFile};
use esg_report::report::{
    CommandSummarizer, PassthroughSummarizer, ReportContent, ReportHistory, ReportPipeline,
    Summarizer, SystemClock,
};

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Error)
        .parse_env(env_logger::Env::default().filter_or("ESG_REPORT_LOG", "error,esg_report=info"))
        .init();

    let matches = cli().get_matches();
    let config = build_config(&matches)?;

    let command_summarizer = CommandSummarizer::from_command_line(&config.summarizer_command);
    let summarizer: &dyn Summarizer = match &command_summarizer {
        Some(summarizer) => summarizer,
        None => &PassthroughSummarizer,
    };
    let clock = SystemClock;
    let pipeline = ReportPipeline::new(&config, summarizer, &clock);

    let format = matches.get_one::<String>("format");
    let inputs: Vec<PathBuf> = matches
        .get_many::<PathBuf>("input")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    // Report file names carry the input stem; two inputs sharing one would overwrite each other
    let mut stems: BTreeMap<String, &PathBuf> = BTreeMap::new();
    for path in &inputs {
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        if let Some(previous) = stems.insert(source_slug(&name), path) {
            bail!(
                "Inputs {} and {} would write the same report files",
                previous.display(),
                path.display()
            );
        }
    }

    let mut history = ReportHistory::default();
    let mut written: Vec<ExportedFile> = Vec::new();

    if inputs.is_empty() {
        let outcome = pipeline
            .run(None)
            .context("Failed to generate report from sample data")?;
        written.extend(outcome.files);
        history.push(outcome.content);
    }

    for path in &inputs {
        let mut source = InputSource::from_path(path)
            .with_context(|| format!("Failed to read input: {}", path.display()))?;
        if let Some(format) = format {
            source = source.with_format_hint(format.as_str());
        }
        let outcome = pipeline
            .run(Some(&source))
            .with_context(|| format!("Failed to generate report for {}", path.display()))?;
        written.extend(outcome.files);
        history.push(outcome.content);
    }

    if matches.get_flag("json") {
        let json = serde_json::to_string_pretty(&history).context("Failed to serialize reports")?;
        println!("{}", json);
    } else {
        for (idx, content) in history.iter_newest_first().enumerate() {
            if idx > 0 {
                println!();
            }
            print_report(content);
        }
        if !written.is_empty() {
            println!();
            println!("Files:");
            for file in &written {
                println!("  {:<12} {}", file.target.to_string(), file.path.display());
            }
        }
    }

    if matches.get_flag("open") {
        if let Some(document) = written.iter().rev().find(|f| f.target == ExportTarget::Document) {
            info!("Opening {}", document.path.display());
            open::that(&document.path)
                .with_context(|| format!("Failed to open {}", document.path.display()))?;
        }
    }

    Ok(())
}

fn cli() -> Command {
    Command::new("esg_report")
        .version(clap::crate_version!())
        .about("\u{1F331} ESG Report - Sustainability metrics, narrative and report export")
        .arg(
            Arg::new("input")
                .help("CSV, XLSX or JSON datasets. Uses the built-in sample when omitted.")
                .num_args(0..)
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Path to a JSON report configuration file")
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("company")
                .long("company")
                .help("Company name used in the narrative and titles. Overrides the config file.")
                .value_parser(clap::builder::NonEmptyStringValueParser::new()),
        )
        .arg(
            Arg::new("targets")
                .short('t')
                .long("targets")
                .help("Export targets: spreadsheet, document, chart. Defaults to all three.")
                .value_delimiter(',')
                .action(ArgAction::Append)
                .value_parser(clap::value_parser!(ExportTarget)),
        )
        .arg(
            Arg::new("output_dir")
                .short('o')
                .long("output-dir")
                .help("Directory the report files are written to")
                .value_parser(clap::value_parser!(PathBuf))
                .value_hint(ValueHint::DirPath),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .help("Input format hint (extension or media type) overriding the file extension")
                .value_parser(clap::builder::NonEmptyStringValueParser::new()),
        )
        .arg(
            Arg::new("period")
                .long("period")
                .help("Reporting period word used in the narrative, e.g. quarter")
                .value_parser(clap::builder::NonEmptyStringValueParser::new()),
        )
        .arg(
            Arg::new("summarizer_cmd")
                .long("summarizer-cmd")
                .help(
                    "External summarizer command. Receives the narrative on stdin and \
                     prints the summary on stdout.",
                )
                .value_parser(clap::builder::NonEmptyStringValueParser::new()),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the generated reports as JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("open")
                .long("open")
                .help("Open the generated document with the default application")
                .action(ArgAction::SetTrue),
        )
}

/// Config file first, then command-line overrides.
fn build_config(matches: &ArgMatches) -> Result<ReportConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => ReportConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => ReportConfig::default(),
    };

    if let Some(company) = matches.get_one::<String>("company") {
        config.company_name = company.clone();
    }
    if let Some(targets) = matches.get_many::<ExportTarget>("targets") {
        config.export_targets = targets.copied().collect::<BTreeSet<_>>();
    }
    if let Some(dir) = matches.get_one::<PathBuf>("output_dir") {
        config.output_dir = dir.clone();
    }
    if let Some(period) = matches.get_one::<String>("period") {
        config.period_label = period.clone();
    }
    if let Some(command) = matches.get_one::<String>("summarizer_cmd") {
        config.summarizer_command = command.split_whitespace().map(String::from).collect();
    }

    config.validate().context("Invalid report configuration")?;
    Ok(config)
}

fn print_report(content: &ReportContent) {
    let metadata = content.metadata();
    println!("{}", content.title());
    println!("Date: {}  Source: {}  Rows: {}", content.date_label(), metadata.source, metadata.row_count);
    for metric in content.metrics() {
        println!(
            "  {}: {} {}",
            metric.label(),
            esg_report::stats::format_thousands(metric.value),
            metric.unit
        );
    }
    println!("Summary: {}", content.summary_or_narrative());
}
