//! Export module - spreadsheet, document and chart artifacts

pub mod document;
pub mod layout;
pub mod spreadsheet;

use log::info;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use zip::result::ZipError;

use crate::charts::{ChartData, ChartError, ChartImage, ChartRenderer};
use crate::ppt::PptGenerator;
use crate::report::ReportContent;
use layout::PageGeometry;
use spreadsheet::XlsxWriter;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to build archive: {0}")]
    Zip(#[from] ZipError),
    #[error(transparent)]
    Chart(#[from] ChartError),
    #[error("More than one artifact is named {0}")]
    DuplicateFileName(String),
}

/// Output kinds a report can be exported to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportTarget {
    Spreadsheet,
    Document,
    Chart,
}

impl ExportTarget {
    pub const ALL: [ExportTarget; 3] = [
        ExportTarget::Spreadsheet,
        ExportTarget::Document,
        ExportTarget::Chart,
    ];

    pub fn all() -> BTreeSet<ExportTarget> {
        Self::ALL.into_iter().collect()
    }
}

impl fmt::Display for ExportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportTarget::Spreadsheet => "spreadsheet",
            ExportTarget::Document => "document",
            ExportTarget::Chart => "chart",
        };
        f.write_str(name)
    }
}

impl FromStr for ExportTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spreadsheet" | "xlsx" => Ok(ExportTarget::Spreadsheet),
            "document" | "pptx" => Ok(ExportTarget::Document),
            "chart" | "charts" | "png" => Ok(ExportTarget::Chart),
            other => Err(format!(
                "unknown export target '{}' (expected spreadsheet, document or chart)",
                other
            )),
        }
    }
}

/// An artifact rendered in memory, not yet written.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub target: ExportTarget,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// A file written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedFile {
    pub target: ExportTarget,
    pub path: PathBuf,
}

/// `Acme Corp.` -> `acme_corp_`.
pub fn company_slug(company_name: &str) -> String {
    slug(company_name)
}

/// File stem of the report source: `q1.csv` -> `q1`, `sample data` -> `sample_data`.
pub fn source_slug(source: &str) -> String {
    let stem = Path::new(source)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    slug(&stem)
}

fn slug(name: &str) -> String {
    let slug: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if slug.is_empty() {
        "report".to_string()
    } else {
        slug
    }
}

pub struct Exporter {
    output_dir: PathBuf,
    decimals: usize,
    chart_width: u32,
    chart_height: u32,
    geometry: PageGeometry,
}

impl Exporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            decimals: 2,
            chart_width: 1200,
            chart_height: 600,
            geometry: PageGeometry::default(),
        }
    }

    pub fn with_decimals(mut self, decimals: usize) -> Self {
        self.decimals = decimals;
        self
    }

    pub fn with_chart_size(mut self, width: u32, height: u32) -> Self {
        self.chart_width = width;
        self.chart_height = height;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Render every requested artifact in memory. Charts are only drawn when
    /// the chart target is selected; the document then embeds them.
    pub fn render(
        &self,
        content: &ReportContent,
        df: &DataFrame,
        targets: &BTreeSet<ExportTarget>,
    ) -> Result<Vec<Artifact>, ExportError> {
        let metadata = content.metadata();
        let stem = format!(
            "sustainability_report_{}_{}",
            company_slug(&metadata.company_name),
            source_slug(&metadata.source)
        );

        let charts: Vec<ChartImage> = if targets.contains(&ExportTarget::Chart) {
            let data = ChartData::from_report(df, content);
            ChartRenderer::render_all(&data, self.chart_width, self.chart_height)?
        } else {
            Vec::new()
        };

        let mut artifacts = Vec::new();
        for target in targets {
            match target {
                ExportTarget::Spreadsheet => {
                    let row = spreadsheet::report_row(content, self.decimals);
                    artifacts.push(Artifact {
                        target: *target,
                        file_name: format!("{}.xlsx", stem),
                        bytes: XlsxWriter::write_row(&row)?,
                    });
                }
                ExportTarget::Document => {
                    let pages = document::layout_report(content, &charts, self.geometry);
                    let images: Vec<Vec<u8>> = charts.iter().map(|c| c.png.clone()).collect();
                    artifacts.push(Artifact {
                        target: *target,
                        file_name: format!("{}.pptx", stem),
                        bytes: PptGenerator::generate_document(
                            &pages,
                            &images,
                            &self.geometry,
                            &content.title(),
                        )?,
                    });
                }
                ExportTarget::Chart => {
                    artifacts.extend(charts.iter().map(|chart| Artifact {
                        target: *target,
                        file_name: format!("{}_{}", source_slug(&metadata.source), chart.file_name),
                        bytes: chart.png.clone(),
                    }));
                }
            }
        }
        Ok(artifacts)
    }

    /// Render everything first, then write. Nothing touches the disk when
    /// rendering fails.
    pub fn export(
        &self,
        content: &ReportContent,
        df: &DataFrame,
        targets: &BTreeSet<ExportTarget>,
    ) -> Result<Vec<ExportedFile>, ExportError> {
        let artifacts = self.render(content, df, targets)?;
        self.write_all(&artifacts)
    }

    pub fn write_all(&self, artifacts: &[Artifact]) -> Result<Vec<ExportedFile>, ExportError> {
        if artifacts.is_empty() {
            return Ok(Vec::new());
        }

        let mut names = BTreeSet::new();
        if let Some(dup) = artifacts.iter().find(|a| !names.insert(a.file_name.as_str())) {
            return Err(ExportError::DuplicateFileName(dup.file_name.clone()));
        }

        std::fs::create_dir_all(&self.output_dir).map_err(|source| ExportError::Io {
            path: self.output_dir.clone(),
            source,
        })?;

        artifacts
            .iter()
            .map(|artifact| {
                let path = self.output_dir.join(&artifact.file_name);
                std::fs::write(&path, &artifact.bytes).map_err(|source| ExportError::Io {
                    path: path.clone(),
                    source,
                })?;
                info!("Wrote {} to {}", artifact.target, path.display());
                Ok(ExportedFile {
                    target: artifact.target,
                    path,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_target_aliases() {
        assert_eq!("xlsx".parse::<ExportTarget>(), Ok(ExportTarget::Spreadsheet));
        assert_eq!(" Document ".parse::<ExportTarget>(), Ok(ExportTarget::Document));
        assert_eq!("png".parse::<ExportTarget>(), Ok(ExportTarget::Chart));
        assert!("pdf".parse::<ExportTarget>().is_err());
    }

    #[test]
    fn targets_order_spreadsheet_first() {
        let all: Vec<_> = ExportTarget::all().into_iter().collect();
        assert_eq!(all, ExportTarget::ALL.to_vec());
        assert_eq!(ExportTarget::Chart.to_string(), "chart");
    }

    #[test]
    fn slugs_company_names() {
        assert_eq!(company_slug("DemoCo"), "democo");
        assert_eq!(company_slug("Acme Corp."), "acme_corp_");
        assert_eq!(company_slug("  "), "report");
    }

    #[test]
    fn slugs_source_stems() {
        assert_eq!(source_slug("q1.csv"), "q1");
        assert_eq!(source_slug("Q3 2024.xlsx"), "q3_2024");
        assert_eq!(source_slug(crate::data::SAMPLE_SOURCE_NAME), "sample_data");
        assert_eq!(source_slug(""), "report");
    }

    #[test]
    fn duplicate_artifact_names_write_nothing() {
        let dir = std::env::temp_dir().join(format!("esg_export_dup_{}", std::process::id()));
        let artifact = Artifact {
            target: ExportTarget::Chart,
            file_name: "q1_esg_metrics_chart.png".to_string(),
            bytes: vec![0x89],
        };

        let err = Exporter::new(&dir)
            .write_all(&[artifact.clone(), artifact])
            .unwrap_err();
        assert!(matches!(err, ExportError::DuplicateFileName(name) if name == "q1_esg_metrics_chart.png"));
        assert!(!dir.exists());
    }
}
