//! Report Document
//! Lays the report out page by page: title, date, metrics list, summary,
//! descriptive statistics and any rendered charts.

use super::layout::{DocumentLayout, Page, PageGeometry};
use crate::charts::ChartImage;
use crate::report::ReportContent;
use crate::stats::{format_label, format_quantity, format_thousands};

const TITLE_SIZE: f64 = 22.0;
const HEADING_SIZE: f64 = 16.0;
const BODY_SIZE: f64 = 11.0;

pub fn layout_report(content: &ReportContent, charts: &[ChartImage], geometry: PageGeometry) -> Vec<Page> {
    let mut layout = DocumentLayout::new(geometry);

    layout.heading(&content.title(), TITLE_SIZE);
    layout.line(&format!("Date: {}", content.date_label()), BODY_SIZE);
    layout.line(&format!("Source: {}", content.metadata().source), BODY_SIZE);
    layout.spacer(BODY_SIZE);

    layout.heading("Key ESG Metrics", HEADING_SIZE);
    for metric in content.metrics() {
        let unit = if metric.unit.is_empty() {
            String::new()
        } else {
            format!(" {}", metric.unit)
        };
        layout.line(
            &format!("{}: {}{}", metric.label(), format_thousands(metric.value), unit),
            BODY_SIZE,
        );
    }
    layout.spacer(BODY_SIZE);

    layout.heading("Analysis Summary", HEADING_SIZE);
    layout.paragraph(content.summary_or_narrative(), BODY_SIZE);
    layout.spacer(BODY_SIZE);

    if !content.statistics().is_empty() {
        layout.heading("Descriptive Statistics", HEADING_SIZE);
        for summary in content.statistics() {
            layout.line(&format_label(&summary.column), BODY_SIZE);
            layout.paragraph(
                &format!(
                    "count {}, mean {}, std {}, min {}, 25% {}, median {}, 75% {}, max {}",
                    summary.count,
                    format_quantity(summary.mean),
                    format_quantity(summary.std),
                    format_quantity(summary.min),
                    format_quantity(summary.p25),
                    format_quantity(summary.median),
                    format_quantity(summary.p75),
                    format_quantity(summary.max),
                ),
                BODY_SIZE,
            );
        }
    }

    for (index, chart) in charts.iter().enumerate() {
        layout.spacer(BODY_SIZE);
        layout.image(index, chart.aspect_ratio());
    }

    layout.finish()
}
