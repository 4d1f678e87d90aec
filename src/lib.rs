//! ESG Report - Sustainability metrics and report generation
//!
//! Loads an Emissions/Energy/Waste dataset, aggregates it into totals and
//! averages, writes a narrative sentence and exports the report as a
//! spreadsheet, a paged PPTX document and PNG charts.

pub mod charts;
pub mod config;
pub mod data;
pub mod export;
pub mod ppt;
pub mod report;
pub mod stats;

mod package;
mod xml;
