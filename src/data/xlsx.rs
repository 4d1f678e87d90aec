//! XLSX Worksheet Reader
//! Reads the first worksheet of an Office Open XML workbook directly from the
//! ZIP container, the same way `ppt.rs` writes presentations.

use polars::prelude::{Column, DataFrame, NamedFrom, PolarsError};
use std::io::{Cursor, Read, Seek};
use thiserror::Error;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::xml;

/// Last column a worksheet may address (`XFD`).
const MAX_COLUMN_INDEX: usize = 16_383;

#[derive(Error, Debug)]
pub enum XlsxError {
    #[error("not a valid XLSX container: {0}")]
    Zip(#[from] ZipError),
    #[error("failed to read workbook part: {0}")]
    Io(#[from] std::io::Error),
    #[error("workbook contains no worksheet")]
    MissingWorksheet,
    #[error("worksheet has no header row")]
    MissingHeader,
    #[error("invalid cell reference '{0}'")]
    InvalidCellReference(String),
    #[error(transparent)]
    Polars(#[from] PolarsError),
}

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

/// Parse the first worksheet; the first non-empty row is the header.
pub fn read_first_sheet(bytes: &[u8]) -> Result<DataFrame, XlsxError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let shared = match read_part(&mut archive, "xl/sharedStrings.xml") {
        Ok(xml) => parse_shared_strings(&xml),
        Err(XlsxError::Zip(ZipError::FileNotFound)) => Vec::new(),
        Err(e) => return Err(e),
    };

    let sheet = match workbook_first_sheet(&mut archive) {
        Some(sheet) => sheet,
        None => first_worksheet_by_name(&archive).ok_or(XlsxError::MissingWorksheet)?,
    };
    let sheet_xml = read_part(&mut archive, &sheet)?;
    build_frame(parse_rows(&sheet_xml, &shared)?)
}

fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<String, XlsxError> {
    let mut file = archive.by_name(name)?;
    let mut xml = String::new();
    file.read_to_string(&mut xml)?;
    Ok(xml)
}

/// First `<sheet>` of `xl/workbook.xml`, resolved through the workbook
/// relationships. `None` when either part is missing or does not resolve.
fn workbook_first_sheet<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Option<String> {
    let workbook = read_part(archive, "xl/workbook.xml").ok()?;
    let rels = read_part(archive, "xl/_rels/workbook.xml.rels").ok()?;
    let part = sheet_part(&workbook, &rels)?;
    archive.by_name(&part).ok()?;
    Some(part)
}

fn sheet_part(workbook: &str, rels: &str) -> Option<String> {
    let rel_id = xml::elements(workbook, "sheet").next()?.attr("r:id")?;
    let target = xml::elements(rels, "Relationship")
        .find(|rel| rel.attr("Id") == Some(rel_id))?
        .attr("Target")?;

    // Targets are relative to `xl/` unless rooted at the package
    Some(match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target),
    })
}

/// Fallback for workbooks without usable relationships: lowest sheet number.
fn first_worksheet_by_name<R: Read + Seek>(archive: &ZipArchive<R>) -> Option<String> {
    archive
        .file_names()
        .filter(|n| n.starts_with("xl/worksheets/") && n.ends_with(".xml") && !n.contains("_rels"))
        .min_by(|a, b| (sheet_number(a), *a).cmp(&(sheet_number(b), *b)))
        .map(|s| s.to_string())
}

fn sheet_number(name: &str) -> usize {
    let digits: String = name
        .trim_end_matches(".xml")
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.chars().rev().collect::<String>().parse().unwrap_or(usize::MAX)
}

fn parse_shared_strings(xml: &str) -> Vec<String> {
    xml::elements(xml, "si")
        .map(|si| text_runs(si.body.unwrap_or_default()))
        .collect()
}

fn text_runs(body: &str) -> String {
    xml::elements(body, "t")
        .filter_map(|t| t.body)
        .map(xml::unescape)
        .collect()
}

fn parse_rows(xml: &str, shared: &[String]) -> Result<Vec<Vec<Cell>>, XlsxError> {
    xml::elements(xml, "row")
        .map(|row| {
            let mut cells: Vec<Cell> = Vec::new();
            for cell in xml::elements(row.body.unwrap_or_default(), "c") {
                let index = match cell.attr("r") {
                    Some(reference) => column_index(reference)?.unwrap_or(cells.len()),
                    None => cells.len(),
                };
                if index > MAX_COLUMN_INDEX {
                    return Err(XlsxError::InvalidCellReference(
                        cell.attr("r").unwrap_or_default().to_string(),
                    ));
                }
                if index >= cells.len() {
                    cells.resize(index + 1, Cell::Empty);
                }
                cells[index] = parse_cell(&cell, shared);
            }
            Ok(cells)
        })
        .collect()
}

fn parse_cell(cell: &xml::Element<'_>, shared: &[String]) -> Cell {
    let body = cell.body.unwrap_or_default();
    let value = xml::elements(body, "v")
        .next()
        .and_then(|v| v.body)
        .map(xml::unescape);

    match cell.attr("t") {
        Some("s") => value
            .and_then(|v| v.trim().parse::<usize>().ok())
            .and_then(|i| shared.get(i).cloned())
            .map(Cell::Text)
            .unwrap_or(Cell::Empty),
        Some("inlineStr") => Cell::Text(text_runs(body)),
        Some("str") | Some("e") => value.map(Cell::Text).unwrap_or(Cell::Empty),
        Some("b") => value
            .map(|v| Cell::Number(if v.trim() == "1" { 1.0 } else { 0.0 }))
            .unwrap_or(Cell::Empty),
        _ => match value {
            Some(v) => match v.trim().parse::<f64>() {
                Ok(n) => Cell::Number(n),
                Err(_) => Cell::Text(v),
            },
            None => Cell::Empty,
        },
    }
}

/// Zero-based column index from a cell reference such as `AB12`.
///
/// `Ok(None)` when the reference has no column letters; an error when the
/// letters address a column past `XFD`.
fn column_index(reference: &str) -> Result<Option<usize>, XlsxError> {
    let invalid = || XlsxError::InvalidCellReference(reference.to_string());
    let letters = reference.bytes().take_while(|b| b.is_ascii_alphabetic());

    let mut index: Option<usize> = None;
    for b in letters {
        let digit = (b.to_ascii_uppercase() - b'A' + 1) as usize;
        let next = index
            .unwrap_or(0)
            .checked_mul(26)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(invalid)?;
        if next - 1 > MAX_COLUMN_INDEX {
            return Err(invalid());
        }
        index = Some(next);
    }
    Ok(index.map(|i| i - 1))
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn build_frame(rows: Vec<Vec<Cell>>) -> Result<DataFrame, XlsxError> {
    let mut rows = rows
        .into_iter()
        .filter(|row| row.iter().any(|c| *c != Cell::Empty));
    let header = rows.next().ok_or(XlsxError::MissingHeader)?;
    let body: Vec<Vec<Cell>> = rows.collect();

    let names: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(i, cell)| match cell {
            Cell::Text(t) if !t.trim().is_empty() => t.trim().to_string(),
            Cell::Number(n) => format_number(*n),
            _ => format!("Unnamed: {}", i),
        })
        .collect();

    let columns: Vec<Column> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let cells: Vec<Option<&Cell>> = body.iter().map(|row| row.get(i)).collect();
            let is_numeric = cells.iter().all(|c| !matches!(c, Some(Cell::Text(_))));

            if is_numeric {
                let values: Vec<Option<f64>> = cells
                    .iter()
                    .map(|c| match c {
                        Some(Cell::Number(n)) => Some(*n),
                        _ => None,
                    })
                    .collect();
                Column::new(name.as_str().into(), values)
            } else {
                let values: Vec<Option<String>> = cells
                    .iter()
                    .map(|c| match c {
                        Some(Cell::Number(n)) => Some(format_number(*n)),
                        Some(Cell::Text(t)) => Some(t.clone()),
                        _ => None,
                    })
                    .collect();
                Column::new(name.as_str().into(), values)
            }
        })
        .collect();

    Ok(DataFrame::new(columns)?)
}
