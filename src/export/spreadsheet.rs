//! Spreadsheet Export
//! Writes the report as a two-row XLSX sheet: column names, then values.

use zip::result::ZipError;

use crate::package::{
    self, Part, Relationship, REL_OFFICE_DOCUMENT, REL_WORKSHEET, XML_DECLARATION,
};
use crate::report::ReportContent;
use crate::xml;

const SHEET_NAME: &str = "ESG Report";
const SML_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const CT_WORKBOOK: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
const CT_WORKSHEET: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: usize) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Column name -> value mapping for the single report row.
pub fn report_row(content: &ReportContent, decimals: usize) -> Vec<(String, CellValue)> {
    let mut row = vec![
        (
            "Company".to_string(),
            CellValue::Text(content.metadata().company_name.clone()),
        ),
        ("Date".to_string(), CellValue::Text(content.date_label())),
    ];

    row.extend(content.metrics().iter().map(|m| {
        (
            m.key.clone(),
            CellValue::Number(round_to(m.value, decimals)),
        )
    }));

    row.push((
        "Narrative".to_string(),
        CellValue::Text(content.narrative().to_string()),
    ));
    row.push((
        "Summary".to_string(),
        CellValue::Text(content.summary_or_narrative().to_string()),
    ));
    row
}

/// `0` -> `A`, `25` -> `Z`, `26` -> `AA`.
pub fn column_letters(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.iter().rev().map(|b| *b as char).collect()
}

pub struct XlsxWriter;

impl XlsxWriter {
    /// Build a workbook with one sheet holding the header row and value row.
    pub fn write_row(row: &[(String, CellValue)]) -> Result<Vec<u8>, ZipError> {
        let overrides = [
            ("/xl/workbook.xml".to_string(), CT_WORKBOOK),
            ("/xl/worksheets/sheet1.xml".to_string(), CT_WORKSHEET),
        ];
        package::write_parts(&[
            Part::xml("[Content_Types].xml", package::content_types_xml(&overrides)),
            Part::xml(
                "_rels/.rels",
                package::relationships_xml(&[Relationship::new(
                    1,
                    REL_OFFICE_DOCUMENT,
                    "xl/workbook.xml",
                )]),
            ),
            Part::xml("xl/workbook.xml", Self::workbook_xml()),
            Part::xml(
                "xl/_rels/workbook.xml.rels",
                package::relationships_xml(&[Relationship::new(
                    1,
                    REL_WORKSHEET,
                    "worksheets/sheet1.xml",
                )]),
            ),
            Part::xml("xl/worksheets/sheet1.xml", Self::sheet_xml(row)),
        ])
    }

    fn sheet_xml(row: &[(String, CellValue)]) -> String {
        let header: String = row
            .iter()
            .enumerate()
            .map(|(i, (name, _))| Self::text_cell(i, 1, name))
            .collect();
        let values: String = row
            .iter()
            .enumerate()
            .map(|(i, (_, value))| match value {
                CellValue::Number(n) if n.is_finite() => {
                    format!(r#"<c r="{}2"><v>{}</v></c>"#, column_letters(i), n)
                }
                CellValue::Number(n) => Self::text_cell(i, 2, &n.to_string()),
                CellValue::Text(t) => Self::text_cell(i, 2, t),
            })
            .collect();

        format!(
            "{}\n<worksheet xmlns=\"{}\">\n<sheetData>\n<row r=\"1\">{}</row>\n<row r=\"2\">{}</row>\n</sheetData>\n</worksheet>",
            XML_DECLARATION, SML_NS, header, values
        )
    }

    fn text_cell(col: usize, row: usize, text: &str) -> String {
        format!(
            r#"<c r="{}{}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
            column_letters(col),
            row,
            xml::escape(text)
        )
    }

    fn workbook_xml() -> String {
        format!(
            "{}\n<workbook xmlns=\"{}\" xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">\n\
             <sheets><sheet name=\"{}\" sheetId=\"1\" r:id=\"rId1\"/></sheets>\n</workbook>",
            XML_DECLARATION,
            SML_NS,
            xml::escape(SHEET_NAME)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letters_for_columns() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(27), "AB");
        assert_eq!(column_letters(701), "ZZ");
        assert_eq!(column_letters(702), "AAA");
    }

    #[test]
    fn rounding_to_two_decimals() {
        assert_eq!(round_to(1093.3333333, 2), 1093.33);
        assert_eq!(round_to(2.675, 0), 3.0);
        assert_eq!(round_to(3280.0, 2), 3280.0);
    }

    #[test]
    fn text_is_escaped_in_cells() {
        let xml = XlsxWriter::sheet_xml(&[("Company".to_string(), CellValue::Text("A & B".to_string()))]);
        assert!(xml.contains("A &amp; B"));
        assert!(xml.contains(r#"<c r="A1" t="inlineStr">"#));
    }
}
