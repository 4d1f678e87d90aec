//! Office Open XML packaging: parts, relationship lists and content types,
//! zipped into a single archive. Shared by the XLSX and PPTX writers.

use std::io::{Cursor, Write};
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::ZipWriter;

use crate::xml;

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const RELS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

macro_rules! office_rel {
    ($name:literal) => {
        concat!("http://schemas.openxmlformats.org/officeDocument/2006/relationships/", $name)
    };
}

pub const REL_OFFICE_DOCUMENT: &str = office_rel!("officeDocument");
pub const REL_EXTENDED_PROPERTIES: &str = office_rel!("extended-properties");
pub const REL_CORE_PROPERTIES: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
pub const REL_SLIDE: &str = office_rel!("slide");
pub const REL_SLIDE_LAYOUT: &str = office_rel!("slideLayout");
pub const REL_SLIDE_MASTER: &str = office_rel!("slideMaster");
pub const REL_THEME: &str = office_rel!("theme");
pub const REL_IMAGE: &str = office_rel!("image");
pub const REL_WORKSHEET: &str = office_rel!("worksheet");

/// One entry of a `.rels` part; `kind` is the relationship type URI.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub id: String,
    pub kind: &'static str,
    pub target: String,
}

impl Relationship {
    pub fn new(index: usize, kind: &'static str, target: impl Into<String>) -> Self {
        Self {
            id: format!("rId{}", index),
            kind,
            target: target.into(),
        }
    }
}

pub fn relationships_xml(rels: &[Relationship]) -> String {
    let mut out = format!("{}\n<Relationships xmlns=\"{}\">\n", XML_DECLARATION, RELS_NS);
    for rel in rels {
        out.push_str(&format!(
            "<Relationship Id=\"{}\" Type=\"{}\" Target=\"{}\"/>\n",
            rel.id,
            rel.kind,
            xml::escape(&rel.target)
        ));
    }
    out.push_str("</Relationships>");
    out
}

/// `[Content_Types].xml` with `rels`, `xml` and `png` defaults plus one
/// override per (part name, content type) pair.
pub fn content_types_xml(overrides: &[(String, &str)]) -> String {
    let mut out = format!(
        "{}\n<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\n\
         <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\n\
         <Default Extension=\"xml\" ContentType=\"application/xml\"/>\n\
         <Default Extension=\"png\" ContentType=\"image/png\"/>\n",
        XML_DECLARATION
    );
    for (part, content_type) in overrides {
        out.push_str(&format!(
            "<Override PartName=\"{}\" ContentType=\"{}\"/>\n",
            part, content_type
        ));
    }
    out.push_str("</Types>");
    out
}

/// Named file inside the archive.
pub struct Part {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Part {
    pub fn xml(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bytes: content.into().into_bytes(),
        }
    }

    pub fn binary(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Zip the parts in order, entirely in memory.
pub fn write_parts(parts: &[Part]) -> Result<Vec<u8>, ZipError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default();
    for part in parts {
        zip.start_file(part.name.as_str(), options)?;
        zip.write_all(&part.bytes)?;
    }
    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}
