//! PPTX Document Writer
//! Writes laid-out report pages as a portrait presentation, one slide per
//! page, with text boxes for lines and embedded PNG charts.
//!
//! Uses direct ZIP/XML generation so no office library is needed.

use zip::result::ZipError;

use crate::export::layout::{Block, BlockContent, Page, PageGeometry};
use crate::package::{
    self, Part, Relationship, REL_CORE_PROPERTIES, REL_EXTENDED_PROPERTIES, REL_IMAGE,
    REL_OFFICE_DOCUMENT, REL_SLIDE, REL_SLIDE_LAYOUT, REL_SLIDE_MASTER, REL_THEME,
    XML_DECLARATION,
};
use crate::xml;

/// EMU (English Metric Units) conversion: 914400 EMU = 1 inch = 72 pt
const EMU_PER_POINT: f64 = 12700.0;

const PML_NAMESPACES: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

const CT_PRESENTATION: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
const CT_SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
const CT_SLIDE_LAYOUT: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";
const CT_SLIDE_MASTER: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
const CT_THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
const CT_CORE: &str = "application/vnd.openxmlformats-package.core-properties+xml";
const CT_APP: &str = "application/vnd.openxmlformats-officedocument.extended-properties+xml";

const SLIDE_LAYOUT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" type="blank" preserve="1">
<p:cSld name="Blank"><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr></p:spTree></p:cSld>
<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>
</p:sldLayout>"#;

const SLIDE_MASTER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
<p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr></p:spTree></p:cSld>
<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>
<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>
</p:sldMaster>"#;

const THEME_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme">
<a:themeElements>
<a:clrScheme name="Office"><a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="44546A"/></a:dk2><a:lt2><a:srgbClr val="E7E6E6"/></a:lt2><a:accent1><a:srgbClr val="4472C4"/></a:accent1><a:accent2><a:srgbClr val="ED7D31"/></a:accent2><a:accent3><a:srgbClr val="A5A5A5"/></a:accent3><a:accent4><a:srgbClr val="FFC000"/></a:accent4><a:accent5><a:srgbClr val="5B9BD5"/></a:accent5><a:accent6><a:srgbClr val="70AD47"/></a:accent6><a:hlink><a:srgbClr val="0563C1"/></a:hlink><a:folHlink><a:srgbClr val="954F72"/></a:folHlink></a:clrScheme>
<a:fontScheme name="Office"><a:majorFont><a:latin typeface="Calibri Light"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme>
<a:fmtScheme name="Office"><a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:gradFill rotWithShape="1"><a:gsLst><a:gs pos="0"><a:schemeClr val="phClr"><a:tint val="50000"/><a:satMod val="300000"/></a:schemeClr></a:gs><a:gs pos="35000"><a:schemeClr val="phClr"><a:tint val="37000"/><a:satMod val="300000"/></a:schemeClr></a:gs><a:gs pos="100000"><a:schemeClr val="phClr"><a:tint val="15000"/><a:satMod val="350000"/></a:schemeClr></a:gs></a:gsLst><a:lin ang="16200000" scaled="1"/></a:gradFill><a:gradFill rotWithShape="1"><a:gsLst><a:gs pos="0"><a:schemeClr val="phClr"><a:shade val="51000"/><a:satMod val="130000"/></a:schemeClr></a:gs><a:gs pos="80000"><a:schemeClr val="phClr"><a:shade val="93000"/><a:satMod val="130000"/></a:schemeClr></a:gs><a:gs pos="100000"><a:schemeClr val="phClr"><a:shade val="94000"/><a:satMod val="135000"/></a:schemeClr></a:gs></a:gsLst><a:lin ang="16200000" scaled="0"/></a:gradFill></a:fillStyleLst><a:lnStyleLst><a:ln w="6350" cap="flat" cmpd="sng" algn="ctr"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:prstDash val="solid"/><a:miter lim="800000"/></a:ln><a:ln w="12700" cap="flat" cmpd="sng" algn="ctr"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:prstDash val="solid"/><a:miter lim="800000"/></a:ln><a:ln w="19050" cap="flat" cmpd="sng" algn="ctr"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:prstDash val="solid"/><a:miter lim="800000"/></a:ln></a:lnStyleLst><a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst><a:outerShdw blurRad="57150" dist="19050" dir="5400000" algn="ctr" rotWithShape="0"><a:srgbClr val="000000"><a:alpha val="63000"/></a:srgbClr></a:outerShdw></a:effectLst></a:effectStyle></a:effectStyleLst><a:bgFillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:solidFill><a:schemeClr val="phClr"><a:tint val="95000"/><a:satMod val="170000"/></a:schemeClr></a:solidFill><a:gradFill rotWithShape="1"><a:gsLst><a:gs pos="0"><a:schemeClr val="phClr"><a:tint val="93000"/><a:satMod val="150000"/><a:shade val="98000"/><a:lumMod val="102000"/></a:schemeClr></a:gs><a:gs pos="50000"><a:schemeClr val="phClr"><a:tint val="98000"/><a:satMod val="130000"/><a:shade val="90000"/><a:lumMod val="103000"/></a:schemeClr></a:gs><a:gs pos="100000"><a:schemeClr val="phClr"><a:shade val="63000"/><a:satMod val="120000"/></a:schemeClr></a:gs></a:gsLst><a:lin ang="5400000" scaled="0"/></a:gradFill></a:bgFillStyleLst></a:fmtScheme>
</a:themeElements>
<a:objectDefaults/>
<a:extraClrSchemeLst/>
</a:theme>"#;

fn emu(points: f64) -> i64 {
    (points * EMU_PER_POINT).round() as i64
}

/// PPT generator for report documents
pub struct PptGenerator;

impl PptGenerator {
    /// Generate the presentation in memory.
    ///
    /// `images` holds PNG bytes referenced by `BlockContent::Image` indices;
    /// blocks pointing past the end are skipped.
    pub fn generate_document(
        pages: &[Page],
        images: &[Vec<u8>],
        geometry: &PageGeometry,
        title: &str,
    ) -> Result<Vec<u8>, ZipError> {
        let empty = [Page::default()];
        let pages = if pages.is_empty() { &empty[..] } else { pages };
        let slide_count = pages.len();

        let mut overrides = vec![
            ("/ppt/presentation.xml".to_string(), CT_PRESENTATION),
            ("/ppt/slideMasters/slideMaster1.xml".to_string(), CT_SLIDE_MASTER),
            ("/ppt/slideLayouts/slideLayout1.xml".to_string(), CT_SLIDE_LAYOUT),
            ("/ppt/theme/theme1.xml".to_string(), CT_THEME),
            ("/docProps/core.xml".to_string(), CT_CORE),
            ("/docProps/app.xml".to_string(), CT_APP),
        ];
        overrides.extend((1..=slide_count).map(|n| (format!("/ppt/slides/slide{}.xml", n), CT_SLIDE)));

        let mut presentation_rels = vec![
            Relationship::new(1, REL_SLIDE_MASTER, "slideMasters/slideMaster1.xml"),
            Relationship::new(2, REL_THEME, "theme/theme1.xml"),
        ];
        presentation_rels.extend(
            (1..=slide_count).map(|n| Relationship::new(n + 2, REL_SLIDE, format!("slides/slide{}.xml", n))),
        );

        let mut parts = vec![
            Part::xml("[Content_Types].xml", package::content_types_xml(&overrides)),
            Part::xml(
                "_rels/.rels",
                package::relationships_xml(&[
                    Relationship::new(1, REL_OFFICE_DOCUMENT, "ppt/presentation.xml"),
                    Relationship::new(2, REL_CORE_PROPERTIES, "docProps/core.xml"),
                    Relationship::new(3, REL_EXTENDED_PROPERTIES, "docProps/app.xml"),
                ]),
            ),
            Part::xml(
                "ppt/_rels/presentation.xml.rels",
                package::relationships_xml(&presentation_rels),
            ),
            Part::xml("ppt/presentation.xml", Self::presentation_xml(geometry, slide_count)),
        ];

        for (idx, page) in pages.iter().enumerate() {
            let slide_num = idx + 1;
            let (slide, rels) = Self::slide_xml(&page.blocks, images.len());
            parts.push(Part::xml(
                format!("ppt/slides/_rels/slide{}.xml.rels", slide_num),
                package::relationships_xml(&rels),
            ));
            parts.push(Part::xml(format!("ppt/slides/slide{}.xml", slide_num), slide));
        }

        parts.extend([
            Part::xml("ppt/slideLayouts/slideLayout1.xml", SLIDE_LAYOUT_XML),
            Part::xml(
                "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
                package::relationships_xml(&[Relationship::new(
                    1,
                    REL_SLIDE_MASTER,
                    "../slideMasters/slideMaster1.xml",
                )]),
            ),
            Part::xml("ppt/slideMasters/slideMaster1.xml", SLIDE_MASTER_XML),
            Part::xml(
                "ppt/slideMasters/_rels/slideMaster1.xml.rels",
                package::relationships_xml(&[
                    Relationship::new(1, REL_SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml"),
                    Relationship::new(2, REL_THEME, "../theme/theme1.xml"),
                ]),
            ),
            Part::xml("ppt/theme/theme1.xml", THEME_XML),
            Part::xml("docProps/core.xml", Self::core_props_xml(title)),
            Part::xml("docProps/app.xml", Self::app_props_xml(slide_count)),
        ]);

        parts.extend(
            images
                .iter()
                .enumerate()
                .map(|(idx, png)| Part::binary(format!("ppt/media/image{}.png", idx + 1), png.clone())),
        );

        package::write_parts(&parts)
    }

    fn presentation_xml(geometry: &PageGeometry, slide_count: usize) -> String {
        let slide_ids: String = (1..=slide_count)
            .map(|i| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 255 + i, i + 2))
            .collect();
        let (cx, cy) = (emu(geometry.width), emu(geometry.height));

        format!(
            "{}\n<p:presentation {} saveSubsetFonts=\"1\">\n\
             <p:sldMasterIdLst><p:sldMasterId id=\"2147483648\" r:id=\"rId1\"/></p:sldMasterIdLst>\n\
             <p:sldIdLst>{}</p:sldIdLst>\n\
             <p:sldSz cx=\"{}\" cy=\"{}\"/>\n\
             <p:notesSz cx=\"{}\" cy=\"{}\"/>\n\
             </p:presentation>",
            XML_DECLARATION, PML_NAMESPACES, slide_ids, cx, cy, cx, cy
        )
    }

    /// Slide XML plus its relationships: the layout first, then one entry
    /// per embedded picture.
    fn slide_xml(blocks: &[Block], image_count: usize) -> (String, Vec<Relationship>) {
        let mut rels = vec![Relationship::new(1, REL_SLIDE_LAYOUT, "../slideLayouts/slideLayout1.xml")];
        let mut shapes = String::new();

        for (idx, block) in blocks.iter().enumerate() {
            let shape_id = idx + 2;
            match &block.content {
                BlockContent::Text {
                    text,
                    font_size,
                    bold,
                } => shapes.push_str(&Self::text_box_xml(shape_id, block, text, *font_size, *bold)),
                BlockContent::Image { index } if *index < image_count => {
                    let rel = Relationship::new(
                        rels.len() + 1,
                        REL_IMAGE,
                        format!("../media/image{}.png", index + 1),
                    );
                    shapes.push_str(&Self::picture_xml(shape_id, &rel.id, block));
                    rels.push(rel);
                }
                BlockContent::Image { .. } => {}
            }
        }

        let slide = format!(
            "{}\n<p:sld {}>\n<p:cSld>\n<p:spTree>\n\
             <p:nvGrpSpPr><p:cNvPr id=\"1\" name=\"\"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>\n\
             <p:grpSpPr/>\n{}\n</p:spTree>\n</p:cSld>\n\
             <p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>\n</p:sld>",
            XML_DECLARATION, PML_NAMESPACES, shapes
        );
        (slide, rels)
    }

    fn xfrm(block: &Block) -> String {
        format!(
            r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
            emu(block.x),
            emu(block.y),
            emu(block.width),
            emu(block.height)
        )
    }

    /// Unwrapped, inset-free text box; line breaking is done by the layout.
    fn text_box_xml(shape_id: usize, block: &Block, text: &str, font_size: f64, bold: bool) -> String {
        format!(
            "<p:sp><p:nvSpPr><p:cNvPr id=\"{id}\" name=\"Text {id}\"/><p:cNvSpPr txBox=\"1\"/><p:nvPr/></p:nvSpPr>\
             <p:spPr>{xfrm}<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>\
             <p:txBody><a:bodyPr wrap=\"none\" lIns=\"0\" tIns=\"0\" rIns=\"0\" bIns=\"0\"/><a:lstStyle/>\
             <a:p><a:r><a:rPr lang=\"en-US\" sz=\"{size}\" b=\"{bold}\" dirty=\"0\"/><a:t>{text}</a:t></a:r></a:p>\
             </p:txBody></p:sp>\n",
            id = shape_id,
            xfrm = Self::xfrm(block),
            size = (font_size * 100.0).round() as i64,
            bold = u8::from(bold),
            text = xml::escape(text)
        )
    }

    fn picture_xml(shape_id: usize, rel_id: &str, block: &Block) -> String {
        format!(
            "<p:pic><p:nvPicPr><p:cNvPr id=\"{id}\" name=\"Chart {id}\"/>\
             <p:cNvPicPr><a:picLocks noChangeAspect=\"1\"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>\
             <p:blipFill><a:blip r:embed=\"{rel}\"/><a:stretch><a:fillRect/></a:stretch></p:blipFill>\
             <p:spPr>{xfrm}<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></p:spPr></p:pic>\n",
            id = shape_id,
            rel = rel_id,
            xfrm = Self::xfrm(block)
        )
    }

    fn core_props_xml(title: &str) -> String {
        format!(
            "{}\n<cp:coreProperties xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" \
             xmlns:dc=\"http://purl.org/dc/elements/1.1/\">\n\
             <dc:title>{}</dc:title>\n<dc:creator>ESG Report</dc:creator>\n</cp:coreProperties>",
            XML_DECLARATION,
            xml::escape(title)
        )
    }

    fn app_props_xml(slide_count: usize) -> String {
        format!(
            "{}\n<Properties xmlns=\"http://schemas.openxmlformats.org/officeDocument/2006/extended-properties\">\n\
             <Application>ESG Report</Application>\n<PresentationFormat>Custom</PresentationFormat>\n\
             <Slides>{}</Slides>\n</Properties>",
            XML_DECLARATION, slide_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    fn text_block(y: f64, text: &str) -> Block {
        Block {
            x: 54.0,
            y,
            width: 504.0,
            height: 14.0,
            content: BlockContent::Text {
                text: text.to_string(),
                font_size: 10.0,
                bold: false,
            },
        }
    }

    fn image_block(y: f64, index: usize) -> Block {
        Block {
            x: 54.0,
            y,
            width: 504.0,
            height: 252.0,
            content: BlockContent::Image { index },
        }
    }

    #[test]
    fn points_convert_to_emu() {
        assert_eq!(emu(72.0), 914400);
        assert_eq!(emu(612.0), 7772400);
    }

    #[test]
    fn slide_text_is_escaped_and_sized() {
        let (xml, rels) = PptGenerator::slide_xml(&[text_block(54.0, "Waste < 5 & falling")], 0);
        assert!(xml.contains("Waste &lt; 5 &amp; falling"));
        assert!(xml.contains(r#"sz="1000""#));
        assert!(xml.contains(r#"<a:off x="685800" y="685800"/>"#));
        assert_eq!(rels.len(), 1);
    }

    #[test]
    fn images_get_sequential_relationships() {
        let blocks = vec![
            text_block(54.0, "Charts"),
            image_block(80.0, 0),
            image_block(340.0, 1),
            image_block(600.0, 7),
        ];
        let (xml, rels) = PptGenerator::slide_xml(&blocks, 2);
        assert!(xml.contains(r#"r:embed="rId2""#));
        assert!(xml.contains(r#"r:embed="rId3""#));
        assert!(!xml.contains(r#"r:embed="rId4""#));
        assert_eq!(rels[1].target, "../media/image1.png");
        assert_eq!(rels[2].target, "../media/image2.png");
    }

    #[test]
    fn one_slide_per_page() {
        let pages = vec![
            Page {
                blocks: vec![text_block(54.0, "first")],
            },
            Page {
                blocks: vec![text_block(54.0, "second"), image_block(80.0, 0)],
            },
        ];
        let bytes = PptGenerator::generate_document(
            &pages,
            &[vec![0x89, b'P', b'N', b'G']],
            &PageGeometry::default(),
            "Report",
        )
        .unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut slide2 = String::new();
        archive
            .by_name("ppt/slides/slide2.xml")
            .unwrap()
            .read_to_string(&mut slide2)
            .unwrap();
        assert!(slide2.contains("second"));
        assert!(archive.by_name("ppt/slides/slide3.xml").is_err());
        assert!(archive.by_name("ppt/media/image1.png").is_ok());
    }
}
