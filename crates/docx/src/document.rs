//! Word document builder and serializer.

use crate::parts;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use slidedoc_core::{Block, Error, Result};
use std::io::{Cursor, Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const WORDPROCESSING_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const RELATIONSHIPS_NS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Highest heading level with a built-in style.
const MAX_HEADING_LEVEL: u8 = 9;

/// A word-processing document made of headings and paragraphs.
#[derive(Debug, Clone, Default)]
pub struct WordDocument {
    blocks: Vec<Block>,
}

impl WordDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document from laid-out blocks.
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// Append a heading. Level 0 is the document title.
    pub fn add_heading(&mut self, text: impl Into<String>, level: u8) -> &mut Self {
        self.blocks.push(Block::heading(text, level));
        self
    }

    /// Append a plain paragraph.
    ///
    /// Tabs and line breaks in `text` are kept as tab and break elements.
    pub fn add_paragraph(&mut self, text: impl Into<String>) -> &mut Self {
        self.blocks.push(Block::paragraph(text));
        self
    }

    /// Blocks in document order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Number of paragraphs, headings included.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Serialize the main document part (`word/document.xml`).
    pub fn document_xml(&self) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        write_document(&mut writer, &self.blocks).map_err(xml_error)?;

        String::from_utf8(writer.into_inner())
            .map_err(|e| Error::DocumentError(format!("Document is not UTF-8: {}", e)))
    }

    /// Write the complete package to a seekable writer.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let document = self.document_xml()?;

        let mut zip = ZipWriter::new(writer);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        let entries: [(&str, &str); 7] = [
            ("[Content_Types].xml", parts::CONTENT_TYPES),
            ("_rels/.rels", parts::PACKAGE_RELS),
            ("docProps/core.xml", parts::CORE_PROPERTIES),
            ("docProps/app.xml", parts::APP_PROPERTIES),
            ("word/document.xml", &document),
            ("word/_rels/document.xml.rels", parts::DOCUMENT_RELS),
            ("word/styles.xml", parts::STYLES),
        ];

        for (name, content) in entries {
            zip.start_file(name, options)
                .map_err(|e| Error::ZipError(format!("Failed to add '{}': {}", name, e)))?;
            zip.write_all(content.as_bytes())?;
        }

        zip.finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish package: {}", e)))?;
        Ok(())
    }

    /// Serialize the complete package in memory.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write_to(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Save the document to `path`, replacing any existing file.
    ///
    /// The package is assembled before the file is touched, so a failed
    /// serialization leaves no partial file behind.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        std::fs::write(path, &bytes)?;
        log::debug!(
            "Saved {} paragraphs ({} bytes) to {}",
            self.blocks.len(),
            bytes.len(),
            path.display()
        );
        Ok(())
    }
}

impl Extend<Block> for WordDocument {
    fn extend<T: IntoIterator<Item = Block>>(&mut self, iter: T) {
        self.blocks.extend(iter);
    }
}

/// Paragraph style id for a heading level.
fn heading_style(level: u8) -> String {
    match level {
        0 => "Title".to_string(),
        n => format!("Heading{}", n.min(MAX_HEADING_LEVEL)),
    }
}

fn xml_error(e: quick_xml::Error) -> Error {
    Error::XmlError(format!("Failed to write document: {}", e))
}

fn write_document<W: Write>(writer: &mut Writer<W>, blocks: &[Block]) -> quick_xml::Result<()> {
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    writer.write_event(Event::Start(
        BytesStart::new("w:document")
            .with_attributes([("xmlns:w", WORDPROCESSING_NS), ("xmlns:r", RELATIONSHIPS_NS)]),
    ))?;
    writer.write_event(Event::Start(BytesStart::new("w:body")))?;

    for block in blocks {
        match block {
            Block::Heading { text, level } => {
                write_paragraph(writer, Some(&heading_style(*level)), text)?
            }
            Block::Paragraph(text) => write_paragraph(writer, None, text)?,
        }
    }

    write_section_properties(writer)?;

    writer.write_event(Event::End(BytesEnd::new("w:body")))?;
    writer.write_event(Event::End(BytesEnd::new("w:document")))?;
    Ok(())
}

fn write_paragraph<W: Write>(
    writer: &mut Writer<W>,
    style: Option<&str>,
    text: &str,
) -> quick_xml::Result<()> {
    if style.is_none() && text.is_empty() {
        return writer.write_event(Event::Empty(BytesStart::new("w:p")));
    }

    writer.write_event(Event::Start(BytesStart::new("w:p")))?;

    if let Some(style) = style {
        writer.write_event(Event::Start(BytesStart::new("w:pPr")))?;
        writer.write_event(Event::Empty(
            BytesStart::new("w:pStyle").with_attributes([("w:val", style)]),
        ))?;
        writer.write_event(Event::End(BytesEnd::new("w:pPr")))?;
    }

    if !text.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("w:r")))?;
        write_run_content(writer, text)?;
        writer.write_event(Event::End(BytesEnd::new("w:r")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("w:p")))
}

/// Write run text, turning tabs into `w:tab` and line breaks into `w:br`.
fn write_run_content<W: Write>(writer: &mut Writer<W>, text: &str) -> quick_xml::Result<()> {
    let mut pending = String::new();

    for c in text.chars() {
        let element = match c {
            '\t' => "w:tab",
            '\n' | '\r' => "w:br",
            _ => {
                pending.push(c);
                continue;
            }
        };
        write_text(writer, &pending)?;
        pending.clear();
        writer.write_event(Event::Empty(BytesStart::new(element)))?;
    }

    write_text(writer, &pending)
}

fn write_text<W: Write>(writer: &mut Writer<W>, text: &str) -> quick_xml::Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    writer.write_event(Event::Start(
        BytesStart::new("w:t").with_attributes([("xml:space", "preserve")]),
    ))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new("w:t")))
}

fn write_section_properties<W: Write>(writer: &mut Writer<W>) -> quick_xml::Result<()> {
    writer.write_event(Event::Start(BytesStart::new("w:sectPr")))?;
    writer.write_event(Event::Empty(
        BytesStart::new("w:pgSz").with_attributes([("w:w", "12240"), ("w:h", "15840")]),
    ))?;
    writer.write_event(Event::Empty(BytesStart::new("w:pgMar").with_attributes([
        ("w:top", "1440"),
        ("w:right", "1440"),
        ("w:bottom", "1440"),
        ("w:left", "1440"),
        ("w:header", "720"),
        ("w:footer", "720"),
        ("w:gutter", "0"),
    ])))?;
    writer.write_event(Event::End(BytesEnd::new("w:sectPr")))
}
