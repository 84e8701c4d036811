//! PPTX package loading.

use crate::chart::{parse_chart, ChartPart};
use crate::extract::extract_slide;
use crate::rels::{parse_relationships, rels_path_for, resolve_target, Relationship};
use crate::slide::{parse_shapes, ShapeContent};
use quick_xml::events::Event;
use quick_xml::Reader;
use slidedoc_core::{Error, Presentation, Result, SlideRecord};
use std::io::{Read, Seek};
use zip::ZipArchive;

const PRESENTATION_PART: &str = "ppt/presentation.xml";

/// Parser for PPTX (Office Open XML) files.
pub struct PptxParser;

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a PPTX file from a reader, extracting every slide in order.
    pub fn parse<R: Read + Seek>(&self, reader: R, filename: &str) -> Result<Presentation> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut presentation = Presentation::new(filename);

        let slide_order = self.get_slide_order(&mut archive)?;
        log::debug!("{}: {} slides", filename, slide_order.len());

        for (idx, slide_path) in slide_order.iter().enumerate() {
            let slide = self.parse_slide(&mut archive, slide_path, idx + 1)?;
            presentation.add_slide(slide);
        }

        Ok(presentation)
    }

    /// Get the ordered list of slide part paths.
    ///
    /// The slide id list of `presentation.xml` defines the order; packages
    /// without one fall back to the numbering of the slide relationships.
    fn get_slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels_path = rels_path_for(PRESENTATION_PART);
        let rels_content = self.read_file_from_archive(archive, &rels_path)?;
        let rels = parse_relationships(&rels_content)?;

        let presentation = self.read_file_from_archive(archive, PRESENTATION_PART)?;
        let slide_ids = parse_slide_id_list(&presentation)?;

        if !slide_ids.is_empty() {
            return slide_ids
                .iter()
                .map(|rel_id| {
                    rels.iter()
                        .find(|rel| &rel.id == rel_id)
                        .map(|rel| resolve_target(PRESENTATION_PART, &rel.target))
                        .ok_or_else(|| {
                            Error::CorruptedFile(format!(
                                "Slide relationship '{}' is not defined",
                                rel_id
                            ))
                        })
                })
                .collect();
        }

        log::warn!("No slide id list in {}, ordering by relationship", PRESENTATION_PART);

        let mut slides: Vec<(String, Option<usize>)> = rels
            .iter()
            .filter(|rel| rel.is_slide())
            .map(|rel| {
                let order_num =
                    extract_slide_number(&rel.id).or_else(|| extract_slide_number(&rel.target));
                (resolve_target(PRESENTATION_PART, &rel.target), order_num)
            })
            .collect();

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    /// Parse a single slide and extract its record.
    fn parse_slide<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
        slide_number: usize,
    ) -> Result<SlideRecord> {
        let content = self.read_file_from_archive(archive, slide_path)?;
        let shapes = parse_shapes(&content)?;

        let has_charts = shapes
            .iter()
            .any(|s| matches!(s.content, ShapeContent::Chart { .. }));
        let rels = if has_charts {
            let rels_content = self.read_file_from_archive(archive, &rels_path_for(slide_path))?;
            parse_relationships(&rels_content)?
        } else {
            Vec::new()
        };

        log::debug!(
            "Slide {} ({}): {} shapes",
            slide_number,
            slide_path,
            shapes.len()
        );

        extract_slide(slide_number, &shapes, |rel_id| {
            self.load_chart(archive, slide_path, &rels, rel_id)
        })
    }

    /// Resolve a slide's chart relationship and parse the chart part.
    fn load_chart<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
        rels: &[Relationship],
        rel_id: &str,
    ) -> Result<ChartPart> {
        let rel = rels.iter().find(|rel| rel.id == rel_id).ok_or_else(|| {
            Error::MissingPart(format!(
                "relationship '{}' of '{}'",
                rel_id, slide_path
            ))
        })?;

        let chart_path = resolve_target(slide_path, &rel.target);
        let content = self.read_file_from_archive(archive, &chart_path)?;
        parse_chart(&content)
    }

    /// Read a file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive
            .by_name(path)
            .map_err(|e| Error::MissingPart(format!("'{}': {}", path, e)))?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Relationship ids of `p:sldIdLst`, in presentation order.
fn parse_slide_id_list(xml: &str) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.local_name().as_ref() == b"sldId" =>
            {
                for attr in e.attributes().flatten() {
                    if attr.key.local_name().as_ref() == b"id" && attr.key.prefix().is_some() {
                        ids.push(String::from_utf8_lossy(&attr.value).to_string());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing presentation: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(ids)
}

/// Extract a slide number from a string like "rId2" or "slides/slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
