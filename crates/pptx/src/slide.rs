//! Slide XML parsing and shape classification.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use slidedoc_core::{Error, Result, TableRow};

/// Soft line break (`a:br`) inside a paragraph. Removed later by the sanitizer,
/// so the runs on either side are joined.
pub(crate) const SOFT_BREAK: &str = "\x0B";

/// A top-level shape of a slide's shape tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    /// Shape name from `p:cNvPr`, empty if absent.
    pub name: String,
    /// What the shape carries.
    pub content: ShapeContent,
}

/// Classified payload of a shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeContent {
    /// An auto shape or placeholder with a text body.
    TextFrame(String),
    /// A graphic frame holding a DrawingML table, as raw (unsanitized) rows.
    Table(Vec<TableRow>),
    /// A graphic frame holding a chart, by relationship id.
    Chart { rel_id: String },
    /// Pictures, connectors, groups and anything else we don't extract.
    Unhandled,
}

/// Shape element kinds that can appear directly in `p:spTree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShapeElement {
    AutoShape,
    GraphicFrame,
    Other,
}

impl ShapeElement {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"sp" => Some(Self::AutoShape),
            b"graphicFrame" => Some(Self::GraphicFrame),
            b"pic" | b"grpSp" | b"cxnSp" | b"contentPart" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Accumulates the content of the shape currently being read.
#[derive(Debug)]
struct ShapeBuilder {
    element: ShapeElement,
    /// Depth of the shape element itself.
    depth: usize,
    name: String,
    /// Paragraphs of the shape's own text body, `None` without a text body.
    paragraphs: Option<Vec<String>>,
    in_text_body: bool,
    rows: Option<Vec<TableRow>>,
    /// Paragraphs of the table cell being read.
    cell: Option<Vec<String>>,
    chart_rel_id: Option<String>,
    in_run_text: bool,
}

impl ShapeBuilder {
    fn new(element: ShapeElement, depth: usize) -> Self {
        Self {
            element,
            depth,
            name: String::new(),
            paragraphs: None,
            in_text_body: false,
            rows: None,
            cell: None,
            chart_rel_id: None,
            in_run_text: false,
        }
    }

    /// Paragraph list that text should currently go to.
    fn active_paragraphs(&mut self) -> Option<&mut Vec<String>> {
        if self.cell.is_some() {
            self.cell.as_mut()
        } else if self.in_text_body {
            self.paragraphs.as_mut()
        } else {
            None
        }
    }

    fn start_paragraph(&mut self) {
        if let Some(paragraphs) = self.active_paragraphs() {
            paragraphs.push(String::new());
        }
    }

    fn push_text(&mut self, text: &str) {
        if let Some(paragraphs) = self.active_paragraphs() {
            match paragraphs.last_mut() {
                Some(last) => last.push_str(text),
                None => paragraphs.push(text.to_string()),
            }
        }
    }

    fn start_element(&mut self, e: &BytesStart, is_empty: bool) -> Result<()> {
        match self.element {
            ShapeElement::AutoShape => match e.local_name().as_ref() {
                b"cNvPr" => self.read_name(e)?,
                b"txBody" => {
                    self.paragraphs = Some(Vec::new());
                    self.in_text_body = !is_empty;
                }
                b"p" => self.start_paragraph(),
                b"t" => self.in_run_text = !is_empty,
                b"br" => self.push_text(SOFT_BREAK),
                _ => {}
            },
            ShapeElement::GraphicFrame => match e.local_name().as_ref() {
                b"cNvPr" => self.read_name(e)?,
                b"tbl" => self.rows = Some(Vec::new()),
                b"tr" => {
                    if let Some(rows) = self.rows.as_mut() {
                        rows.push(Vec::new());
                    }
                }
                b"tc" => {
                    if is_empty {
                        self.push_cell(Vec::new());
                    } else {
                        self.cell = Some(Vec::new());
                    }
                }
                b"p" => self.start_paragraph(),
                b"t" => self.in_run_text = !is_empty,
                b"br" => self.push_text(SOFT_BREAK),
                b"chart" => {
                    for attr in e.attributes().flatten() {
                        if attr.key.local_name().as_ref() == b"id" {
                            let value = attr.unescape_value().map_err(|e| {
                                Error::XmlError(format!("Bad chart reference: {}", e))
                            })?;
                            self.chart_rel_id = Some(value.into_owned());
                        }
                    }
                }
                _ => {}
            },
            ShapeElement::Other => {}
        }
        Ok(())
    }

    fn end_element(&mut self, local: &[u8]) {
        match local {
            b"t" => self.in_run_text = false,
            b"txBody" => self.in_text_body = false,
            b"tc" => {
                if let Some(cell) = self.cell.take() {
                    self.push_cell(cell);
                }
            }
            _ => {}
        }
    }

    fn push_cell(&mut self, paragraphs: Vec<String>) {
        if let Some(row) = self.rows.as_mut().and_then(|rows| rows.last_mut()) {
            row.push(paragraphs.join("\n"));
        }
    }

    fn read_name(&mut self, e: &BytesStart) -> Result<()> {
        if !self.name.is_empty() {
            return Ok(());
        }
        for attr in e.attributes().flatten() {
            if attr.key.as_ref() == b"name" {
                self.name = attr
                    .unescape_value()
                    .map_err(|e| Error::XmlError(format!("Bad shape name: {}", e)))?
                    .into_owned();
            }
        }
        Ok(())
    }

    fn finish(self) -> Shape {
        let content = match self.element {
            ShapeElement::AutoShape => match self.paragraphs {
                Some(paragraphs) => ShapeContent::TextFrame(paragraphs.join("\n")),
                None => ShapeContent::Unhandled,
            },
            ShapeElement::GraphicFrame => match (self.rows, self.chart_rel_id) {
                (Some(rows), _) => ShapeContent::Table(rows),
                (None, Some(rel_id)) => ShapeContent::Chart { rel_id },
                (None, None) => ShapeContent::Unhandled,
            },
            ShapeElement::Other => ShapeContent::Unhandled,
        };

        Shape {
            name: self.name,
            content,
        }
    }
}

/// Parse the shapes of a slide, in document order.
///
/// Only direct children of `p:spTree` are shapes; the members of a group
/// shape are not visited.
pub fn parse_shapes(xml: &str) -> Result<Vec<Shape>> {
    let mut shapes = Vec::new();
    let mut reader = Reader::from_str(xml);

    let mut depth = 0usize;
    let mut tree_depth: Option<usize> = None;
    let mut current: Option<ShapeBuilder> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                depth += 1;
                let local = e.local_name();

                if let Some(shape) = current.as_mut() {
                    shape.start_element(e, false)?;
                } else if tree_depth.is_none() && local.as_ref() == b"spTree" {
                    tree_depth = Some(depth);
                } else if tree_depth.map(|d| d + 1) == Some(depth) {
                    if let Some(element) = ShapeElement::from_local_name(local.as_ref()) {
                        let mut shape = ShapeBuilder::new(element, depth);
                        shape.start_element(e, false)?;
                        current = Some(shape);
                    }
                }
            }
            Ok(Event::Empty(ref e)) => {
                if let Some(shape) = current.as_mut() {
                    shape.start_element(e, true)?;
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(shape) = current.as_mut() {
                    if shape.in_run_text {
                        let text = e
                            .unescape()
                            .map_err(|e| Error::XmlError(format!("Bad slide text: {}", e)))?;
                        shape.push_text(&text);
                    }
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(shape) = current.as_mut() {
                    if shape.in_run_text {
                        shape.push_text(&String::from_utf8_lossy(e));
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                let local = e.local_name();

                if current.as_ref().map(|s| s.depth) == Some(depth) {
                    if let Some(shape) = current.take() {
                        let shape = shape.finish();
                        log::debug!("Shape '{}': {:?}", shape.name, kind_name(&shape.content));
                        shapes.push(shape);
                    }
                } else if let Some(shape) = current.as_mut() {
                    shape.end_element(local.as_ref());
                } else if tree_depth == Some(depth) && local.as_ref() == b"spTree" {
                    tree_depth = None;
                }

                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing slide at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(shapes)
}

fn kind_name(content: &ShapeContent) -> &'static str {
    match content {
        ShapeContent::TextFrame(_) => "text",
        ShapeContent::Table(_) => "table",
        ShapeContent::Chart { .. } => "chart",
        ShapeContent::Unhandled => "unhandled",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slide(tree: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
<p:cSld><p:spTree>
<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>
<p:grpSpPr/>
{}
</p:spTree></p:cSld></p:sld>"#,
            tree
        )
    }

    #[test]
    fn test_text_frame_paragraphs_and_runs() {
        let xml = slide(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Title 1"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr>
<p:spPr/>
<p:txBody><a:bodyPr/><a:lstStyle/>
<a:p><a:r><a:t>Hello </a:t></a:r><a:r><a:t>world</a:t></a:r></a:p>
<a:p><a:r><a:t>line</a:t></a:r><a:br/><a:r><a:t>break</a:t></a:r></a:p>
<a:p/>
</p:txBody></p:sp>"#,
        );

        let shapes = parse_shapes(&xml).unwrap();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].name, "Title 1");
        assert_eq!(
            shapes[0].content,
            ShapeContent::TextFrame("Hello world\nline\x0Bbreak\n".to_string())
        );
    }

    #[test]
    fn test_escaped_text() {
        let xml = slide(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Body"/></p:nvSpPr>
<p:txBody><a:p><a:r><a:t>R&amp;D &lt;2024&gt;</a:t></a:r></a:p></p:txBody></p:sp>"#,
        );
        let shapes = parse_shapes(&xml).unwrap();
        assert_eq!(
            shapes[0].content,
            ShapeContent::TextFrame("R&D <2024>".to_string())
        );
    }

    #[test]
    fn test_shape_without_text_body_is_unhandled() {
        let xml = slide(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Rect"/></p:nvSpPr><p:spPr/></p:sp>
<p:pic><p:nvPicPr><p:cNvPr id="3" name="Picture"/></p:nvPicPr></p:pic>"#,
        );
        let shapes = parse_shapes(&xml).unwrap();
        assert_eq!(shapes.len(), 2);
        assert!(shapes.iter().all(|s| s.content == ShapeContent::Unhandled));
    }

    #[test]
    fn test_table() {
        let xml = slide(
            r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="4" name="Table 3"/></p:nvGraphicFramePr>
<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/table">
<a:tbl><a:tblGrid><a:gridCol w="100"/><a:gridCol w="100"/></a:tblGrid>
<a:tr h="10">
  <a:tc><a:txBody><a:bodyPr/><a:p><a:r><a:t>a</a:t></a:r></a:p></a:txBody></a:tc>
  <a:tc><a:txBody><a:bodyPr/><a:p><a:r><a:t>b</a:t></a:r></a:p><a:p><a:r><a:t>b2</a:t></a:r></a:p></a:txBody></a:tc>
</a:tr>
<a:tr h="10">
  <a:tc><a:txBody><a:bodyPr/><a:p><a:r><a:t>c</a:t></a:r></a:p></a:txBody></a:tc>
  <a:tc hMerge="1"><a:txBody><a:bodyPr/><a:p/></a:txBody></a:tc>
  <a:tc/>
</a:tr>
</a:tbl></a:graphicData></a:graphic></p:graphicFrame>"#,
        );

        let shapes = parse_shapes(&xml).unwrap();
        assert_eq!(
            shapes[0].content,
            ShapeContent::Table(vec![
                vec!["a".to_string(), "b\nb2".to_string()],
                vec!["c".to_string(), String::new(), String::new()],
            ])
        );
    }

    #[test]
    fn test_chart_reference() {
        let xml = slide(
            r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="5" name="Chart 4"/></p:nvGraphicFramePr>
<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/chart">
<c:chart xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" r:id="rId2"/>
</a:graphicData></a:graphic></p:graphicFrame>"#,
        );

        let shapes = parse_shapes(&xml).unwrap();
        assert_eq!(
            shapes[0].content,
            ShapeContent::Chart {
                rel_id: "rId2".to_string()
            }
        );
    }

    #[test]
    fn test_group_members_are_not_shapes() {
        let xml = slide(
            r#"<p:grpSp><p:nvGrpSpPr><p:cNvPr id="6" name="Group 5"/></p:nvGrpSpPr>
<p:sp><p:nvSpPr><p:cNvPr id="7" name="Inner"/></p:nvSpPr>
<p:txBody><a:p><a:r><a:t>hidden</a:t></a:r></a:p></p:txBody></p:sp>
</p:grpSp>
<p:sp><p:nvSpPr><p:cNvPr id="8" name="Outer"/></p:nvSpPr>
<p:txBody><a:p><a:r><a:t>visible</a:t></a:r></a:p></p:txBody></p:sp>"#,
        );

        let shapes = parse_shapes(&xml).unwrap();
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[0].content, ShapeContent::Unhandled);
        assert_eq!(
            shapes[1].content,
            ShapeContent::TextFrame("visible".to_string())
        );
    }

    #[test]
    fn test_empty_slide() {
        let shapes = parse_shapes(&slide("")).unwrap();
        assert!(shapes.is_empty());
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        let result = parse_shapes("<p:sld><p:cSld><p:spTree></p:cSld></p:sld>");
        assert!(matches!(result, Err(Error::XmlError(_))));
    }
}
