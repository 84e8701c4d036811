//! In-memory PPTX packages for tests.
//!
//! Builds minimal but well-formed presentations: a content types part, the
//! presentation part with its relationships, slides, and chart parts.

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const NS_DECLS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

const REL_SLIDE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
const REL_CHART: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart";

/// One slide of a fixture presentation.
#[derive(Debug, Clone, Default)]
pub struct SlideFixture {
    shapes: Vec<String>,
    charts: Vec<(String, String)>,
}

impl SlideFixture {
    /// An empty slide.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text box with one paragraph per entry.
    pub fn text_box(mut self, name: &str, paragraphs: &[&str]) -> Self {
        let id = self.shapes.len() + 2;
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<a:p><a:r><a:rPr lang=\"en-US\"/><a:t>{}</a:t></a:r></a:p>", escape(p)))
            .collect();
        self.shapes.push(format!(
            r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="{}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/>{}</p:txBody></p:sp>"#,
            id,
            escape(name),
            body
        ));
        self
    }

    /// Add a picture, which carries no extractable content.
    pub fn picture(mut self, name: &str) -> Self {
        let id = self.shapes.len() + 2;
        self.shapes.push(format!(
            r#"<p:pic><p:nvPicPr><p:cNvPr id="{}" name="{}"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr><p:blipFill/><p:spPr/></p:pic>"#,
            id,
            escape(name)
        ));
        self
    }

    /// Add a table.
    pub fn table(mut self, rows: &[&[&str]]) -> Self {
        let id = self.shapes.len() + 2;
        let rows_xml: String = rows
            .iter()
            .map(|row| {
                let cells: String = row
                    .iter()
                    .map(|cell| {
                        format!(
                            "<a:tc><a:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:t>{}</a:t></a:r></a:p></a:txBody><a:tcPr/></a:tc>",
                            escape(cell)
                        )
                    })
                    .collect();
                format!("<a:tr h=\"370840\">{}</a:tr>", cells)
            })
            .collect();
        self.shapes.push(format!(
            r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="{}" name="Table {}"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr><p:xfrm/><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/table"><a:tbl><a:tblPr/><a:tblGrid/>{}</a:tbl></a:graphicData></a:graphic></p:graphicFrame>"#,
            id, id, rows_xml
        ));
        self
    }

    /// Add a chart graphic frame backed by the given chart part XML.
    pub fn chart(mut self, chart_xml: String) -> Self {
        let id = self.shapes.len() + 2;
        let rel_id = format!("rId{}", self.charts.len() + 2);
        self.shapes.push(format!(
            r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="{}" name="Chart {}"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr><p:xfrm/><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/chart"><c:chart xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" r:id="{}"/></a:graphicData></a:graphic></p:graphicFrame>"#,
            id, id, rel_id
        ));
        self.charts.push((rel_id, chart_xml));
        self
    }

    fn xml(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld {}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:spTree></p:cSld></p:sld>"#,
            NS_DECLS,
            self.shapes.concat()
        )
    }
}

/// Builder for a whole presentation package.
#[derive(Debug, Clone)]
pub struct PptxBuilder {
    slides: Vec<SlideFixture>,
    slide_id_list: bool,
}

impl Default for PptxBuilder {
    fn default() -> Self {
        Self {
            slides: Vec::new(),
            slide_id_list: true,
        }
    }
}

impl PptxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a slide.
    pub fn slide(mut self, slide: SlideFixture) -> Self {
        self.slides.push(slide);
        self
    }

    /// Omit `p:sldIdLst`, as some generators do.
    pub fn without_slide_id_list(mut self) -> Self {
        self.slide_id_list = false;
        self
    }

    /// Serialize the package to bytes.
    pub fn build(&self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut overrides = String::from(
            r#"<Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>"#,
        );
        let mut presentation_rels = String::new();
        let mut slide_ids = String::new();
        let mut chart_number = 0;

        let put = |zip: &mut ZipWriter<Cursor<Vec<u8>>>, name: &str, content: &str| {
            zip.start_file(name, options).expect("start fixture part");
            zip.write_all(content.as_bytes()).expect("write fixture part");
        };

        for (idx, slide) in self.slides.iter().enumerate() {
            let number = idx + 1;
            let rel_id = format!("rId{}", number + 1);
            overrides.push_str(&format!(
                r#"<Override PartName="/ppt/slides/slide{}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#,
                number
            ));
            presentation_rels.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="slides/slide{}.xml"/>"#,
                rel_id, REL_SLIDE, number
            ));
            slide_ids.push_str(&format!(
                r#"<p:sldId id="{}" r:id="{}"/>"#,
                255 + number,
                rel_id
            ));

            let mut slide_rels = String::new();
            for (chart_rel, chart_xml) in &slide.charts {
                chart_number += 1;
                slide_rels.push_str(&format!(
                    r#"<Relationship Id="{}" Type="{}" Target="../charts/chart{}.xml"/>"#,
                    chart_rel, REL_CHART, chart_number
                ));
                overrides.push_str(&format!(
                    r#"<Override PartName="/ppt/charts/chart{}.xml" ContentType="application/vnd.openxmlformats-officedocument.drawingml.chart+xml"/>"#,
                    chart_number
                ));
                put(
                    &mut zip,
                    &format!("ppt/charts/chart{}.xml", chart_number),
                    chart_xml,
                );
            }

            put(&mut zip, &format!("ppt/slides/slide{}.xml", number), &slide.xml());
            put(
                &mut zip,
                &format!("ppt/slides/_rels/slide{}.xml.rels", number),
                &relationships(&slide_rels),
            );
        }

        let slide_id_list = if self.slide_id_list {
            format!("<p:sldIdLst>{}</p:sldIdLst>", slide_ids)
        } else {
            String::new()
        };
        put(
            &mut zip,
            "ppt/presentation.xml",
            &format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation {}>{}<p:sldSz cx="12192000" cy="6858000"/></p:presentation>"#,
                NS_DECLS, slide_id_list
            ),
        );
        put(
            &mut zip,
            "ppt/_rels/presentation.xml.rels",
            &relationships(&presentation_rels),
        );
        put(
            &mut zip,
            "_rels/.rels",
            &relationships(
                r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/>"#,
            ),
        );
        put(
            &mut zip,
            "[Content_Types].xml",
            &format!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/>{}</Types>"#,
                overrides
            ),
        );

        zip.finish().expect("finish fixture package").into_inner()
    }
}

/// Chart part XML for a bar chart with the given direction and grouping.
pub fn bar_chart(
    direction: &str,
    grouping: &str,
    title: &str,
    series: &[(&str, &[(&str, f64)])],
) -> String {
    chart_space(
        title,
        &format!(
            r#"<c:barChart><c:barDir val="{}"/><c:grouping val="{}"/><c:varyColors val="0"/>{}<c:gapWidth val="219"/><c:axId val="1"/><c:axId val="2"/></c:barChart>"#,
            direction,
            grouping,
            series_xml(series)
        ),
    )
}

/// Chart part XML for a clustered column chart.
pub fn clustered_column_chart(title: &str, series: &[(&str, &[(&str, f64)])]) -> String {
    bar_chart("col", "clustered", title, series)
}

/// Chart part XML for a line chart.
pub fn line_chart(title: &str, series: &[(&str, &[(&str, f64)])]) -> String {
    chart_space(
        title,
        &format!(
            r#"<c:lineChart><c:grouping val="standard"/><c:varyColors val="0"/>{}<c:axId val="1"/><c:axId val="2"/></c:lineChart>"#,
            series_xml(series)
        ),
    )
}

fn chart_space(title: &str, plot: &str) -> String {
    let title_xml = if title.is_empty() {
        String::new()
    } else {
        format!(
            r#"<c:title><c:tx><c:rich><a:bodyPr/><a:lstStyle/><a:p><a:r><a:t>{}</a:t></a:r></a:p></c:rich></c:tx><c:overlay val="0"/></c:title>"#,
            escape(title)
        )
    };
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<c:chartSpace xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><c:chart>{}<c:autoTitleDeleted val="0"/><c:plotArea><c:layout/>{}<c:catAx><c:axId val="1"/></c:catAx><c:valAx><c:axId val="2"/></c:valAx></c:plotArea></c:chart></c:chartSpace>"#,
        title_xml, plot
    )
}

fn series_xml(series: &[(&str, &[(&str, f64)])]) -> String {
    series
        .iter()
        .enumerate()
        .map(|(idx, (name, points))| {
            let cats: String = points
                .iter()
                .enumerate()
                .map(|(i, (cat, _))| format!(r#"<c:pt idx="{}"><c:v>{}</c:v></c:pt>"#, i, escape(cat)))
                .collect();
            let vals: String = points
                .iter()
                .enumerate()
                .map(|(i, (_, val))| format!(r#"<c:pt idx="{}"><c:v>{}</c:v></c:pt>"#, i, val))
                .collect();
            format!(
                r#"<c:ser><c:idx val="{idx}"/><c:order val="{idx}"/><c:tx><c:strRef><c:f>Sheet1!$B$1</c:f><c:strCache><c:ptCount val="1"/><c:pt idx="0"><c:v>{name}</c:v></c:pt></c:strCache></c:strRef></c:tx><c:cat><c:strRef><c:f>Sheet1!$A$2</c:f><c:strCache><c:ptCount val="{count}"/>{cats}</c:strCache></c:strRef></c:cat><c:val><c:numRef><c:f>Sheet1!$B$2</c:f><c:numCache><c:formatCode>General</c:formatCode><c:ptCount val="{count}"/>{vals}</c:numCache></c:numRef></c:val></c:ser>"#,
                idx = idx,
                name = escape(name),
                count = points.len(),
                cats = cats,
                vals = vals
            )
        })
        .collect()
}

fn relationships(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
        body
    )
}

fn escape(s: &str) -> String {
    quick_xml::escape::escape(s).into_owned()
}
