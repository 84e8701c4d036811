//! Document layout for extracted slides.
//!
//! Turns slide records into a flat list of headings and paragraphs in a
//! fixed order per slide: text, then table rows, then chart data.

use crate::types::{ChartEntry, SlideRecord, TableRow};
use serde::{Deserialize, Serialize};

/// A layout element of the output document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Block {
    /// A heading paragraph. Level 0 is the document title.
    Heading { text: String, level: u8 },
    /// A plain body paragraph.
    Paragraph(String),
}

impl Block {
    /// Create a heading block.
    pub fn heading(text: impl Into<String>, level: u8) -> Self {
        Self::Heading {
            text: text.into(),
            level,
        }
    }

    /// Create a paragraph block.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph(text.into())
    }

    /// Text carried by the block.
    pub fn text(&self) -> &str {
        match self {
            Self::Heading { text, .. } => text,
            Self::Paragraph(text) => text,
        }
    }
}

/// Lays out slide records as headings and paragraphs.
#[derive(Debug, Clone)]
pub struct ReportLayout {
    /// Heading placed before each slide's text.
    slide_heading: String,
    /// Heading placed before a slide's table rows.
    table_heading: String,
    /// Heading placed before a slide's chart data.
    chart_heading: String,
}

impl Default for ReportLayout {
    fn default() -> Self {
        Self {
            slide_heading: "Slide Content".to_string(),
            table_heading: "Table Data".to_string(),
            chart_heading: "Chart Data".to_string(),
        }
    }
}

impl ReportLayout {
    /// Level of the per-slide heading.
    pub const SLIDE_HEADING_LEVEL: u8 = 2;
    /// Level of the table and chart subheadings.
    pub const SECTION_HEADING_LEVEL: u8 = 3;

    /// Create a layout with the default headings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lay out all slides in order.
    pub fn layout(&self, slides: &[SlideRecord]) -> Vec<Block> {
        let mut blocks = Vec::new();
        for slide in slides {
            self.layout_slide_into(slide, &mut blocks);
        }
        blocks
    }

    /// Lay out a single slide.
    pub fn layout_slide(&self, slide: &SlideRecord) -> Vec<Block> {
        let mut blocks = Vec::new();
        self.layout_slide_into(slide, &mut blocks);
        blocks
    }

    fn layout_slide_into(&self, slide: &SlideRecord, blocks: &mut Vec<Block>) {
        blocks.push(Block::heading(
            self.slide_heading.as_str(),
            Self::SLIDE_HEADING_LEVEL,
        ));
        blocks.push(Block::paragraph(slide.text.as_str()));

        if !slide.tables.is_empty() {
            blocks.push(Block::heading(
                self.table_heading.as_str(),
                Self::SECTION_HEADING_LEVEL,
            ));
            blocks.extend(slide.tables.iter().map(|row| Block::paragraph(format_row(row))));
        }

        if !slide.charts.is_empty() {
            blocks.push(Block::heading(
                self.chart_heading.as_str(),
                Self::SECTION_HEADING_LEVEL,
            ));
            for chart in &slide.charts {
                layout_chart(chart, blocks);
            }
        }
    }
}

/// Join the cells of a table row with tabs.
pub fn format_row(row: &TableRow) -> String {
    row.join("\t")
}

fn layout_chart(chart: &ChartEntry, blocks: &mut Vec<Block>) {
    blocks.push(Block::paragraph(format!("Chart Title: {}", chart.title)));
    for series in &chart.series {
        blocks.push(Block::paragraph(format!("Series: {}", series.name)));
        for point in &series.points {
            blocks.push(Block::paragraph(format!(
                "{}: {}",
                point.category,
                point.display_value()
            )));
        }
    }
}
