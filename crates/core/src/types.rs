//! Domain types for representing extracted presentation content.

use serde::{Deserialize, Serialize};

/// An entire presentation with its extracted content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Presentation {
    /// Original filename (without path).
    pub filename: String,

    /// Slides in presentation order.
    pub slides: Vec<SlideRecord>,
}

impl Presentation {
    /// Create an empty presentation with the given filename.
    pub fn new(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            slides: Vec::new(),
        }
    }

    /// Add a slide to the presentation.
    pub fn add_slide(&mut self, slide: SlideRecord) {
        self.slides.push(slide);
    }
}

/// One row of a table, as sanitized cell strings.
///
/// Rows of the same table are not required to have the same width.
pub type TableRow = Vec<String>;

/// Everything extracted from a single slide.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlideRecord {
    /// 1-based slide number.
    pub number: usize,

    /// Text of every text-bearing shape, newline-joined in shape order.
    pub text: String,

    /// Rows of every table on the slide, in shape order.
    pub tables: Vec<TableRow>,

    /// Data of every supported chart on the slide, in shape order.
    pub charts: Vec<ChartEntry>,
}

impl SlideRecord {
    /// Create an empty record for the given slide number.
    pub fn new(number: usize) -> Self {
        Self {
            number,
            ..Self::default()
        }
    }

    /// True if the slide produced no text, tables or charts.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.tables.is_empty() && self.charts.is_empty()
    }
}

/// Data extracted from one chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartEntry {
    /// Chart title, empty when the chart has none.
    pub title: String,

    /// Series keyed by name, in first-insertion order.
    pub series: Vec<SeriesEntry>,
}

impl ChartEntry {
    /// Create a chart entry with no series.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            series: Vec::new(),
        }
    }

    /// Insert a series, replacing the points of an existing series with the same name.
    ///
    /// A replaced series keeps its original position.
    pub fn insert_series(&mut self, name: impl Into<String>, points: Vec<DataPoint>) {
        let name = name.into();
        match self.series.iter_mut().find(|s| s.name == name) {
            Some(existing) => existing.points = points,
            None => self.series.push(SeriesEntry { name, points }),
        }
    }

    /// Look up a series by name.
    pub fn get(&self, name: &str) -> Option<&SeriesEntry> {
        self.series.iter().find(|s| s.name == name)
    }
}

/// A named series of chart data points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesEntry {
    /// Series name.
    pub name: String,

    /// Points in category order.
    pub points: Vec<DataPoint>,
}

/// A single (category, value) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Category label of the point.
    pub category: String,

    /// Numeric value, `None` when the chart caches no value for the point.
    pub value: Option<f64>,
}

impl DataPoint {
    /// Create a point with a value.
    pub fn new(category: impl Into<String>, value: f64) -> Self {
        Self {
            category: category.into(),
            value: Some(value),
        }
    }

    /// Render the value for display: shortest float form, empty when missing.
    pub fn display_value(&self) -> String {
        self.value.map(|v| v.to_string()).unwrap_or_default()
    }
}
