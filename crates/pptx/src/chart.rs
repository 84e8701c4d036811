//! Chart part (`ppt/charts/chartN.xml`) parsing.
//!
//! Reads just enough of a DrawingML chart to classify it and to recover the
//! cached series data: the chart kind of the first plot, the chart title, and
//! for every series its name, category labels and values.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use slidedoc_core::{Error, Result};
use std::collections::BTreeMap;

use crate::slide::SOFT_BREAK;

/// Rendering category of a chart, taken from its first plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    ColumnClustered,
    ColumnStacked,
    ColumnStacked100,
    BarClustered,
    BarStacked,
    BarStacked100,
    /// Any `bar3DChart`.
    Bar3D,
    Line,
    Pie,
    Doughnut,
    Area,
    Scatter,
    Bubble,
    Radar,
    Surface,
    /// No plot, or a plot element we don't recognize.
    Unknown,
}

impl ChartKind {
    /// True for the only chart kind whose data is extracted.
    pub fn is_supported(self) -> bool {
        self == Self::ColumnClustered
    }

    fn from_plot_name(name: &[u8]) -> Option<Self> {
        let kind = match name {
            // Refined from barDir/grouping once the plot has been read.
            b"barChart" => Self::ColumnClustered,
            b"bar3DChart" => Self::Bar3D,
            b"lineChart" | b"line3DChart" | b"stockChart" => Self::Line,
            b"pieChart" | b"pie3DChart" | b"ofPieChart" => Self::Pie,
            b"doughnutChart" => Self::Doughnut,
            b"areaChart" | b"area3DChart" => Self::Area,
            b"scatterChart" => Self::Scatter,
            b"bubbleChart" => Self::Bubble,
            b"radarChart" => Self::Radar,
            b"surfaceChart" | b"surface3DChart" => Self::Surface,
            _ => return None,
        };
        Some(kind)
    }

    fn bar(direction: &str, grouping: &str) -> Self {
        let column = direction != "bar";
        match (column, grouping) {
            (true, "stacked") => Self::ColumnStacked,
            (true, "percentStacked") => Self::ColumnStacked100,
            (true, _) => Self::ColumnClustered,
            (false, "stacked") => Self::BarStacked,
            (false, "percentStacked") => Self::BarStacked100,
            (false, _) => Self::BarClustered,
        }
    }
}

/// Cached data of one chart series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSeries {
    /// Series `c:idx`, used for ordering.
    pub index: u32,
    /// Series name, empty when the series has none.
    pub name: String,
    /// Category labels by point index.
    pub categories: BTreeMap<usize, String>,
    /// Declared category count (`c:cat//c:ptCount`), if categories exist.
    pub category_count: Option<usize>,
    /// Numeric values by point index.
    pub values: BTreeMap<usize, f64>,
    /// Declared value count (`c:val//c:ptCount`).
    pub value_count: Option<usize>,
}

impl ChartSeries {
    /// Number of data points in the series.
    ///
    /// Categories define the points when present; otherwise the values do.
    pub fn point_count(&self) -> usize {
        if self.category_count.is_some() || !self.categories.is_empty() {
            self.category_count
                .unwrap_or_else(|| count_from_indices(&self.categories))
        } else {
            self.value_count
                .unwrap_or_else(|| count_from_indices(&self.values))
        }
    }
}

fn count_from_indices<T>(map: &BTreeMap<usize, T>) -> usize {
    map.keys().next_back().map(|last| last + 1).unwrap_or(0)
}

/// Everything read from a chart part.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPart {
    pub kind: ChartKind,
    /// Text of the chart's rich title, empty when absent.
    pub title: String,
    /// Series of all plots, ordered by series index.
    pub series: Vec<ChartSeries>,
}

/// Which cache of a series a `c:pt` belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SeriesSection {
    Name,
    Categories,
    Values,
}

/// Parse the XML of a chart part.
pub fn parse_chart(xml: &str) -> Result<ChartPart> {
    let mut reader = Reader::from_str(xml);

    // Local names of the open elements, outermost first.
    let mut path: Vec<Vec<u8>> = Vec::new();

    let mut kind: Option<ChartKind> = None;
    let mut first_plot_depth: Option<usize> = None;
    let mut bar_direction = String::from("col");
    let mut bar_grouping = String::from("clustered");

    let mut title_paragraphs: Option<Vec<String>> = None;
    let mut title_depth: Option<usize> = None;
    let mut in_title_text = false;

    let mut series: Vec<ChartSeries> = Vec::new();
    let mut current: Option<ChartSeries> = None;
    let mut series_depth = 0usize;
    let mut section: Option<(SeriesSection, usize)> = None;
    let mut level_count = 0usize;
    let mut point_index: Option<usize> = None;
    let mut value_text: Option<String> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            Error::XmlError(format!(
                "Error parsing chart at position {}: {}",
                reader.buffer_position(),
                e
            ))
        })?;

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                let local = e.local_name().as_ref().to_vec();
                let depth = path.len() + 1;
                let parent = path.last().map(Vec::as_slice);

                // Plot kind from the first plot of the plot area.
                if parent == Some(b"plotArea".as_slice()) && kind.is_none() {
                    if let Some(plot_kind) = ChartKind::from_plot_name(&local) {
                        kind = Some(plot_kind);
                        if local == b"barChart" && !is_empty {
                            first_plot_depth = Some(depth);
                        }
                    }
                }
                if first_plot_depth.map(|d| d + 1) == Some(depth) {
                    match local.as_slice() {
                        b"barDir" => {
                            if let Some(val) = attr_value(e, b"val")? {
                                bar_direction = val;
                            }
                        }
                        b"grouping" => {
                            if let Some(val) = attr_value(e, b"val")? {
                                bar_grouping = val;
                            }
                        }
                        _ => {}
                    }
                }

                // Chart title: c:chart/c:title only, axis titles live deeper.
                if local == b"title"
                    && parent == Some(b"chart".as_slice())
                    && title_depth.is_none()
                    && !is_empty
                {
                    title_depth = Some(depth);
                }
                if let Some(td) = title_depth {
                    if depth > td && path.iter().skip(td).any(|n| n == b"rich") {
                        match local.as_slice() {
                            b"p" => title_paragraphs
                                .get_or_insert_with(Vec::new)
                                .push(String::new()),
                            b"t" => in_title_text = !is_empty,
                            b"br" => push_paragraph_text(&mut title_paragraphs, SOFT_BREAK),
                            _ => {}
                        }
                    }
                }

                // Series data: only series that are direct children of a plot.
                // Filtered (hidden) series sit deeper, under the plot's extLst.
                let in_plot = path.len() >= 2 && path[path.len() - 2] == b"plotArea";
                if local == b"ser" && !is_empty && current.is_none() && in_plot {
                    current = Some(ChartSeries::default());
                    series_depth = depth;
                } else if let Some(ser) = current.as_mut() {
                    if depth == series_depth + 1 {
                        section = match local.as_slice() {
                            b"idx" => {
                                if let Some(val) = attr_value(e, b"val")? {
                                    ser.index = val.parse().unwrap_or(0);
                                }
                                None
                            }
                            b"tx" => Some((SeriesSection::Name, depth)),
                            b"cat" | b"xVal" => Some((SeriesSection::Categories, depth)),
                            b"val" | b"yVal" => Some((SeriesSection::Values, depth)),
                            _ => None,
                        };
                        level_count = 0;
                        if is_empty {
                            section = None;
                        }
                    } else if let Some((which, _)) = section {
                        match local.as_slice() {
                            b"lvl" => level_count += 1,
                            b"ptCount" => {
                                let count = attr_value(e, b"val")?.and_then(|v| v.parse().ok());
                                match which {
                                    SeriesSection::Categories => ser.category_count = count,
                                    SeriesSection::Values => ser.value_count = count,
                                    SeriesSection::Name => {}
                                }
                            }
                            b"pt" => {
                                point_index =
                                    attr_value(e, b"idx")?.and_then(|v| v.parse().ok());
                            }
                            b"v" if !is_empty => value_text = Some(String::new()),
                            _ => {}
                        }
                    }
                }

                if !is_empty {
                    path.push(local);
                }
            }
            Event::Text(ref e) => {
                if in_title_text || value_text.is_some() {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::XmlError(format!("Bad chart text: {}", e)))?;
                    if in_title_text {
                        push_paragraph_text(&mut title_paragraphs, &text);
                    } else if let Some(buf) = value_text.as_mut() {
                        buf.push_str(&text);
                    }
                }
            }
            Event::End(_) => {
                let depth = path.len();
                let local = path.pop().unwrap_or_default();

                match local.as_slice() {
                    b"t" => in_title_text = false,
                    b"v" => {
                        if let (Some(ser), Some((which, _)), Some(text)) =
                            (current.as_mut(), section, value_text.take())
                        {
                            // Only the leaf level of multi-level categories.
                            if level_count <= 1 {
                                store_value(ser, which, point_index, text);
                            }
                        }
                    }
                    b"pt" => point_index = None,
                    _ => {}
                }

                if title_depth == Some(depth) {
                    title_depth = None;
                }
                if first_plot_depth == Some(depth) {
                    first_plot_depth = None;
                }
                if section.map(|(_, d)| d) == Some(depth) {
                    section = None;
                }
                if current.is_some() && series_depth == depth {
                    if let Some(ser) = current.take() {
                        series.push(ser);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let kind = match kind {
        Some(ChartKind::ColumnClustered) => ChartKind::bar(&bar_direction, &bar_grouping),
        Some(other) => other,
        None => ChartKind::Unknown,
    };

    // Stable, so series sharing an index keep document order.
    series.sort_by_key(|s| s.index);

    Ok(ChartPart {
        kind,
        title: title_paragraphs.map(|p| p.join("\n")).unwrap_or_default(),
        series,
    })
}

fn push_paragraph_text(paragraphs: &mut Option<Vec<String>>, text: &str) {
    let paragraphs = paragraphs.get_or_insert_with(Vec::new);
    match paragraphs.last_mut() {
        Some(last) => last.push_str(text),
        None => paragraphs.push(text.to_string()),
    }
}

fn store_value(ser: &mut ChartSeries, which: SeriesSection, index: Option<usize>, text: String) {
    match which {
        SeriesSection::Name => {
            // Either a literal c:tx/c:v or the first cached string.
            if ser.name.is_empty() {
                ser.name = text;
            }
        }
        SeriesSection::Categories => {
            if let Some(idx) = index {
                ser.categories.entry(idx).or_insert(text);
            }
        }
        SeriesSection::Values => {
            let Some(idx) = index else { return };
            match text.trim().parse::<f64>() {
                Ok(value) => {
                    ser.values.insert(idx, value);
                }
                Err(_) => log::warn!("Ignoring non-numeric chart value '{}'", text),
            }
        }
    }
}

fn attr_value(e: &BytesStart, name: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == name {
            let value = attr
                .unescape_value()
                .map_err(|e| Error::XmlError(format!("Bad chart attribute: {}", e)))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart_xml(title: &str, plot: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<c:chartSpace xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">
<c:chart>{}<c:autoTitleDeleted val="0"/>
<c:plotArea><c:layout/>{}
<c:catAx><c:axId val="1"/><c:title><c:tx><c:rich><a:p><a:r><a:t>Axis</a:t></a:r></a:p></c:rich></c:tx></c:title></c:catAx>
<c:valAx><c:axId val="2"/></c:valAx>
</c:plotArea></c:chart></c:chartSpace>"#,
            title, plot
        )
    }

    const TITLE: &str = r#"<c:title><c:tx><c:rich><a:bodyPr/><a:p><a:r><a:t>Quarterly </a:t></a:r><a:r><a:t>Revenue</a:t></a:r></a:p></c:rich></c:tx><c:overlay val="0"/></c:title>"#;

    const SERIES: &str = r#"
<c:ser><c:idx val="1"/><c:order val="1"/>
  <c:tx><c:strRef><c:f>Sheet1!$C$1</c:f><c:strCache><c:ptCount val="1"/><c:pt idx="0"><c:v>S2</c:v></c:pt></c:strCache></c:strRef></c:tx>
  <c:cat><c:strRef><c:f>Sheet1!$A$2:$A$3</c:f><c:strCache><c:ptCount val="2"/>
    <c:pt idx="0"><c:v>Q1</c:v></c:pt><c:pt idx="1"><c:v>Q2</c:v></c:pt></c:strCache></c:strRef></c:cat>
  <c:val><c:numRef><c:f>Sheet1!$C$2:$C$3</c:f><c:numCache><c:formatCode>General</c:formatCode><c:ptCount val="2"/>
    <c:pt idx="0"><c:v>3.5</c:v></c:pt><c:pt idx="1"><c:v>4</c:v></c:pt></c:numCache></c:numRef></c:val>
</c:ser>
<c:ser><c:idx val="0"/><c:order val="0"/>
  <c:tx><c:strRef><c:f>Sheet1!$B$1</c:f><c:strCache><c:ptCount val="1"/><c:pt idx="0"><c:v>S1</c:v></c:pt></c:strCache></c:strRef></c:tx>
  <c:cat><c:strRef><c:f>Sheet1!$A$2:$A$3</c:f><c:strCache><c:ptCount val="2"/>
    <c:pt idx="0"><c:v>Q1</c:v></c:pt><c:pt idx="1"><c:v>Q2</c:v></c:pt></c:strCache></c:strRef></c:cat>
  <c:val><c:numRef><c:f>Sheet1!$B$2:$B$3</c:f><c:numCache><c:formatCode>General</c:formatCode><c:ptCount val="2"/>
    <c:pt idx="0"><c:v>10</c:v></c:pt><c:pt idx="1"><c:v>20</c:v></c:pt></c:numCache></c:numRef></c:val>
</c:ser>"#;

    fn bar_plot(direction: &str, grouping: &str) -> String {
        format!(
            r#"<c:barChart><c:barDir val="{}"/><c:grouping val="{}"/><c:varyColors val="0"/>{}<c:gapWidth val="219"/><c:axId val="1"/><c:axId val="2"/></c:barChart>"#,
            direction, grouping, SERIES
        )
    }

    #[test]
    fn test_clustered_column() {
        let chart = parse_chart(&chart_xml(TITLE, &bar_plot("col", "clustered"))).unwrap();

        assert_eq!(chart.kind, ChartKind::ColumnClustered);
        assert!(chart.kind.is_supported());
        assert_eq!(chart.title, "Quarterly Revenue");
    }

    #[test]
    fn test_series_sorted_by_index() {
        let chart = parse_chart(&chart_xml(TITLE, &bar_plot("col", "clustered"))).unwrap();

        let names: Vec<&str> = chart.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["S1", "S2"]);

        let s1 = &chart.series[0];
        assert_eq!(s1.point_count(), 2);
        assert_eq!(s1.categories.get(&0).map(String::as_str), Some("Q1"));
        assert_eq!(s1.categories.get(&1).map(String::as_str), Some("Q2"));
        assert_eq!(s1.values.get(&0), Some(&10.0));
        assert_eq!(s1.values.get(&1), Some(&20.0));
        assert_eq!(chart.series[1].values.get(&0), Some(&3.5));
    }

    #[test]
    fn test_bar_variants() {
        let cases = [
            ("col", "stacked", ChartKind::ColumnStacked),
            ("col", "percentStacked", ChartKind::ColumnStacked100),
            ("col", "standard", ChartKind::ColumnClustered),
            ("bar", "clustered", ChartKind::BarClustered),
            ("bar", "stacked", ChartKind::BarStacked),
            ("bar", "percentStacked", ChartKind::BarStacked100),
        ];
        for (direction, grouping, expected) in cases {
            let chart = parse_chart(&chart_xml("", &bar_plot(direction, grouping))).unwrap();
            assert_eq!(chart.kind, expected, "{} / {}", direction, grouping);
            assert!(!chart.kind.is_supported() || expected == ChartKind::ColumnClustered);
        }
    }

    #[test]
    fn test_bar_defaults_to_clustered_column() {
        let plot = format!("<c:barChart>{}</c:barChart>", SERIES);
        let chart = parse_chart(&chart_xml("", &plot)).unwrap();
        assert_eq!(chart.kind, ChartKind::ColumnClustered);
    }

    #[test]
    fn test_other_kinds() {
        let line = format!(
            "<c:lineChart><c:grouping val=\"standard\"/>{}</c:lineChart>",
            SERIES
        );
        assert_eq!(parse_chart(&chart_xml("", &line)).unwrap().kind, ChartKind::Line);

        let pie = format!("<c:pieChart><c:varyColors val=\"1\"/>{}</c:pieChart>", SERIES);
        assert_eq!(parse_chart(&chart_xml("", &pie)).unwrap().kind, ChartKind::Pie);

        let bar3d = format!(
            "<c:bar3DChart><c:barDir val=\"col\"/><c:grouping val=\"clustered\"/>{}</c:bar3DChart>",
            SERIES
        );
        assert_eq!(parse_chart(&chart_xml("", &bar3d)).unwrap().kind, ChartKind::Bar3D);

        assert_eq!(parse_chart(&chart_xml("", "")).unwrap().kind, ChartKind::Unknown);
    }

    #[test]
    fn test_first_plot_decides_kind() {
        let combo = format!(
            "{}<c:lineChart><c:grouping val=\"standard\"/></c:lineChart>",
            bar_plot("col", "clustered")
        );
        let chart = parse_chart(&chart_xml("", &combo)).unwrap();
        assert_eq!(chart.kind, ChartKind::ColumnClustered);
    }

    #[test]
    fn test_missing_title_and_axis_title_ignored() {
        let chart = parse_chart(&chart_xml("", &bar_plot("col", "clustered"))).unwrap();
        assert_eq!(chart.title, "");
    }

    #[test]
    fn test_literal_name_and_multi_level_categories() {
        let plot = r#"<c:barChart><c:barDir val="col"/><c:grouping val="clustered"/>
<c:ser><c:idx val="0"/><c:tx><c:v>Literal</c:v></c:tx>
  <c:cat><c:multiLvlStrRef><c:f>Sheet1!$A$2:$B$3</c:f><c:multiLvlStrCache><c:ptCount val="2"/>
    <c:lvl><c:pt idx="0"><c:v>Jan</c:v></c:pt><c:pt idx="1"><c:v>Feb</c:v></c:pt></c:lvl>
    <c:lvl><c:pt idx="0"><c:v>2024</c:v></c:pt></c:lvl>
  </c:multiLvlStrCache></c:multiLvlStrRef></c:cat>
  <c:val><c:numLit><c:ptCount val="2"/><c:pt idx="0"><c:v>1</c:v></c:pt></c:numLit></c:val>
</c:ser></c:barChart>"#;

        let chart = parse_chart(&chart_xml("", plot)).unwrap();
        let ser = &chart.series[0];
        assert_eq!(ser.name, "Literal");
        assert_eq!(ser.categories.get(&0).map(String::as_str), Some("Jan"));
        assert_eq!(ser.categories.get(&1).map(String::as_str), Some("Feb"));
        assert_eq!(ser.values.get(&1), None);
        assert_eq!(ser.point_count(), 2);
    }

    #[test]
    fn test_point_count_without_categories() {
        let plot = r#"<c:barChart>
<c:ser><c:idx val="0"/>
  <c:val><c:numRef><c:numCache><c:pt idx="0"><c:v>1</c:v></c:pt><c:pt idx="2"><c:v>3</c:v></c:pt></c:numCache></c:numRef></c:val>
</c:ser></c:barChart>"#;

        let chart = parse_chart(&chart_xml("", plot)).unwrap();
        let ser = &chart.series[0];
        assert!(ser.categories.is_empty());
        assert_eq!(ser.point_count(), 3);
    }

    #[test]
    fn test_filtered_series_ignored() {
        let plot = format!(
            r#"<c:barChart><c:barDir val="col"/><c:grouping val="clustered"/>{}
<c:extLst><c:ext uri="{{02D57815-91ED-43cb-92C2-25804820EDAC}}" xmlns:c15="http://schemas.microsoft.com/office/drawing/2012/chart">
<c15:filteredBarSeries><c15:ser><c:idx val="2"/><c:order val="2"/>
  <c:tx><c:strRef><c:strCache><c:ptCount val="1"/><c:pt idx="0"><c:v>HIDDEN</c:v></c:pt></c:strCache></c:strRef></c:tx>
  <c:cat><c:strRef><c:strCache><c:ptCount val="1"/><c:pt idx="0"><c:v>Q1</c:v></c:pt></c:strCache></c:strRef></c:cat>
  <c:val><c:numRef><c:numCache><c:ptCount val="1"/><c:pt idx="0"><c:v>99</c:v></c:pt></c:numCache></c:numRef></c:val>
</c15:ser></c15:filteredBarSeries></c:ext></c:extLst></c:barChart>"#,
            SERIES
        );

        let chart = parse_chart(&chart_xml("", &plot)).unwrap();
        let names: Vec<&str> = chart.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["S1", "S2"]);
    }

    #[test]
    fn test_title_soft_break() {
        let title = r#"<c:title><c:tx><c:rich><a:p><a:r><a:t>Net</a:t></a:r><a:br/><a:r><a:t>Sales</a:t></a:r></a:p></c:rich></c:tx></c:title>"#;
        let chart = parse_chart(&chart_xml(title, &bar_plot("col", "clustered"))).unwrap();
        assert_eq!(chart.title, "Net\x0BSales");
    }

    #[test]
    fn test_malformed_chart() {
        assert!(matches!(
            parse_chart("<c:chartSpace><c:chart></c:chartSpace>"),
            Err(Error::XmlError(_))
        ));
    }
}
