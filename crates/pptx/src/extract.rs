//! Per-slide extraction of text, table rows and chart data.

use crate::chart::ChartPart;
use crate::slide::{Shape, ShapeContent};
use slidedoc_core::{
    sanitize_text, ChartEntry, DataPoint, Error, Result, SlideRecord, TableRow,
};

/// Build the record of one slide from its shapes.
///
/// `load_chart` resolves a chart relationship id to the parsed chart part.
pub fn extract_slide<F>(number: usize, shapes: &[Shape], load_chart: F) -> Result<SlideRecord>
where
    F: FnMut(&str) -> Result<ChartPart>,
{
    Ok(SlideRecord {
        number,
        text: extract_text(shapes),
        tables: extract_tables(shapes),
        charts: extract_charts(shapes, load_chart)?,
    })
}

/// Newline-joined text of every text-bearing shape.
pub fn extract_text(shapes: &[Shape]) -> String {
    shapes
        .iter()
        .filter_map(|shape| match &shape.content {
            ShapeContent::TextFrame(text) => Some(sanitize_text(text)),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rows of every table, each cell sanitized.
pub fn extract_tables(shapes: &[Shape]) -> Vec<TableRow> {
    shapes
        .iter()
        .filter_map(|shape| match &shape.content {
            ShapeContent::Table(rows) => Some(rows),
            _ => None,
        })
        .flatten()
        .map(|row| row.iter().map(|cell| sanitize_text(cell)).collect())
        .collect()
}

/// Chart entries of every supported chart.
pub fn extract_charts<F>(shapes: &[Shape], mut load_chart: F) -> Result<Vec<ChartEntry>>
where
    F: FnMut(&str) -> Result<ChartPart>,
{
    let mut charts = Vec::new();

    for shape in shapes {
        let ShapeContent::Chart { rel_id } = &shape.content else {
            continue;
        };

        let part = load_chart(rel_id)?;
        match chart_entry(&part)? {
            Some(entry) => charts.push(entry),
            None => log::debug!(
                "Skipping chart '{}' of unsupported kind {:?}",
                shape.name,
                part.kind
            ),
        }
    }

    Ok(charts)
}

/// Convert a parsed chart into an entry, or `None` for unsupported kinds.
///
/// Every point must have a category label; a point without one fails the
/// whole chart.
pub fn chart_entry(part: &ChartPart) -> Result<Option<ChartEntry>> {
    if !part.kind.is_supported() {
        return Ok(None);
    }

    let mut entry = ChartEntry::new(sanitize_text(&part.title));

    for series in &part.series {
        let name = sanitize_text(&series.name);
        let mut points = Vec::new();

        for index in 0..series.point_count() {
            let label = series
                .categories
                .get(&index)
                .ok_or_else(|| Error::MissingPointLabel {
                    series: name.clone(),
                    index,
                })?;
            points.push(DataPoint {
                category: sanitize_text(label),
                value: series.values.get(&index).copied(),
            });
        }

        entry.insert_series(name, points);
    }

    Ok(Some(entry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartKind, ChartSeries};
    use std::collections::BTreeMap;

    fn shape(content: ShapeContent) -> Shape {
        Shape {
            name: "shape".to_string(),
            content,
        }
    }

    fn series(name: &str, points: &[(&str, f64)]) -> ChartSeries {
        ChartSeries {
            index: 0,
            name: name.to_string(),
            categories: points
                .iter()
                .enumerate()
                .map(|(i, (c, _))| (i, c.to_string()))
                .collect(),
            category_count: Some(points.len()),
            values: points.iter().enumerate().map(|(i, (_, v))| (i, *v)).collect(),
            value_count: Some(points.len()),
        }
    }

    fn chart(kind: ChartKind, series: Vec<ChartSeries>) -> ChartPart {
        ChartPart {
            kind,
            title: "Revenue".to_string(),
            series,
        }
    }

    fn no_charts(rel_id: &str) -> Result<ChartPart> {
        Err(Error::MissingPart(rel_id.to_string()))
    }

    #[test]
    fn test_slide_without_shapes() {
        let record = extract_slide(1, &[], no_charts).unwrap();
        assert_eq!(record.text, "");
        assert!(record.tables.is_empty());
        assert!(record.charts.is_empty());
    }

    #[test]
    fn test_text_joined_and_sanitized() {
        let shapes = vec![
            shape(ShapeContent::TextFrame("Title\x0B".to_string())),
            shape(ShapeContent::Unhandled),
            shape(ShapeContent::TextFrame("Body\tline".to_string())),
        ];
        assert_eq!(extract_text(&shapes), "Title\nBody\tline");
    }

    #[test]
    fn test_empty_text_frame_still_contributes() {
        let shapes = vec![
            shape(ShapeContent::TextFrame("a".to_string())),
            shape(ShapeContent::TextFrame(String::new())),
            shape(ShapeContent::TextFrame("b".to_string())),
        ];
        assert_eq!(extract_text(&shapes), "a\n\nb");
    }

    #[test]
    fn test_tables_flattened_and_sanitized() {
        let shapes = vec![
            shape(ShapeContent::Table(vec![
                vec!["a".to_string(), "b\x01".to_string()],
                vec!["c".to_string(), "d".to_string()],
            ])),
            shape(ShapeContent::TextFrame("ignored".to_string())),
            shape(ShapeContent::Table(vec![vec!["e".to_string()]])),
        ];

        assert_eq!(
            extract_tables(&shapes),
            vec![
                vec!["a".to_string(), "b".to_string()],
                vec!["c".to_string(), "d".to_string()],
                vec!["e".to_string()],
            ]
        );
    }

    #[test]
    fn test_supported_chart() {
        let shapes = vec![shape(ShapeContent::Chart {
            rel_id: "rId2".to_string(),
        })];

        let charts = extract_charts(&shapes, |rel_id| {
            assert_eq!(rel_id, "rId2");
            Ok(chart(
                ChartKind::ColumnClustered,
                vec![series("S1", &[("Q1", 10.0), ("Q2", 20.0)])],
            ))
        })
        .unwrap();

        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].title, "Revenue");
        assert_eq!(
            charts[0].get("S1").unwrap().points,
            vec![DataPoint::new("Q1", 10.0), DataPoint::new("Q2", 20.0)]
        );
    }

    #[test]
    fn test_unsupported_chart_skipped() {
        for kind in [ChartKind::Line, ChartKind::BarClustered, ChartKind::ColumnStacked] {
            let part = chart(kind, vec![series("S1", &[("Q1", 1.0)])]);
            assert_eq!(chart_entry(&part).unwrap(), None);
        }
    }

    #[test]
    fn test_missing_label_is_an_error() {
        let mut ser = series("S1", &[("Q1", 1.0), ("Q2", 2.0)]);
        ser.categories.remove(&1);
        let part = chart(ChartKind::ColumnClustered, vec![ser]);

        match chart_entry(&part) {
            Err(Error::MissingPointLabel { series, index }) => {
                assert_eq!(series, "S1");
                assert_eq!(index, 1);
            }
            other => panic!("expected missing label error, got {:?}", other),
        }
    }

    #[test]
    fn test_oversized_point_count_is_an_error() {
        let mut ser = series("S1", &[("Q1", 1.0)]);
        ser.category_count = Some(1_000_000_000_000_000_000);
        let part = chart(ChartKind::ColumnClustered, vec![ser]);

        assert!(matches!(
            chart_entry(&part),
            Err(Error::MissingPointLabel { index: 1, .. })
        ));
    }

    #[test]
    fn test_soft_break_joins_runs() {
        let shapes = vec![shape(ShapeContent::TextFrame("line\x0Bbreak".to_string()))];
        assert_eq!(extract_text(&shapes), "linebreak");
    }

    #[test]
    fn test_missing_value_is_none() {
        let mut ser = series("S1", &[("Q1", 1.0)]);
        ser.values = BTreeMap::new();
        let part = chart(ChartKind::ColumnClustered, vec![ser]);

        let entry = chart_entry(&part).unwrap().unwrap();
        assert_eq!(entry.series[0].points[0].value, None);
    }

    #[test]
    fn test_duplicate_series_name_replaces() {
        let part = chart(
            ChartKind::ColumnClustered,
            vec![
                series("S", &[("Q1", 1.0)]),
                series("T", &[("Q1", 2.0)]),
                series("S", &[("Q1", 3.0)]),
            ],
        );

        let entry = chart_entry(&part).unwrap().unwrap();
        assert_eq!(entry.series.len(), 2);
        assert_eq!(entry.series[0].name, "S");
        assert_eq!(entry.series[0].points, vec![DataPoint::new("Q1", 3.0)]);
    }

    #[test]
    fn test_chart_load_failure_propagates() {
        let shapes = vec![shape(ShapeContent::Chart {
            rel_id: "rId9".to_string(),
        })];
        assert!(matches!(
            extract_slide(1, &shapes, no_charts),
            Err(Error::MissingPart(_))
        ));
    }
}
