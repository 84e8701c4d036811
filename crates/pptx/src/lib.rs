//! PPTX (Office Open XML) loader and slide extractor.
//!
//! Parses .pptx files, which are ZIP archives of XML parts, into per-slide
//! records of text, table rows and clustered-column chart data.

pub mod chart;
pub mod extract;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
pub mod parser;
pub mod rels;
pub mod slide;

pub use chart::{ChartKind, ChartPart};
pub use parser::PptxParser;
pub use slide::{Shape, ShapeContent};
