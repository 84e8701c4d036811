//! Core domain types, text sanitization, and document layout
//! for converting presentations into word-processing documents.

pub mod error;
pub mod layout;
pub mod sanitize;
pub mod types;

pub use error::{Error, Result};
pub use layout::{Block, ReportLayout};
pub use sanitize::sanitize_text;
pub use types::{ChartEntry, DataPoint, Presentation, SeriesEntry, SlideRecord, TableRow};
