//! Batch conversion of PowerPoint presentations into Word documents.

pub mod batch;
pub mod convert;

pub use batch::{run_batch, BatchConfig, BatchError, BatchReport, FileOutcome};
pub use convert::{convert_file, output_path_for};

/// Folder scanned for presentations when none is given.
pub const DEFAULT_INPUT_DIR: &str = "ppts";

/// Folder receiving the converted documents when none is given.
pub const DEFAULT_OUTPUT_DIR: &str = "word";
