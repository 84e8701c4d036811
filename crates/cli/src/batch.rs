//! Folder-to-folder batch conversion.

use crate::convert::{convert_file, INPUT_SUFFIX};
use slidedoc_core::ReportLayout;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a batch before or outside per-file processing.
#[derive(Error, Debug)]
pub enum BatchError {
    /// The input folder is missing or is not a directory.
    #[error("The input folder '{}' does not exist or is not a directory.", .0.display())]
    InputNotADirectory(PathBuf),

    /// The output folder could not be created.
    #[error("Failed to create output directory {}: {source}", .path.display())]
    CreateOutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Listing the input folder or writing the report failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where to read presentations from and where to write documents to.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub layout: ReportLayout,
}

impl BatchConfig {
    /// Create a configuration with the default document layout.
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            layout: ReportLayout::default(),
        }
    }
}

/// Result of converting one input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// The document was written to `output`.
    Converted { input: PathBuf, output: PathBuf },
    /// Conversion failed; nothing was written.
    Failed { file_name: String, error: String },
}

/// Outcomes of a batch, in processing order.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    /// Number of files converted.
    pub fn converted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::Converted { .. }))
            .count()
    }

    /// Number of files that failed.
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.converted()
    }
}

/// Convert every `.pptx` file of the input folder.
///
/// One line per file is written to `out`. A file that fails is reported and
/// skipped; the remaining files are still converted. Files are processed in
/// directory-listing order.
pub fn run_batch<W: Write>(config: &BatchConfig, out: &mut W) -> Result<BatchReport, BatchError> {
    if !config.input_dir.is_dir() {
        return Err(BatchError::InputNotADirectory(config.input_dir.clone()));
    }

    std::fs::create_dir_all(&config.output_dir).map_err(|source| BatchError::CreateOutputDir {
        path: config.output_dir.clone(),
        source,
    })?;

    let mut report = BatchReport::default();

    for entry in std::fs::read_dir(&config.input_dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable directory entry: {}", e);
                continue;
            }
        };

        let file_name = entry.file_name().to_string_lossy().into_owned();
        if !file_name.ends_with(INPUT_SUFFIX) {
            log::debug!("Skipping {}", file_name);
            continue;
        }

        let input = entry.path();
        log::info!("Converting {}", input.display());

        let outcome = match convert_file(&input, &config.output_dir, &config.layout) {
            Ok(output) => {
                writeln!(out, "Processed and saved: {}", output.display())?;
                FileOutcome::Converted { input, output }
            }
            Err(e) => {
                let error = format!("{:#}", e);
                writeln!(out, "Error processing file {}: {}", file_name, error)?;
                FileOutcome::Failed { file_name, error }
            }
        };
        report.outcomes.push(outcome);
    }

    log::info!(
        "{} converted, {} failed",
        report.converted(),
        report.failed()
    );

    Ok(report)
}
