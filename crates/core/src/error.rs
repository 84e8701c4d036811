//! Error types for presentation conversion.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading a presentation or writing a document.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or write a file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// ZIP archive error (both PPTX input and DOCX output).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing or writing error.
    #[error("XML error: {0}")]
    XmlError(String),

    /// A part referenced by the package is not present.
    #[error("Missing package part: {0}")]
    MissingPart(String),

    /// Invalid or corrupted file.
    #[error("Invalid or corrupted file: {0}")]
    CorruptedFile(String),

    /// A chart data point has no category label.
    #[error("Data point {index} of series '{series}' has no label")]
    MissingPointLabel {
        /// Name of the series holding the point.
        series: String,
        /// Zero-based index of the point.
        index: usize,
    },

    /// Failed to assemble the output document.
    #[error("Document write error: {0}")]
    DocumentError(String),
}
