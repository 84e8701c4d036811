//! DOCX (Office Open XML) writer backend.
//!
//! Produces .docx packages made of headings and plain paragraphs.

pub mod document;
mod parts;

pub use document::WordDocument;
