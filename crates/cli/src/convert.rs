//! Conversion of a single presentation file.

use anyhow::{Context, Result};
use slidedoc_core::{Presentation, ReportLayout};
use slidedoc_docx::WordDocument;
use slidedoc_pptx::PptxParser;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Suffix of the presentations picked up from the input folder.
pub const INPUT_SUFFIX: &str = ".pptx";

/// Suffix given to the written documents.
pub const OUTPUT_SUFFIX: &str = ".docx";

/// Parse a presentation file into slide records.
pub fn process_ppt(input_path: &Path) -> Result<Presentation> {
    let file = File::open(input_path)
        .with_context(|| format!("Failed to open {}", input_path.display()))?;
    let reader = BufReader::new(file);

    let filename = input_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown");

    let presentation = PptxParser::new().parse(reader, filename)?;
    log::debug!("Parsed {} slides from {}", presentation.slides.len(), filename);

    Ok(presentation)
}

/// Lay out the slides of a presentation and save them as a Word document.
pub fn create_word_doc(
    presentation: &Presentation,
    layout: &ReportLayout,
    output_path: &Path,
) -> Result<()> {
    let document = WordDocument::from_blocks(layout.layout(&presentation.slides));
    document
        .save(output_path)
        .with_context(|| format!("Failed to save {}", output_path.display()))?;
    Ok(())
}

/// Convert one presentation, returning the path of the written document.
///
/// Nothing is written unless the whole presentation was extracted.
pub fn convert_file(input_path: &Path, output_dir: &Path, layout: &ReportLayout) -> Result<PathBuf> {
    let presentation = process_ppt(input_path)?;

    let file_name = input_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let output_path = output_path_for(&file_name, output_dir);

    create_word_doc(&presentation, layout, &output_path)?;
    Ok(output_path)
}

/// Output path for an input file name: its `.pptx` suffix becomes `.docx`.
pub fn output_path_for(file_name: &str, output_dir: &Path) -> PathBuf {
    let stem = file_name.strip_suffix(INPUT_SUFFIX).unwrap_or(file_name);
    output_dir.join(format!("{}{}", stem, OUTPUT_SUFFIX))
}
