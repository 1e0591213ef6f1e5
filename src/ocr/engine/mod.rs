mod parse;
mod preprocess;
mod tesseract;

use anyhow::{Context, Result};
use std::io::Write;

use crate::ocr::{OcrEngine, OcrOptions};
use crate::pipeline::ExtractedText;

pub use tesseract::list_tesseract_languages;

/// Runs the `tesseract` binary on a temporary PNG and reads its TSV output.
#[derive(Debug, Clone, Default)]
pub struct TesseractEngine {
    options: OcrOptions,
}

impl TesseractEngine {
    pub fn new(options: OcrOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &OcrOptions {
        &self.options
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, image_bytes: &[u8], language: &str) -> Result<ExtractedText> {
        let image = image::load_from_memory(image_bytes)
            .with_context(|| "failed to decode image for OCR")?;
        let image = if self.options.preprocess {
            preprocess::prepare_for_ocr(image)
        } else {
            image
        };
        let languages = tesseract::normalize_ocr_languages(&self.options.command, language)?;

        let mut tmp = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .with_context(|| "failed to create temp file for OCR")?;
        image
            .write_to(&mut tmp, image::ImageFormat::Png)
            .with_context(|| "failed to write temp image for OCR")?;
        tmp.flush().ok();

        let tsv = tesseract::run_tesseract_tsv(&self.options, tmp.path(), &languages)?;
        let extracted = parse::parse_tsv(&tsv, self.options.min_confidence);
        tracing::debug!(
            languages = %languages,
            confidence = extracted.confidence,
            chars = extracted.text.chars().count(),
            "tesseract finished"
        );
        Ok(extracted)
    }
}
