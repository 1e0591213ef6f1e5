mod engine;

use anyhow::Result;

use crate::pipeline::ExtractedText;
use crate::settings::Settings;

pub use engine::{TesseractEngine, list_tesseract_languages};

/// Recognizes text in an encoded image.
///
/// `language` is the engine's own language name (for tesseract, a traineddata
/// name such as `eng` or `chi_sim`).
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image_bytes: &[u8], language: &str) -> Result<ExtractedText>;
}

#[derive(Debug, Clone)]
pub struct OcrOptions {
    pub command: String,
    pub psm: u32,
    pub dpi: u32,
    pub preprocess: bool,
    pub min_confidence: f32,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            command: "tesseract".to_string(),
            psm: 3,
            dpi: 300,
            preprocess: true,
            min_confidence: 0.0,
        }
    }
}

impl OcrOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            command: settings.ocr_command.clone(),
            psm: settings.ocr_psm,
            dpi: settings.ocr_dpi,
            preprocess: settings.ocr_preprocess,
            min_confidence: settings.ocr_min_confidence,
        }
    }
}
