use anyhow::{Context, Result};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};

use crate::data::ImageAttachment;
use crate::export::{self, ExportArtifact};
use crate::languages::LanguageRegistry;
use crate::ocr::OcrEngine;
use crate::pipeline::{self, ExtractedText, TranslationEntry, TranslationFile};

/// Generic message shown to the user when OCR fails for any reason.
pub const OCR_FAILURE_MESSAGE: &str = "Error processing image. Please try again.";

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    #[error("an image is already being processed")]
    Busy,
    #[error("Only image files (PNG, JPG, JPEG) are allowed.")]
    UnsupportedInput,
    #[error("no text was recognized in the image")]
    NoText,
}

/// Caller-owned state between uploads: the selected language and the entries
/// of the last successful extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub language: String,
    pub entries: Vec<TranslationEntry>,
}

impl SessionState {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            entries: Vec::new(),
        }
    }

    /// Switching language keeps the current entries.
    pub fn with_language(self, language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            ..self
        }
    }

    /// Returns the next state. On error the caller keeps the current one, so a
    /// failed upload never clears or partially replaces entries.
    pub fn apply_extraction(
        &self,
        extracted: &ExtractedText,
        strip_symbols: bool,
    ) -> Result<Self, SessionError> {
        if !extracted.is_usable() {
            return Err(SessionError::NoText);
        }
        let entries = if strip_symbols {
            pipeline::process_extracted_text(&ExtractedText {
                text: pipeline::strip_symbols(&extracted.text),
                confidence: extracted.confidence,
            })
        } else {
            pipeline::process_extracted_text(extracted)
        };
        Ok(Self {
            language: self.language.clone(),
            entries,
        })
    }

    pub fn translation_file(&self) -> TranslationFile {
        pipeline::generate_json_file(&self.entries)
    }

    pub fn preview_json(&self) -> String {
        self.translation_file().to_pretty_json()
    }

    pub fn export_filename(&self) -> String {
        export::default_filename(&self.language)
    }

    pub fn artifact(&self) -> ExportArtifact {
        export::build_artifact(&self.translation_file(), &self.export_filename())
    }
}

/// Admits one OCR task at a time. Requests arriving while a task is
/// outstanding are rejected, not queued.
#[derive(Debug, Clone)]
pub struct OcrGate {
    permits: Arc<Semaphore>,
}

impl Default for OcrGate {
    fn default() -> Self {
        Self {
            permits: Arc::new(Semaphore::new(1)),
        }
    }
}

impl OcrGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// The permit is held for the lifetime of one OCR task and reopens the
    /// gate when dropped.
    pub fn try_acquire(&self) -> Result<OwnedSemaphorePermit, SessionError> {
        Arc::clone(&self.permits)
            .try_acquire_owned()
            .map_err(|err| match err {
                TryAcquireError::NoPermits | TryAcquireError::Closed => SessionError::Busy,
            })
    }

    pub fn is_busy(&self) -> bool {
        self.permits.available_permits() == 0
    }
}

/// Runs the engine on the blocking pool. The gate stays closed until the
/// engine returns, even if the caller stops awaiting.
pub async fn recognize(
    gate: &OcrGate,
    engine: Arc<dyn OcrEngine>,
    image: ImageAttachment,
    ocr_language: String,
) -> Result<ExtractedText> {
    let permit = gate.try_acquire()?;
    tokio::task::spawn_blocking(move || {
        let _permit = permit;
        engine.recognize(&image.bytes, &ocr_language)
    })
    .await
    .with_context(|| "ocr task failed")?
}

/// Upload handling end to end: OCR in the state's language, then the pipeline.
pub async fn process_image(
    state: &SessionState,
    gate: &OcrGate,
    engine: Arc<dyn OcrEngine>,
    registry: &LanguageRegistry,
    image: ImageAttachment,
    strip_symbols: bool,
) -> Result<SessionState> {
    let ocr_language = registry.ocr_code(&state.language);
    tracing::info!(
        language = %state.language,
        ocr_language = %ocr_language,
        bytes = image.bytes.len(),
        "processing image"
    );
    let extracted = recognize(gate, engine, image, ocr_language).await?;
    Ok(state.apply_extraction(&extracted, strip_symbols)?)
}
