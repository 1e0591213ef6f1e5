use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod data;
pub mod export;
pub mod languages;
pub mod logging;
pub mod ocr;
mod paths;
pub mod pipeline;
pub mod server;
pub mod session;
pub mod settings;
mod test_util;

pub use ocr::{OcrEngine, OcrOptions, TesseractEngine};
pub use pipeline::{ExtractedText, TranslationEntry, TranslationFile};
pub use session::{OCR_FAILURE_MESSAGE, OcrGate, SessionError, SessionState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Table,
}

impl std::str::FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "table" => Ok(OutputFormat::Table),
            other => Err(anyhow!("unknown format '{}' (expected json or table)", other)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub lang: Option<String>,
    pub data: Option<String>,
    pub data_bytes: Option<Vec<u8>>,
    pub output: Option<String>,
    pub save: bool,
    pub format: OutputFormat,
    pub strip_symbols: bool,
    pub settings_path: Option<String>,
    pub show_languages: bool,
    pub show_ocr_languages: bool,
}

pub async fn run(config: Config) -> Result<String> {
    let settings_path = config.settings_path.as_deref().map(Path::new);
    let settings = settings::load_settings(settings_path)?;
    let engine = Arc::new(TesseractEngine::new(OcrOptions::from_settings(&settings)));
    run_with_engine(config, settings, engine).await
}

pub async fn run_with_engine(
    config: Config,
    settings: settings::Settings,
    engine: Arc<dyn OcrEngine>,
) -> Result<String> {
    let registry = languages::LanguageRegistry::load()?;

    if config.show_languages {
        return Ok(format_languages(&registry));
    }
    if config.show_ocr_languages {
        return Ok(ocr::list_tesseract_languages(&settings.ocr_command)?.join("\n"));
    }

    let language = registry.validate(config.lang.as_deref().unwrap_or(&settings.language))?;
    let image = match (config.data.as_deref(), config.data_bytes) {
        (Some(path), _) => data::load_image(Path::new(path))?,
        (None, Some(bytes)) if !bytes.is_empty() => data::load_image_from_bytes(bytes, None)?,
        _ => {
            return Err(anyhow!(
                "no image given (use --data <FILE> or pipe image bytes on stdin)"
            ));
        }
    };

    let strip_symbols = config.strip_symbols || settings.strip_symbols;
    let state = SessionState::new(language);
    let state = session::process_image(
        &state,
        &OcrGate::new(),
        engine,
        &registry,
        image,
        strip_symbols,
    )
    .await
    .map_err(into_user_error)?;

    let output_dir = config
        .output
        .as_deref()
        .and_then(paths::normalize_dir)
        .or_else(|| config.save.then(|| settings.output_dir.clone()));
    if let Some(dir) = output_dir {
        save_export(&state, &dir)?;
    }

    Ok(match config.format {
        OutputFormat::Json => state.preview_json(),
        OutputFormat::Table => format_table(&state, &registry),
    })
}

/// Upload validation and "no text" keep their own message; anything else
/// coming out of OCR is reported with the generic failure message.
fn into_user_error(err: anyhow::Error) -> anyhow::Error {
    match err.downcast_ref::<SessionError>() {
        Some(SessionError::NoText) => {
            tracing::error!(error = %err, "ocr produced no usable text");
            err.context(OCR_FAILURE_MESSAGE)
        }
        Some(_) => err,
        None => {
            tracing::error!(error = ?err, "error processing image");
            err.context(OCR_FAILURE_MESSAGE)
        }
    }
}

fn save_export(state: &SessionState, dir: &Path) -> Result<PathBuf> {
    export::write_artifact(&state.artifact(), dir).inspect_err(|err| {
        tracing::error!(error = ?err, "export failed");
    })
}

fn format_languages(registry: &languages::LanguageRegistry) -> String {
    registry
        .all()
        .iter()
        .map(|lang| format!("{}\t{}", lang.code, lang.name))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_table(state: &SessionState, registry: &languages::LanguageRegistry) -> String {
    let width = state
        .entries
        .iter()
        .map(|entry| entry.key.chars().count())
        .chain(std::iter::once("Key".len()))
        .max()
        .unwrap_or(0);

    let mut lines = vec![
        format!("Extracted Text ({})", registry.display_name(&state.language)),
        format!("{:<width$}  Value", "Key"),
    ];
    for entry in &state.entries {
        lines.push(format!("{:<width$}  {}", entry.key, entry.value));
    }
    lines.join("\n")
}
