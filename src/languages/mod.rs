use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Language {
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tesseract: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    languages: Vec<Language>,
    by_code: HashMap<String, usize>,
}

impl LanguageRegistry {
    pub fn load() -> Result<Self> {
        let raw = include_str!("iso_639_1.json");
        let parsed: IsoData = serde_json::from_str(raw)
            .with_context(|| "failed to parse ISO 639-1 language data")?;
        let by_code = parsed
            .languages
            .iter()
            .enumerate()
            .map(|(idx, lang)| (lang.code.clone(), idx))
            .collect();
        Ok(LanguageRegistry {
            languages: parsed.languages,
            by_code,
        })
    }

    /// All languages in code order.
    pub fn all(&self) -> &[Language] {
        &self.languages
    }

    pub fn get(&self, code: &str) -> Option<&Language> {
        let code = normalize_code(code);
        self.by_code.get(&code).map(|&idx| &self.languages[idx])
    }

    pub fn is_valid_code(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    pub fn name(&self, code: &str) -> Option<&str> {
        self.get(code).map(|lang| lang.name.as_str())
    }

    /// Name to show next to a code, falling back to the code itself.
    pub fn display_name(&self, code: &str) -> String {
        self.name(code)
            .map(|name| name.to_string())
            .unwrap_or_else(|| normalize_code(code))
    }

    /// Traineddata name the OCR engine expects. Codes without a known mapping
    /// are passed through unchanged.
    pub fn ocr_code(&self, code: &str) -> String {
        self.get(code)
            .and_then(|lang| lang.tesseract.clone())
            .unwrap_or_else(|| normalize_code(code))
    }

    pub fn validate(&self, code: &str) -> Result<String> {
        let normalized = normalize_code(code);
        if normalized.is_empty() {
            return Err(anyhow!("language code is empty"));
        }
        if !self.is_valid_code(&normalized) {
            return Err(anyhow!(
                "invalid language code '{}' (expected ISO 639-1 code, see --show-languages)",
                code.trim()
            ));
        }
        Ok(normalized)
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_lowercase()
}

#[derive(Debug, Deserialize)]
struct IsoData {
    languages: Vec<Language>,
}
