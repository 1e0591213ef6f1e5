use serde::{Deserialize, Serialize};

use crate::pipeline::TranslationEntry;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub(crate) struct ExtractRequest {
    pub(crate) data_base64: Option<String>,
    pub(crate) lang: Option<String>,
    pub(crate) strip_symbols: Option<bool>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ExtractResponse {
    pub(crate) language: String,
    pub(crate) language_name: String,
    pub(crate) entries: Vec<TranslationEntry>,
    pub(crate) json: String,
    pub(crate) filename: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub(crate) struct DownloadRequest {
    pub(crate) entries: Vec<TranslationEntry>,
    pub(crate) lang: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LanguageItem {
    pub(crate) code: String,
    pub(crate) name: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
}
