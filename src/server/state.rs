use std::sync::Arc;

use crate::languages::LanguageRegistry;
use crate::ocr::OcrEngine;
use crate::session::OcrGate;
use crate::settings;

pub struct ServerState {
    pub(crate) settings: settings::Settings,
    pub(crate) registry: LanguageRegistry,
    pub(crate) engine: Arc<dyn OcrEngine>,
    pub(crate) gate: OcrGate,
}

impl ServerState {
    pub fn new(
        settings: settings::Settings,
        registry: LanguageRegistry,
        engine: Arc<dyn OcrEngine>,
    ) -> Self {
        Self {
            settings,
            registry,
            engine,
            gate: OcrGate::new(),
        }
    }
}
