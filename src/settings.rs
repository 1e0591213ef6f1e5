use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone)]
pub struct Settings {
    pub language: String,
    pub output_dir: PathBuf,
    pub ocr_command: String,
    pub ocr_psm: u32,
    pub ocr_dpi: u32,
    pub ocr_preprocess: bool,
    pub ocr_min_confidence: f32,
    pub strip_symbols: bool,
    pub server_addr: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            output_dir: PathBuf::from("."),
            ocr_command: "tesseract".to_string(),
            ocr_psm: 3,
            ocr_dpi: 300,
            ocr_preprocess: true,
            ocr_min_confidence: 0.0,
            strip_symbols: false,
            server_addr: "127.0.0.1:8787".to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    system: Option<SystemSettings>,
    ocr: Option<OcrSettings>,
    pipeline: Option<PipelineSettings>,
    server: Option<ServerSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct SystemSettings {
    language: Option<String>,
    output_dir: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OcrSettings {
    command: Option<String>,
    psm: Option<u32>,
    dpi: Option<u32>,
    preprocess: Option<bool>,
    min_confidence: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct PipelineSettings {
    strip_symbols: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSettings {
    addr: Option<String>,
}

/// Later layers override earlier ones: embedded defaults, `./settings.toml`,
/// `./settings.local.toml`, the home directory pair, then `extra_path`.
pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    ensure_home_settings_file()?;

    let mut ordered_paths = vec![
        PathBuf::from("settings.toml"),
        PathBuf::from("settings.local.toml"),
    ];
    if let Some(home) = paths::settings_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }
    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            settings.merge_str(&content).with_context(|| {
                format!("failed to parse settings: {}", path.display())
            })?;
            tracing::debug!(path = %path.display(), "merged settings layer");
        }
    }

    Ok(settings)
}

impl Settings {
    pub fn merge_str(&mut self, content: &str) -> Result<()> {
        let parsed: SettingsFile = toml::from_str(content)?;
        self.merge(parsed);
        Ok(())
    }

    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(system) = incoming.system {
            if let Some(language) = system.language {
                if !language.trim().is_empty() {
                    self.language = language.trim().to_lowercase();
                }
            }
            if let Some(dir) = system.output_dir.as_deref().and_then(paths::normalize_dir) {
                self.output_dir = dir;
            }
        }
        if let Some(ocr) = incoming.ocr {
            if let Some(command) = ocr.command {
                if !command.trim().is_empty() {
                    self.ocr_command = command.trim().to_string();
                }
            }
            if let Some(psm) = ocr.psm {
                self.ocr_psm = psm;
            }
            if let Some(dpi) = ocr.dpi {
                if dpi > 0 {
                    self.ocr_dpi = dpi;
                }
            }
            if let Some(preprocess) = ocr.preprocess {
                self.ocr_preprocess = preprocess;
            }
            if let Some(min) = ocr.min_confidence {
                self.ocr_min_confidence = min.clamp(0.0, 100.0);
            }
        }
        if let Some(pipeline) = incoming.pipeline {
            if let Some(strip) = pipeline.strip_symbols {
                self.strip_symbols = strip;
            }
        }
        if let Some(server) = incoming.server {
            if let Some(addr) = server.addr {
                if !addr.trim().is_empty() {
                    self.server_addr = addr.trim().to_string();
                }
            }
        }
    }
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = paths::settings_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::with_temp_home;

    #[test]
    fn embedded_defaults_match_struct_defaults() {
        let mut settings = Settings::default();
        settings.merge_str(DEFAULT_SETTINGS_TOML).expect("defaults parse");
        assert_eq!(settings.language, "en");
        assert_eq!(settings.ocr_command, "tesseract");
        assert_eq!(settings.ocr_psm, 3);
        assert!(settings.ocr_preprocess);
        assert!(!settings.strip_symbols);
        assert_eq!(settings.server_addr, "127.0.0.1:8787");
    }

    #[test]
    fn merge_ignores_blank_values() {
        let mut settings = Settings::default();
        settings
            .merge_str(
                "[system]\nlanguage = \" JA \"\n[ocr]\ncommand = \"  \"\ndpi = 0\nmin_confidence = 140.0\n[pipeline]\nstrip_symbols = true\n",
            )
            .expect("parse");
        assert_eq!(settings.language, "ja");
        assert_eq!(settings.ocr_command, "tesseract");
        assert_eq!(settings.ocr_dpi, 300);
        assert_eq!(settings.ocr_min_confidence, 100.0);
        assert!(settings.strip_symbols);
    }

    #[test]
    fn load_writes_home_defaults_and_applies_extra_file() {
        with_temp_home(|home| {
            let extra = home.join("extra.toml");
            fs::write(&extra, "[server]\naddr = \"0.0.0.0:9000\"\n").expect("write extra");

            let settings = load_settings(Some(&extra)).expect("load");
            assert_eq!(settings.server_addr, "0.0.0.0:9000");
            assert!(home.join(".ocr-i18n-rust").join("settings.toml").exists());
        });
    }

    #[test]
    fn missing_extra_file_is_an_error() {
        with_temp_home(|home| {
            let err = load_settings(Some(&home.join("nope.toml"))).unwrap_err();
            assert!(err.to_string().contains("settings file not found"));
        });
    }
}
