use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::process::Command;

use crate::ocr::OcrOptions;

pub fn list_tesseract_languages(command: &str) -> Result<Vec<String>> {
    let output = Command::new(command)
        .arg("--list-langs")
        .output()
        .with_context(|| format!("failed to run {} --list-langs", command))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("{} --list-langs failed: {}", command, stderr.trim()));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_list_langs(&stdout))
}

// First line is a header ("List of available languages in ...").
fn parse_list_langs(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .skip(1)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

pub(super) fn normalize_ocr_languages(command: &str, requested: &str) -> Result<String> {
    let trimmed = requested.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("ocr language is empty"));
    }

    let available = match list_tesseract_languages(command) {
        Ok(list) => list,
        Err(_) => return Ok(trimmed.to_string()),
    };
    choose_languages(trimmed, &available)
}

fn choose_languages(requested: &str, available: &[String]) -> Result<String> {
    let mut chosen = Vec::new();
    let mut missing = Vec::new();
    for raw in requested.split(['+', ',', ' ']) {
        let lang = raw.trim();
        if lang.is_empty() {
            continue;
        }
        if available.iter().any(|value| value == lang) {
            chosen.push(lang.to_string());
        } else {
            missing.push(lang.to_string());
        }
    }

    if chosen.is_empty() {
        return Err(anyhow!(
            "ocr language(s) not available: {} (available: {})",
            missing.join(", "),
            available.join(", ")
        ));
    }
    if !missing.is_empty() {
        tracing::warn!(
            missing = %missing.join(", "),
            available = %available.join(", "),
            "ocr language(s) not available"
        );
    }

    Ok(chosen.join("+"))
}

pub(super) fn run_tesseract_tsv(
    options: &OcrOptions,
    path: &Path,
    languages: &str,
) -> Result<String> {
    let output = Command::new(&options.command)
        .arg(path)
        .arg("stdout")
        .arg("-l")
        .arg(languages)
        .arg("--psm")
        .arg(options.psm.to_string())
        .arg("--dpi")
        .arg(options.dpi.to_string())
        .arg("tsv")
        .output()
        .with_context(|| format!("failed to run {} (is it installed?)", options.command))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("{} failed: {}", options.command, stderr.trim()));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn langs(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn list_langs_skips_header_and_blanks() {
        let stdout = "List of available languages in \"/usr/share/tessdata/\" (3):\neng\n\nosd\njpn\n";
        assert_eq!(parse_list_langs(stdout), langs(&["eng", "osd", "jpn"]));
    }

    #[test]
    fn choose_languages_keeps_available_ones() {
        let available = langs(&["eng", "jpn"]);
        assert_eq!(choose_languages("eng+fra, jpn", &available).unwrap(), "eng+jpn");
        assert!(choose_languages("fra", &available).is_err());
    }

    #[test]
    fn missing_binary_passes_language_through() {
        let value = normalize_ocr_languages("ocr-i18n-rust-no-such-binary", " eng ").unwrap();
        assert_eq!(value, "eng");
        assert!(normalize_ocr_languages("ocr-i18n-rust-no-such-binary", " ").is_err());
    }
}
