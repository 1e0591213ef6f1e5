use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::data::JSON_MIME;
use crate::pipeline::TranslationFile;

/// A downloadable resource file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub media_type: &'static str,
    pub bytes: Vec<u8>,
}

pub fn default_filename(language: &str) -> String {
    format!("translations_{}.json", language.trim())
}

pub fn build_artifact(file: &TranslationFile, filename: &str) -> ExportArtifact {
    ExportArtifact {
        filename: filename.to_string(),
        media_type: JSON_MIME,
        bytes: file.to_pretty_json().into_bytes(),
    }
}

/// Writes the artifact into `dir`, creating it if needed, and returns the path.
pub fn write_artifact(artifact: &ExportArtifact, dir: &Path) -> Result<PathBuf> {
    let name = Path::new(&artifact.filename);
    if name.file_name() != Some(name.as_os_str()) {
        return Err(anyhow!("invalid export filename: {}", artifact.filename));
    }
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory: {}", dir.display()))?;
    let path = dir.join(name);
    fs::write(&path, &artifact.bytes)
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), bytes = artifact.bytes.len(), "exported translations");
    Ok(path)
}

/// `Content-Disposition` value for serving the artifact as a download.
pub fn content_disposition(artifact: &ExportArtifact) -> String {
    let safe = artifact
        .filename
        .chars()
        .filter(|ch| !matches!(ch, '"' | '\\' | '\r' | '\n'))
        .collect::<String>();
    format!("attachment; filename=\"{}\"", safe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{build_entries, generate_json_file};
    use tempfile::tempdir;

    fn sample() -> TranslationFile {
        generate_json_file(&build_entries(["Welcome Home!", "Click Here →"]))
    }

    #[test]
    fn artifact_is_pretty_utf8_json() {
        let artifact = build_artifact(&sample(), "translations_en.json");
        assert_eq!(artifact.media_type, "application/json");
        let text = String::from_utf8(artifact.bytes.clone()).expect("utf8");
        assert_eq!(
            text,
            "{\n  \"welcome_home\": \"Welcome Home!\",\n  \"click_here\": \"Click Here →\"\n}"
        );
    }

    #[test]
    fn default_filename_uses_language_code() {
        assert_eq!(default_filename("ja"), "translations_ja.json");
    }

    #[test]
    fn write_artifact_creates_directory_and_file() {
        let dir = tempdir().expect("tempdir");
        let out = dir.path().join("nested").join("out");
        let artifact = build_artifact(&sample(), "translations_en.json");
        let path = write_artifact(&artifact, &out).expect("write");
        assert_eq!(path, out.join("translations_en.json"));
        assert_eq!(fs::read(&path).expect("read"), artifact.bytes);
    }

    #[test]
    fn write_artifact_rejects_path_like_names() {
        let dir = tempdir().expect("tempdir");
        let artifact = build_artifact(&sample(), "../escape.json");
        assert!(write_artifact(&artifact, dir.path()).is_err());
    }

    #[test]
    fn content_disposition_quotes_filename() {
        let artifact = build_artifact(&sample(), "translations_\"en\".json");
        assert_eq!(
            content_disposition(&artifact),
            "attachment; filename=\"translations_en.json\""
        );
    }
}
