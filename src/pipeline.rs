use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Raw OCR output for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedText {
    pub text: String,
    pub confidence: f32,
}

impl ExtractedText {
    /// Whether the engine produced anything worth turning into entries: at
    /// least one line the splitter keeps and a non-zero confidence.
    pub fn is_usable(&self) -> bool {
        self.confidence != 0.0 && !self.confidence.is_nan() && !split_lines(&self.text).is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationEntry {
    pub key: String,
    pub value: String,
}

/// Flat key/value resource. Keys keep the position of their first insertion,
/// values are those of the last one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationFile {
    pairs: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl TranslationFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: String, value: String) {
        if let Some(&idx) = self.index.get(&key) {
            self.pairs[idx].1 = value;
            return;
        }
        self.index.insert(key.clone(), self.pairs.len());
        self.pairs.push((key, value));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.index
            .get(key)
            .map(|&idx| self.pairs[idx].1.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Two-space indented JSON. Preview, copy and download all go through here
    /// so they stay byte-identical.
    pub fn to_pretty_json(&self) -> String {
        // A map of plain strings cannot fail to serialize.
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

impl Serialize for TranslationFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.pairs.len()))?;
        for (key, value) in &self.pairs {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TranslationFile {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FileVisitor;

        impl<'de> Visitor<'de> for FileVisitor {
            type Value = TranslationFile;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a flat object of string keys to string values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut file = TranslationFile::new();
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    file.insert(key, value);
                }
                Ok(file)
            }
        }

        deserializer.deserialize_map(FileVisitor)
    }
}

/// Non-blank lines of the OCR text, in source order.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .filter(|line| !line.trim_matches(is_js_whitespace).is_empty())
        .collect()
}

pub fn create_translation_key(text: &str) -> String {
    let lowered = text.to_lowercase();
    let kept = lowered
        .chars()
        .filter(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || is_js_whitespace(*ch))
        .collect::<String>();

    let mut key = String::with_capacity(kept.len());
    let mut in_gap = false;
    for ch in kept.trim_matches(is_js_whitespace).chars() {
        if is_js_whitespace(ch) {
            in_gap = true;
            continue;
        }
        if in_gap {
            key.push('_');
            in_gap = false;
        }
        key.push(ch);
    }
    key
}

pub fn build_entries<'a, I>(lines: I) -> Vec<TranslationEntry>
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .map(|line| TranslationEntry {
            key: create_translation_key(line),
            value: line.trim_matches(is_js_whitespace).to_string(),
        })
        .collect()
}

pub fn process_extracted_text(extracted: &ExtractedText) -> Vec<TranslationEntry> {
    let entries = build_entries(split_lines(&extracted.text));
    tracing::debug!(
        entries = entries.len(),
        confidence = extracted.confidence,
        "built translation entries"
    );
    entries
}

pub fn generate_json_file(entries: &[TranslationEntry]) -> TranslationFile {
    entries
        .iter()
        .fold(TranslationFile::new(), |mut file, entry| {
            file.insert(entry.key.clone(), entry.value.clone());
            file
        })
}

/// Optional pre-filter: drops pictographs, arrows and similar OCR noise while
/// keeping letters, digits, whitespace and ASCII punctuation.
pub fn strip_symbols(text: &str) -> String {
    text.chars()
        .filter(|ch| ch.is_alphanumeric() || ch.is_whitespace() || ch.is_ascii_punctuation())
        .collect()
}

// Same set as the `\s` class of ECMAScript regular expressions.
fn is_js_whitespace(ch: char) -> bool {
    matches!(
        ch,
        '\u{0009}'..='\u{000D}'
            | '\u{0020}'
            | '\u{00A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}
