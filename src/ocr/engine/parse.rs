use crate::pipeline::ExtractedText;

/// (page, block, paragraph, line)
type LineKey = (u32, u32, u32, u32);

/// Rebuilds the recognized text from tesseract TSV word rows. Words on the same
/// line are joined by a space, lines by `\n`, and a blank line separates
/// paragraphs. Confidence is the mean of the kept word confidences.
pub(super) fn parse_tsv(tsv: &str, min_confidence: f32) -> ExtractedText {
    let mut text = String::new();
    let mut current: Option<LineKey> = None;
    let mut conf_sum = 0.0f32;
    let mut words = 0usize;

    for row in tsv.lines().skip(1) {
        let cols = row.split('\t').collect::<Vec<_>>();
        if cols.len() < 12 {
            continue;
        }
        let level: u32 = cols[0].trim().parse().unwrap_or(0);
        if level != 5 {
            continue;
        }
        let conf: f32 = cols[10].trim().parse().unwrap_or(-1.0);
        let word = cols[11].trim();
        if word.is_empty() || conf < 0.0 || conf < min_confidence {
            continue;
        }
        let key: LineKey = (
            cols[1].trim().parse().unwrap_or(0),
            cols[2].trim().parse().unwrap_or(0),
            cols[3].trim().parse().unwrap_or(0),
            cols[4].trim().parse().unwrap_or(0),
        );

        match current {
            Some(prev) if prev == key => text.push(' '),
            Some(prev) => {
                text.push('\n');
                if (prev.0, prev.1, prev.2) != (key.0, key.1, key.2) {
                    text.push('\n');
                }
            }
            None => {}
        }
        text.push_str(word);
        current = Some(key);
        conf_sum += conf;
        words += 1;
    }

    let confidence = if words == 0 {
        0.0
    } else {
        conf_sum / words as f32
    };
    ExtractedText { text, confidence }
}
