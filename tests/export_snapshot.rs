use ocr_i18n_rust::export;
use ocr_i18n_rust::pipeline::{ExtractedText, generate_json_file, process_extracted_text};

fn extracted(text: &str) -> ExtractedText {
    ExtractedText {
        text: text.to_string(),
        confidence: 92.0,
    }
}

#[test]
fn exported_file_snapshot() {
    let entries = process_extracted_text(&extracted(
        "Welcome Home!\n\nClick Here →\n  Sign in  \n!!!\nHello!\nhello?\n",
    ));
    let file = generate_json_file(&entries);
    let artifact = export::build_artifact(&file, &export::default_filename("en"));
    assert_eq!(artifact.filename, "translations_en.json");
    assert_eq!(artifact.media_type, "application/json");
    let text = String::from_utf8(artifact.bytes).unwrap();
    insta::assert_snapshot!("exported_file", text);
}

#[test]
fn entries_snapshot() {
    let entries = process_extracted_text(&extracted("Mot de passe oublié ?\r\nS'inscrire\n\n\t2 articles"));
    insta::assert_json_snapshot!("entries", entries);
}
