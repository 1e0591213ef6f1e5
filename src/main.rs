use std::io::{self, IsTerminal, Read};
use std::path::Path;

use anyhow::Result;
use clap::Parser;

use ocr_i18n_rust::OutputFormat;

#[derive(Parser, Debug)]
#[command(
    name = "ocr-i18n-rust",
    version,
    about = "Extract text from images and generate i18n JSON files"
)]
struct Cli {
    /// Image to recognize (PNG, JPG, JPEG). Reads stdin when omitted.
    #[arg(short = 'd', long = "data")]
    data: Option<String>,

    /// Language of the text in the image (ISO 639-1, default from settings)
    #[arg(short = 'l', long = "lang")]
    lang: Option<String>,

    /// Write translations_<lang>.json into this directory
    #[arg(short = 'o', long = "output")]
    output: Option<String>,

    /// Write translations_<lang>.json into the configured output directory
    #[arg(long = "save")]
    save: bool,

    /// Stdout view: json or table
    #[arg(short = 'f', long = "format", default_value = "json")]
    format: OutputFormat,

    /// Drop symbols (arrows, pictographs, ...) from recognized text first
    #[arg(long = "strip-symbols")]
    strip_symbols: bool,

    /// Show selectable languages and exit
    #[arg(long = "show-languages")]
    show_languages: bool,

    /// Show languages installed for the OCR engine and exit
    #[arg(long = "show-ocr-languages")]
    show_ocr_languages: bool,

    /// Run the HTTP server (optionally on ADDR, default from settings)
    #[arg(long = "server", value_name = "ADDR", num_args = 0..=1, default_missing_value = "")]
    server: Option<String>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    ocr_i18n_rust::logging::init(cli.verbose)?;

    if let Some(addr) = cli.server {
        let settings = ocr_i18n_rust::settings::load_settings(
            cli.read_settings.as_deref().map(Path::new),
        )?;
        let addr = Some(addr).filter(|value| !value.trim().is_empty());
        return ocr_i18n_rust::server::run_server(settings, addr).await;
    }

    let listing = cli.show_languages || cli.show_ocr_languages;
    let data_bytes = if listing || cli.data.is_some() || io::stdin().is_terminal() {
        None
    } else {
        let mut buffer = Vec::new();
        io::stdin().read_to_end(&mut buffer)?;
        Some(buffer)
    };

    let output = ocr_i18n_rust::run(ocr_i18n_rust::Config {
        lang: cli.lang,
        data: cli.data,
        data_bytes,
        output: cli.output,
        save: cli.save,
        format: cli.format,
        strip_symbols: cli.strip_symbols,
        settings_path: cli.read_settings,
        show_languages: cli.show_languages,
        show_ocr_languages: cli.show_ocr_languages,
    })
    .await?;

    println!("{}", output);
    Ok(())
}
