//! news-reader: terminal front end for the text-to-speech news reader.
//!
//! Wires the library together:
//! - argument parsing and configuration loading
//! - file logging through tracing
//! - rodio output shared by the espeak-ng engine and the ambient bed
//! - the ratatui event loop

mod args;
mod logging;
mod shortcuts;
mod tui;

use anyhow::Context;
use args::{Autoplay, CliArgs};
use tui::{run_tui_loop, App, Reader};
use wingoo_reader::ambient::ToneBed;
use wingoo_reader::article::load_articles;
use wingoo_reader::notify::ToastBoard;
use wingoo_reader::speech::EspeakEngine;
use wingoo_reader::{Notifier, PlaybackController, ReaderConfig, ReaderError, Severity};

pub fn run() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    if args.show_help {
        CliArgs::print_help();
        return Ok(());
    }
    let Some(articles_path) = args.articles_path.as_deref() else {
        CliArgs::print_help();
        anyhow::bail!("no article file given");
    };

    let _log_guard = logging::init_logging(&args.log_file);

    let mut config = match args.config_path.as_deref() {
        Some(path) => ReaderConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ReaderConfig::default(),
    };
    if let Some(percent) = args.volume_percent {
        config.playback.initial_volume = f32::from(percent) / 100.0;
    }
    if args.no_ambient {
        config.ambient.enabled = false;
    }

    let articles = load_articles(articles_path)?;
    tracing::info!(count = articles.len(), "news reader starting");

    // The stream must outlive every sink created from its handle.
    let output = rodio::OutputStream::try_default();
    let (speech, ambient) = match &output {
        Ok((_stream, handle)) => {
            let speech = match EspeakEngine::new(handle.clone(), config.speech.base_words_per_minute) {
                Ok(engine) => Some(engine),
                Err(e) => {
                    tracing::warn!(error = %e, "speech engine unavailable");
                    None
                }
            };
            let ambient = ToneBed::new(handle.clone(), config.ambient.frequencies.clone());
            (speech, Some(ambient))
        }
        Err(e) => {
            let err = ReaderError::AudioDevice(e.to_string());
            tracing::error!(error = %err, "no audio output");
            (None, None)
        }
    };

    let toasts = ToastBoard::new(config.playback.toast_lifetime());
    let mut reader: Reader = PlaybackController::new(speech, ambient, toasts.clone(), &config);
    let mut app = App::new(articles, toasts);

    // Rejections are already on the toast board.
    let started = match args.autoplay {
        Autoplay::None => Ok(()),
        Autoplay::All => reader.play_all(app.articles.clone()),
        Autoplay::Article(index) => match app.articles.get(index) {
            Some(article) => {
                app.selected = index;
                reader.play_article(article.clone())
            }
            None => {
                let message = format!("There is no article {}", index + 1);
                reader.notifier_mut().notify(&message, Severity::Warning);
                Err(ReaderError::InvalidRequest(message))
            }
        },
    };
    if let Err(e) = started {
        tracing::warn!(error = %e, "autoplay failed");
    }

    run_tui_loop(&mut reader, &mut app).context("terminal UI failed")?;
    Ok(())
}
