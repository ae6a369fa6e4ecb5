//! Text-to-speech news reader
//!
//! Reads news articles aloud one at a time or as a continuous play-all
//! queue, with a quiet sine-tone bed underneath the speech while it plays.
//!
//! # Features
//! - Play / play-all / pause / resume / stop / next / previous transport
//! - Stale engine callbacks are detected by utterance generation and ignored
//! - Cancellable 1 s pause between play-all articles
//! - Volume shared by speech and (heavily attenuated) ambient bed
//! - English voice selection with a preference for high-quality voices
//!
//! # Crate feature flags
//! - `audio` (default): `espeak-ng` speech engine and rodio ambient bed
//! - `tui` (default): the `news-reader` terminal front end
//!
//! # Quick start
//! ```no_run
//! # #[cfg(feature = "audio")]
//! # {
//! use wingoo_reader::ambient::ToneBed;
//! use wingoo_reader::article::articles_from_pairs;
//! use wingoo_reader::notify::NullNotifier;
//! use wingoo_reader::player::PlaybackController;
//! use wingoo_reader::speech::EspeakEngine;
//! use wingoo_reader::ReaderConfig;
//!
//! let config = ReaderConfig::default();
//! let (_stream, handle) = rodio::OutputStream::try_default().unwrap();
//! let speech = EspeakEngine::new(handle.clone(), config.speech.base_words_per_minute).ok();
//! let ambient = ToneBed::new(handle, config.ambient.frequencies.clone());
//! let mut player = PlaybackController::new(speech, Some(ambient), NullNotifier, &config);
//!
//! player
//!     .play_all(articles_from_pairs([("Headline", "Story text.")]))
//!     .unwrap();
//! loop {
//!     player.pump(std::time::Instant::now());
//!     std::thread::sleep(std::time::Duration::from_millis(20));
//! #   break;
//! }
//! # }
//! ```

pub mod ambient;
pub mod article;
pub mod config;
pub mod error;
pub mod notify;
pub mod player;
pub mod speech;

pub use article::Article;
pub use config::ReaderConfig;
pub use error::{ReaderError, Result};
pub use notify::{Notifier, Severity};
pub use player::{PlaybackController, PlaybackMode, PlaybackState, TransportCommand};
