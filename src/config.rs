//! Reader configuration.
//!
//! Every field has a default so a partial (or missing) JSON file is valid.

use crate::{ReaderError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Speech synthesis parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    /// Speaking rate relative to natural speed
    pub rate: f32,
    /// Pitch multiplier (1.0 = neutral)
    pub pitch: f32,
    /// Voices whose language starts with this prefix are preferred
    pub language_prefix: String,
    /// Name fragments marking higher-quality engine voices
    pub quality_markers: Vec<String>,
    /// espeak-ng words per minute at rate 1.0
    pub base_words_per_minute: u32,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            rate: 0.9,
            pitch: 1.0,
            language_prefix: "en".to_string(),
            quality_markers: vec!["Google".to_string(), "Microsoft".to_string()],
            base_words_per_minute: 175,
        }
    }
}

/// Ambient bed parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientSettings {
    pub enabled: bool,
    /// Sine oscillator frequencies in Hz (A3 + E4)
    pub frequencies: Vec<f32>,
    /// Ambient gain at volume 1.0
    pub attenuation: f32,
}

impl Default for AmbientSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            frequencies: vec![220.0, 330.0],
            attenuation: 0.02,
        }
    }
}

/// Transport and UI timing parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    pub initial_volume: f32,
    pub inter_article_delay_ms: u64,
    /// Per-character duration used by the progress estimate
    pub ms_per_char: u64,
    pub toast_lifetime_ms: u64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            initial_volume: 0.8,
            inter_article_delay_ms: 1000,
            ms_per_char: 50,
            toast_lifetime_ms: 5000,
        }
    }
}

impl PlaybackSettings {
    pub fn inter_article_delay(&self) -> Duration {
        Duration::from_millis(self.inter_article_delay_ms)
    }

    pub fn toast_lifetime(&self) -> Duration {
        Duration::from_millis(self.toast_lifetime_ms)
    }
}

/// Top-level reader configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub speech: SpeechSettings,
    pub ambient: AmbientSettings,
    pub playback: PlaybackSettings,
}

impl ReaderConfig {
    /// Load configuration from a JSON file, or return defaults if the file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: ReaderConfig = serde_json::from_str(&content)?;
        config.validate()?;

        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if !(self.speech.rate > 0.0 && self.speech.rate <= 10.0) {
            return Err(ReaderError::Config(format!(
                "speech.rate must be in (0, 10], got {}",
                self.speech.rate
            )));
        }
        if !(self.speech.pitch > 0.0 && self.speech.pitch <= 2.0) {
            return Err(ReaderError::Config(format!(
                "speech.pitch must be in (0, 2], got {}",
                self.speech.pitch
            )));
        }
        if self.speech.base_words_per_minute == 0 {
            return Err(ReaderError::Config(
                "speech.base_words_per_minute must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.ambient.attenuation) {
            return Err(ReaderError::Config(format!(
                "ambient.attenuation must be in [0, 1], got {}",
                self.ambient.attenuation
            )));
        }
        if self
            .ambient
            .frequencies
            .iter()
            .any(|f| !f.is_finite() || *f <= 0.0)
        {
            return Err(ReaderError::Config(
                "ambient.frequencies must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.playback.initial_volume) {
            return Err(ReaderError::Config(format!(
                "playback.initial_volume must be in [0, 1], got {}",
                self.playback.initial_volume
            )));
        }
        Ok(())
    }
}
