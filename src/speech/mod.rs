//! Speech synthesis abstraction.
//!
//! The controller drives a [`SpeechEngine`] without knowing how speech is
//! produced. Engines report utterance lifecycle changes as [`SpeechEvent`]s
//! tagged with the [`UtteranceId`] they were given, so the controller can
//! tell events of the current utterance from late ones.

#[cfg(feature = "audio")]
pub mod espeak;

#[cfg(feature = "audio")]
pub use espeak::EspeakEngine;

use crate::article::Article;
use crate::config::SpeechSettings;
use crate::Result;

/// Generation number of one utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UtteranceId(pub u64);

impl UtteranceId {
    pub fn next(self) -> Self {
        UtteranceId(self.0 + 1)
    }
}

/// Voice offered by a speech engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceDescriptor {
    pub name: String,
    /// BCP-47 style tag, e.g. `en-GB`
    pub language: String,
}

impl VoiceDescriptor {
    pub fn new(name: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language: language.into(),
        }
    }
}

/// One unit of speech output
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub id: UtteranceId,
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
    /// 0.0 to 1.0
    pub volume: f32,
    /// `None` = engine default voice
    pub voice: Option<VoiceDescriptor>,
}

impl Utterance {
    /// Build the utterance that reads `article` aloud.
    pub fn for_article(
        id: UtteranceId,
        article: &Article,
        settings: &SpeechSettings,
        volume: f32,
        voices: &[VoiceDescriptor],
    ) -> Self {
        Self {
            id,
            text: article.spoken_text(),
            rate: settings.rate,
            pitch: settings.pitch,
            volume: volume.clamp(0.0, 1.0),
            voice: select_voice(voices, &settings.language_prefix, &settings.quality_markers)
                .cloned(),
        }
    }
}

/// Lifecycle notifications emitted by an engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    /// Audio for the utterance became audible
    Started(UtteranceId),
    /// The utterance finished naturally
    Ended(UtteranceId),
    /// The engine failed to speak the utterance
    Error { id: UtteranceId, message: String },
}

impl SpeechEvent {
    pub fn id(&self) -> UtteranceId {
        match self {
            SpeechEvent::Started(id) | SpeechEvent::Ended(id) => *id,
            SpeechEvent::Error { id, .. } => *id,
        }
    }
}

/// Speech synthesis capability.
///
/// At most one utterance is active at a time: `speak` replaces whatever the
/// engine was doing. `cancel` discards the active utterance without emitting
/// `Ended` for it (an engine that does emit one anyway is tolerated, the
/// controller ignores it).
pub trait SpeechEngine {
    /// Start speaking `utterance`.
    fn speak(&mut self, utterance: &Utterance) -> Result<()>;

    /// Suspend the active utterance so it can be resumed later.
    fn pause(&mut self) -> Result<()>;

    /// Continue a suspended utterance.
    fn resume(&mut self) -> Result<()>;

    /// Drop the active utterance immediately.
    fn cancel(&mut self);

    /// Change the volume of the active utterance (0.0 to 1.0).
    fn set_volume(&mut self, volume: f32);

    /// Voices the engine can use.
    fn voices(&self) -> Vec<VoiceDescriptor>;

    /// Drain lifecycle events that happened since the last call.
    fn poll_events(&mut self) -> Vec<SpeechEvent>;
}

/// Pick the voice to read with.
///
/// Prefers the first voice in `language_prefix` whose name contains one of the
/// quality markers, then the first voice in that language at all. Returns
/// `None` when no voice matches so the engine default is used.
pub fn select_voice<'a>(
    voices: &'a [VoiceDescriptor],
    language_prefix: &str,
    quality_markers: &[String],
) -> Option<&'a VoiceDescriptor> {
    let prefix = language_prefix.to_ascii_lowercase();
    let in_language =
        |voice: &&VoiceDescriptor| voice.language.to_ascii_lowercase().starts_with(&prefix);

    voices
        .iter()
        .filter(in_language)
        .find(|voice| {
            quality_markers
                .iter()
                .any(|marker| voice.name.contains(marker.as_str()))
        })
        .or_else(|| voices.iter().find(in_language))
}
