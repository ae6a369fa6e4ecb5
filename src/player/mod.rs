//! Playback state machine.
//!
//! [`PlaybackController`] reads articles aloud through a
//! [`SpeechEngine`](crate::speech::SpeechEngine) and keeps an ambient bed in
//! step with speech. It is driven entirely from the caller's event loop:
//! transport calls, engine events fed through
//! [`PlaybackController::handle_speech_event`], and [`PlaybackController::tick`]
//! for the inter-article timer.

mod controller;
mod progress;
mod session;

pub use controller::PlaybackController;
pub use progress::ProgressEstimate;
pub use session::{PendingAdvance, PlaybackSession};

use std::fmt;

/// The current state of playback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// No session
    #[default]
    Idle,
    /// An utterance is being spoken (or the next one is scheduled)
    Speaking,
    /// Suspended, can resume
    Paused,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Speaking => "speaking",
            PlaybackState::Paused => "paused",
        })
    }
}

/// Single article or sequential play-all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackMode {
    #[default]
    Single,
    PlayAll,
}

/// Transport actions bound to keyboard shortcuts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCommand {
    /// Space
    TogglePause,
    /// Escape
    Stop,
    /// Right arrow
    Next,
    /// Left arrow
    Previous,
}
