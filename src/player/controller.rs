//! The playback controller.

use super::{PlaybackMode, PlaybackSession, PlaybackState, ProgressEstimate, TransportCommand};
use crate::ambient::{AmbientBed, AmbientEngine};
use crate::article::Article;
use crate::config::{ReaderConfig, SpeechSettings};
use crate::notify::{Notifier, Severity};
use crate::speech::{SpeechEngine, SpeechEvent, Utterance, UtteranceId};
use crate::{ReaderError, Result};
use std::time::{Duration, Instant};

const MSG_NO_ARTICLES: &str = "No articles available to play";
const MSG_NO_AUDIO: &str = "No audio to play";
const MSG_FINISHED_ALL: &str = "Finished playing all articles";
const MSG_SPEECH_FAILED: &str = "Error playing audio. Please try again.";

/// Text-to-speech playback state machine.
///
/// Owns at most one [`PlaybackSession`]. Every utterance gets a fresh
/// [`UtteranceId`]; engine events carrying any other id are stale and ignored,
/// so callbacks from a stopped or superseded session cannot restart playback.
pub struct PlaybackController<S, A, N> {
    speech: Option<S>,
    ambient: AmbientBed<A>,
    notifier: N,
    speech_settings: SpeechSettings,
    inter_article_delay: Duration,
    ms_per_char: u64,
    state: PlaybackState,
    session: Option<PlaybackSession>,
    /// Utterance currently owned by the engine
    utterance: Option<Utterance>,
    generation: UtteranceId,
    volume: f32,
    progress: Option<ProgressEstimate>,
}

impl<S, A, N> PlaybackController<S, A, N>
where
    S: SpeechEngine,
    A: AmbientEngine,
    N: Notifier,
{
    /// Create a controller.
    ///
    /// `speech` is `None` when the runtime has no speech synthesis; the
    /// controller then refuses every play request.
    pub fn new(speech: Option<S>, ambient: Option<A>, mut notifier: N, config: &ReaderConfig) -> Self {
        if speech.is_none() {
            tracing::warn!("speech synthesis unavailable");
            notifier.notify(
                &ReaderError::CapabilityUnavailable("speech synthesis".into()).user_message(),
                Severity::Warning,
            );
        }

        let mut ambient = if config.ambient.enabled {
            AmbientBed::new(ambient, config.ambient.attenuation)
        } else {
            AmbientBed::disabled()
        };
        let volume = config.playback.initial_volume.clamp(0.0, 1.0);
        ambient.set_volume(volume);

        Self {
            speech,
            ambient,
            notifier,
            speech_settings: config.speech.clone(),
            inter_article_delay: config.playback.inter_article_delay(),
            ms_per_char: config.playback.ms_per_char,
            state: PlaybackState::Idle,
            session: None,
            utterance: None,
            generation: UtteranceId(0),
            volume,
            progress: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Mode of the active session (`Single` when idle)
    pub fn mode(&self) -> PlaybackMode {
        self.session
            .as_ref()
            .map(PlaybackSession::mode)
            .unwrap_or_default()
    }

    /// Cursor of the active session (0 when idle)
    pub fn cursor(&self) -> usize {
        self.session.as_ref().map(PlaybackSession::cursor).unwrap_or(0)
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    pub fn current_article(&self) -> Option<&Article> {
        self.session.as_ref().and_then(PlaybackSession::current)
    }

    pub fn active_utterance(&self) -> Option<&Utterance> {
        self.utterance.as_ref()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_ambient_running(&self) -> bool {
        self.ambient.is_running()
    }

    pub fn has_speech(&self) -> bool {
        self.speech.is_some()
    }

    /// When the pending inter-article advance fires, if one is scheduled
    pub fn pending_advance_due(&self) -> Option<Instant> {
        self.session
            .as_ref()
            .and_then(PlaybackSession::pending_advance)
            .map(|pending| pending.due)
    }

    /// Estimated progress of the active utterance in `[0, 1]`
    pub fn progress(&self, now: Instant) -> f32 {
        self.progress
            .as_ref()
            .map(|p| p.fraction(now))
            .unwrap_or(0.0)
    }

    pub fn speech(&self) -> Option<&S> {
        self.speech.as_ref()
    }

    pub fn ambient_engine(&self) -> Option<&A> {
        self.ambient.engine()
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    /// Read one article, replacing whatever is playing.
    pub fn play_article(&mut self, article: Article) -> Result<()> {
        self.ensure_speech()?;
        tracing::info!(index = article.index, title = %article.title, "play article");
        self.start_session(PlaybackSession::single(article))
    }

    /// Read `queue` in order, replacing whatever is playing.
    pub fn play_all(&mut self, queue: Vec<Article>) -> Result<()> {
        self.ensure_speech()?;
        if queue.is_empty() {
            self.notifier.notify(MSG_NO_ARTICLES, Severity::Warning);
            return Err(ReaderError::InvalidRequest(MSG_NO_ARTICLES.into()));
        }
        tracing::info!(count = queue.len(), "play all");
        self.start_session(PlaybackSession::play_all(queue))
    }

    /// Suspend speech. Pausing while already paused is a no-op.
    pub fn pause(&mut self) -> Result<()> {
        match self.state {
            PlaybackState::Idle => self.reject_idle(),
            PlaybackState::Paused => Ok(()),
            PlaybackState::Speaking => {
                if self.utterance.is_some() {
                    if let Some(speech) = self.speech.as_mut() {
                        if let Err(e) = speech.pause() {
                            tracing::error!(error = %e, "speech engine refused to pause");
                            self.notifier.notify(MSG_SPEECH_FAILED, Severity::Error);
                            return Err(e);
                        }
                    }
                }
                if let Some(session) = self.session.as_mut() {
                    // Paused between articles: resume reads the cursor article.
                    session.cancel_advance();
                }
                if let Some(progress) = self.progress.as_mut() {
                    progress.pause(Instant::now());
                }
                self.ambient.stop();
                self.state = PlaybackState::Paused;
                tracing::debug!("paused");
                Ok(())
            }
        }
    }

    /// Continue after [`pause`](Self::pause). Resuming while speaking is a no-op.
    pub fn resume(&mut self) -> Result<()> {
        match self.state {
            PlaybackState::Idle => self.reject_idle(),
            PlaybackState::Speaking => Ok(()),
            PlaybackState::Paused => {
                if self.utterance.is_none() {
                    return self.speak_current();
                }
                if let Some(speech) = self.speech.as_mut() {
                    if let Err(e) = speech.resume() {
                        tracing::error!(error = %e, "speech engine refused to resume");
                        self.notifier.notify(MSG_SPEECH_FAILED, Severity::Error);
                        return Err(e);
                    }
                }
                if let Some(progress) = self.progress.as_mut() {
                    progress.resume(Instant::now());
                }
                self.state = PlaybackState::Speaking;
                self.ambient.start();
                tracing::debug!("resumed");
                Ok(())
            }
        }
    }

    /// Pause when speaking, resume when paused.
    pub fn toggle_pause(&mut self) -> Result<()> {
        match self.state {
            PlaybackState::Speaking => self.pause(),
            PlaybackState::Paused => self.resume(),
            PlaybackState::Idle => self.reject_idle(),
        }
    }

    /// Cancel everything and return to `Idle`. Safe to call in any state.
    pub fn stop(&mut self) {
        self.cancel_utterance();
        self.ambient.stop();
        self.session = None;
        self.state = PlaybackState::Idle;
        tracing::debug!("stopped");
    }

    /// Skip to the next article of a play-all session.
    ///
    /// Returns `Ok(false)` when there is nothing to skip to.
    pub fn next(&mut self) -> Result<bool> {
        self.step(1)
    }

    /// Go back to the previous article of a play-all session.
    pub fn previous(&mut self) -> Result<bool> {
        self.step(-1)
    }

    /// Change the volume; playback state is untouched.
    pub fn set_volume(&mut self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        self.volume = volume;
        if let Some(utterance) = self.utterance.as_mut() {
            utterance.volume = volume;
            if let Some(speech) = self.speech.as_mut() {
                speech.set_volume(volume);
            }
        }
        self.ambient.set_volume(volume);
    }

    /// Run a keyboard shortcut. Shortcuts only act while a session exists.
    pub fn dispatch(&mut self, command: TransportCommand) -> Result<()> {
        if self.session.is_none() {
            return Ok(());
        }
        match command {
            TransportCommand::TogglePause => self.toggle_pause(),
            TransportCommand::Stop => {
                self.stop();
                Ok(())
            }
            TransportCommand::Next => self.next().map(|_| ()),
            TransportCommand::Previous => self.previous().map(|_| ()),
        }
    }

    /// Apply one engine event.
    pub fn handle_speech_event(&mut self, event: SpeechEvent) {
        let current = self.utterance.as_ref().map(|u| u.id);
        if current != Some(event.id()) {
            tracing::debug!(id = event.id().0, "ignoring stale speech event");
            return;
        }

        match event {
            SpeechEvent::Started(_) => {
                if let Some(progress) = self.progress.as_mut() {
                    progress.start(Instant::now());
                    if self.state == PlaybackState::Paused {
                        progress.pause(Instant::now());
                    }
                }
            }
            SpeechEvent::Ended(id) => {
                tracing::debug!(id = id.0, "utterance ended");
                self.complete_utterance(Instant::now());
            }
            SpeechEvent::Error { id, message } => {
                tracing::error!(id = id.0, %message, "utterance failed");
                self.notifier.notify(MSG_SPEECH_FAILED, Severity::Error);
                self.complete_utterance(Instant::now());
            }
        }
    }

    /// Fire the inter-article advance if it is due.
    pub fn tick(&mut self, now: Instant) {
        if self.state != PlaybackState::Speaking {
            return;
        }
        let due = self
            .session
            .as_mut()
            .and_then(|session| session.take_due_advance(now));
        if due.is_some() {
            if let Err(e) = self.speak_current() {
                tracing::debug!(error = %e, "scheduled advance failed");
            }
        }
    }

    /// Drain engine events and run the timer; call once per loop iteration.
    pub fn pump(&mut self, now: Instant) {
        let events = self
            .speech
            .as_mut()
            .map(|speech| speech.poll_events())
            .unwrap_or_default();
        for event in events {
            self.handle_speech_event(event);
        }
        self.tick(now);
    }

    fn ensure_speech(&mut self) -> Result<()> {
        if self.speech.is_some() {
            return Ok(());
        }
        let err = ReaderError::CapabilityUnavailable("speech synthesis".into());
        self.notifier.notify(&err.user_message(), Severity::Error);
        Err(err)
    }

    fn reject_idle(&mut self) -> Result<()> {
        self.notifier.notify(MSG_NO_AUDIO, Severity::Warning);
        Err(ReaderError::InvalidRequest(MSG_NO_AUDIO.into()))
    }

    fn start_session(&mut self, session: PlaybackSession) -> Result<()> {
        self.cancel_utterance();
        self.session = Some(session);
        self.speak_current()
    }

    fn step(&mut self, delta: isize) -> Result<bool> {
        if self.state == PlaybackState::Idle {
            return Ok(false);
        }
        let moved = match self.session.as_mut() {
            Some(session) => session.step(delta),
            None => false,
        };
        if !moved {
            return Ok(false);
        }

        self.cancel_utterance();
        if let Some(session) = self.session.as_mut() {
            session.cancel_advance();
        }
        tracing::debug!(cursor = self.cursor(), "skipped");
        self.speak_current().map(|()| true)
    }

    /// Hard-cancel the engine's utterance, if any.
    fn cancel_utterance(&mut self) {
        if self.utterance.take().is_some() {
            if let Some(speech) = self.speech.as_mut() {
                speech.cancel();
            }
        }
        self.progress = None;
    }

    /// Speak the article under the cursor and enter `Speaking`.
    fn speak_current(&mut self) -> Result<()> {
        let Some(article) = self.current_article().cloned() else {
            self.finish_session();
            return Ok(());
        };
        let Some(speech) = self.speech.as_mut() else {
            self.stop();
            return Err(ReaderError::CapabilityUnavailable("speech synthesis".into()));
        };

        self.generation = self.generation.next();
        let voices = speech.voices();
        let utterance = Utterance::for_article(
            self.generation,
            &article,
            &self.speech_settings,
            self.volume,
            &voices,
        );

        if let Err(e) = speech.speak(&utterance) {
            tracing::error!(index = article.index, error = %e, "failed to start utterance");
            self.notifier.notify(MSG_SPEECH_FAILED, Severity::Error);
            self.state = PlaybackState::Speaking;
            self.complete_utterance(Instant::now());
            return Err(e);
        }

        tracing::debug!(
            id = utterance.id.0,
            index = article.index,
            voice = utterance.voice.as_ref().map(|v| v.name.as_str()).unwrap_or("default"),
            "speaking"
        );
        self.progress = Some(ProgressEstimate::new(article.spoken_len(), self.ms_per_char));
        self.utterance = Some(utterance);
        self.state = PlaybackState::Speaking;
        self.ambient.start();
        Ok(())
    }

    /// The active utterance is over (ended or failed): schedule the next
    /// article or finish the session.
    fn complete_utterance(&mut self, now: Instant) {
        self.utterance = None;
        self.progress = None;
        self.ambient.stop();

        let has_next = self
            .session
            .as_ref()
            .map(PlaybackSession::has_next)
            .unwrap_or(false);
        if !has_next {
            self.finish_session();
            return;
        }

        let paused = self.state == PlaybackState::Paused;
        if let Some(session) = self.session.as_mut() {
            session.advance();
            if !paused {
                session.schedule_advance(now + self.inter_article_delay);
            }
        }
        tracing::debug!(cursor = self.cursor(), "next article scheduled");
    }

    fn finish_session(&mut self) {
        let was_play_all = self.mode() == PlaybackMode::PlayAll;
        self.stop();
        if was_play_all {
            self.notifier.notify(MSG_FINISHED_ALL, Severity::Success);
        }
    }
}
