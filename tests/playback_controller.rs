//! Integration tests for the playback state machine
//!
//! These drive the controller with recording speech/ambient engines and
//! verify state transitions, ambient gating, the inter-article timer and
//! stale-callback handling.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use wingoo_reader::ambient::AmbientEngine;
use wingoo_reader::article::articles_from_pairs;
use wingoo_reader::notify::Notification;
use wingoo_reader::speech::{SpeechEngine, SpeechEvent, Utterance, UtteranceId, VoiceDescriptor};
use wingoo_reader::{
    Article, PlaybackController, PlaybackMode, PlaybackState, ReaderConfig, ReaderError, Result,
    Severity, TransportCommand,
};

#[derive(Debug, Clone, PartialEq)]
enum SpeechCall {
    Speak(String),
    Pause,
    Resume,
    Cancel,
    Volume(f32),
}

#[derive(Default)]
struct RecordingSpeech {
    calls: Vec<SpeechCall>,
    /// Events handed out on the next `poll_events`
    events: Rc<RefCell<Vec<SpeechEvent>>>,
    fail_speak: bool,
}

impl RecordingSpeech {
    fn spoken(&self) -> Vec<String> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SpeechCall::Speak(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

impl SpeechEngine for RecordingSpeech {
    fn speak(&mut self, utterance: &Utterance) -> Result<()> {
        if self.fail_speak {
            return Err(ReaderError::EngineError("synthesis failed".into()));
        }
        self.calls.push(SpeechCall::Speak(utterance.text.clone()));
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.calls.push(SpeechCall::Pause);
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        self.calls.push(SpeechCall::Resume);
        Ok(())
    }

    fn cancel(&mut self) {
        self.calls.push(SpeechCall::Cancel);
    }

    fn set_volume(&mut self, volume: f32) {
        self.calls.push(SpeechCall::Volume(volume));
    }

    fn voices(&self) -> Vec<VoiceDescriptor> {
        vec![
            VoiceDescriptor::new("Thomas", "fr-FR"),
            VoiceDescriptor::new("Google UK English Female", "en-GB"),
        ]
    }

    fn poll_events(&mut self) -> Vec<SpeechEvent> {
        self.events.borrow_mut().drain(..).collect()
    }
}

/// Ambient engine whose running flag is visible from the test
#[derive(Clone, Default)]
struct SharedAmbient {
    running: Rc<RefCell<bool>>,
    starts: Rc<RefCell<usize>>,
    gain: Rc<RefCell<f32>>,
    fail: bool,
}

impl AmbientEngine for SharedAmbient {
    fn start(&mut self) -> Result<()> {
        if self.fail {
            return Err(ReaderError::AudioDevice("device lost".into()));
        }
        *self.running.borrow_mut() = true;
        *self.starts.borrow_mut() += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if self.fail {
            return Err(ReaderError::AudioDevice("device lost".into()));
        }
        *self.running.borrow_mut() = false;
        Ok(())
    }

    fn set_gain(&mut self, gain: f32) -> Result<()> {
        *self.gain.borrow_mut() = gain;
        Ok(())
    }
}

type Controller = PlaybackController<RecordingSpeech, SharedAmbient, Vec<Notification>>;

fn create_controller() -> (Controller, SharedAmbient) {
    let ambient = SharedAmbient::default();
    let controller = PlaybackController::new(
        Some(RecordingSpeech::default()),
        Some(ambient.clone()),
        Vec::new(),
        &ReaderConfig::default(),
    );
    (controller, ambient)
}

fn two_articles() -> Vec<Article> {
    articles_from_pairs([("A", "a1"), ("B", "b1")])
}

fn current_id(controller: &Controller) -> UtteranceId {
    controller
        .active_utterance()
        .expect("an utterance should be active")
        .id
}

fn end_current(controller: &mut Controller) {
    let id = current_id(controller);
    controller.handle_speech_event(SpeechEvent::Ended(id));
}

fn after_delay() -> Instant {
    Instant::now() + Duration::from_millis(1500)
}

fn errors(controller: &Controller) -> usize {
    controller
        .notifier()
        .iter()
        .filter(|n| n.severity == Severity::Error)
        .count()
}

#[test]
fn test_play_all_two_articles_with_gap() {
    let (mut c, ambient) = create_controller();

    c.play_all(two_articles()).unwrap();
    assert_eq!(c.state(), PlaybackState::Speaking);
    assert_eq!(c.current_article().unwrap().title, "A");
    assert!(*ambient.running.borrow(), "ambient should run while A is spoken");

    end_current(&mut c);
    assert_eq!(c.state(), PlaybackState::Speaking, "session continues through the gap");
    assert!(c.active_utterance().is_none());
    assert!(!*ambient.running.borrow(), "ambient should be off during the gap");
    assert_eq!(c.cursor(), 1);

    let due = c.pending_advance_due().expect("advance should be scheduled");
    let remaining = due.saturating_duration_since(Instant::now());
    assert!(remaining > Duration::from_millis(900) && remaining <= Duration::from_millis(1000));

    c.tick(Instant::now());
    assert!(c.active_utterance().is_none(), "timer must not fire early");

    c.tick(after_delay());
    assert_eq!(c.current_article().unwrap().title, "B");
    assert!(*ambient.running.borrow(), "ambient should run while B is spoken");

    end_current(&mut c);
    assert_eq!(c.state(), PlaybackState::Idle);
    assert!(!*ambient.running.borrow());
    assert_eq!(c.speech().unwrap().spoken(), vec!["A. a1", "B. b1"]);
    assert_eq!(
        c.notifier().last(),
        Some(&Notification {
            message: "Finished playing all articles".into(),
            severity: Severity::Success,
        })
    );
}

#[test]
fn test_play_all_speaks_every_article_in_order() {
    for len in 1..=5 {
        let (mut c, _ambient) = create_controller();
        let queue = articles_from_pairs((0..len).map(|i| (format!("T{i}"), format!("b{i}"))));
        c.play_all(queue).unwrap();

        let mut completions = 0;
        while c.state() != PlaybackState::Idle {
            end_current(&mut c);
            completions += 1;
            c.tick(after_delay());
            assert!(completions <= len, "queue of {len} should finish in {len} completions");
        }

        assert_eq!(completions, len);
        let expected: Vec<String> = (0..len).map(|i| format!("T{i}. b{i}")).collect();
        assert_eq!(c.speech().unwrap().spoken(), expected);
    }
}

#[test]
fn test_single_article_finishes_without_success_toast() {
    let (mut c, ambient) = create_controller();
    c.play_article(Article::new("X", "x1", 0)).unwrap();
    assert_eq!(c.mode(), PlaybackMode::Single);

    end_current(&mut c);
    assert_eq!(c.state(), PlaybackState::Idle);
    assert!(!*ambient.running.borrow());
    assert!(c.notifier().is_empty());
}

fn idle(_: &mut Controller) {}

fn speaking(c: &mut Controller) {
    c.play_all(two_articles()).unwrap();
}

fn paused(c: &mut Controller) {
    speaking(c);
    c.pause().unwrap();
}

fn in_gap(c: &mut Controller) {
    speaking(c);
    end_current(c);
}

fn on_second_article(c: &mut Controller) {
    speaking(c);
    c.next().unwrap();
}

#[test]
fn test_stop_from_every_state() {
    let setups: [(&str, fn(&mut Controller)); 5] = [
        ("idle", idle),
        ("speaking", speaking),
        ("paused", paused),
        ("gap", in_gap),
        ("second article", on_second_article),
    ];

    for (name, setup) in setups {
        let (mut c, ambient) = create_controller();
        setup(&mut c);
        c.stop();

        assert_eq!(c.state(), PlaybackState::Idle, "{name}: state");
        assert_eq!(c.cursor(), 0, "{name}: cursor");
        assert_eq!(c.mode(), PlaybackMode::Single, "{name}: mode");
        assert!(!*ambient.running.borrow(), "{name}: ambient");
        assert!(c.pending_advance_due().is_none(), "{name}: timer");
        assert!(c.active_utterance().is_none(), "{name}: utterance");
    }
}

#[test]
fn test_stop_cancels_utterance_in_engine() {
    let (mut c, _ambient) = create_controller();
    c.play_article(Article::new("X", "x1", 0)).unwrap();
    c.stop();
    assert_eq!(c.speech().unwrap().calls.last(), Some(&SpeechCall::Cancel));
}

#[test]
fn test_pause_resume_preserves_session() {
    let (mut c, ambient) = create_controller();
    c.play_all(articles_from_pairs([("A", "a1"), ("B", "b1"), ("C", "c1")]))
        .unwrap();
    c.next().unwrap();

    c.pause().unwrap();
    assert_eq!(c.state(), PlaybackState::Paused);
    assert!(!*ambient.running.borrow(), "ambient stops while paused");

    c.resume().unwrap();
    assert_eq!(c.state(), PlaybackState::Speaking);
    assert_eq!(c.mode(), PlaybackMode::PlayAll);
    assert_eq!(c.cursor(), 1);
    assert_eq!(c.session().unwrap().len(), 3);
    assert!(*ambient.running.borrow());

    let calls = &c.speech().unwrap().calls;
    assert!(calls.ends_with(&[SpeechCall::Pause, SpeechCall::Resume]));
}

#[test]
fn test_toggle_pause_round_trip() {
    let (mut c, _ambient) = create_controller();
    c.play_article(Article::new("X", "x1", 0)).unwrap();
    c.dispatch(TransportCommand::TogglePause).unwrap();
    assert_eq!(c.state(), PlaybackState::Paused);
    c.dispatch(TransportCommand::TogglePause).unwrap();
    assert_eq!(c.state(), PlaybackState::Speaking);
    c.dispatch(TransportCommand::Stop).unwrap();
    assert_eq!(c.state(), PlaybackState::Idle);
}

#[test]
fn test_toggle_when_idle_warns() {
    let (mut c, _ambient) = create_controller();
    assert!(matches!(c.toggle_pause(), Err(ReaderError::InvalidRequest(_))));
    assert_eq!(c.notifier()[0].message, "No audio to play");
    assert_eq!(c.notifier()[0].severity, Severity::Warning);
}

#[test]
fn test_pause_during_gap_then_resume_reads_next_article() {
    let (mut c, ambient) = create_controller();
    c.play_all(two_articles()).unwrap();
    end_current(&mut c);

    c.pause().unwrap();
    assert!(c.pending_advance_due().is_none(), "timer is dropped while paused");
    c.tick(after_delay());
    assert!(c.active_utterance().is_none());

    c.resume().unwrap();
    assert_eq!(c.current_article().unwrap().title, "B");
    assert!(c.active_utterance().is_some());
    assert!(*ambient.running.borrow());
}

#[test]
fn test_volume_applies_immediately_without_state_change() {
    let (mut c, ambient) = create_controller();
    c.play_article(Article::new("X", "x1", 0)).unwrap();

    c.set_volume(0.5);
    assert_eq!(c.state(), PlaybackState::Speaking);
    assert_eq!(c.active_utterance().unwrap().volume, 0.5);
    assert_eq!(c.speech().unwrap().calls.last(), Some(&SpeechCall::Volume(0.5)));
    approx::assert_relative_eq!(*ambient.gain.borrow(), 0.01);

    c.pause().unwrap();
    c.set_volume(1.0);
    assert_eq!(c.state(), PlaybackState::Paused);
    approx::assert_relative_eq!(*ambient.gain.borrow(), 0.02);
}

#[test]
fn test_next_previous_stay_in_bounds() {
    let (mut c, _ambient) = create_controller();
    c.play_all(articles_from_pairs([("A", "a"), ("B", "b"), ("C", "c")]))
        .unwrap();

    assert!(!c.previous().unwrap(), "already at the first article");
    assert_eq!(c.cursor(), 0);

    assert!(c.next().unwrap());
    assert!(c.next().unwrap());
    assert!(!c.next().unwrap(), "already at the last article");
    assert_eq!(c.cursor(), 2);
    assert_eq!(c.current_article().unwrap().title, "C");

    assert!(c.previous().unwrap());
    assert_eq!(c.cursor(), 1);

    let spoken = c.speech().unwrap().spoken();
    assert_eq!(spoken, vec!["A. a", "B. b", "C. c", "B. b"]);
}

#[test]
fn test_next_from_paused_resumes_speaking() {
    let (mut c, ambient) = create_controller();
    c.play_all(two_articles()).unwrap();
    c.pause().unwrap();

    assert!(c.next().unwrap());
    assert_eq!(c.state(), PlaybackState::Speaking);
    assert!(*ambient.running.borrow());
    assert_eq!(c.current_article().unwrap().title, "B");
}

#[test]
fn test_next_is_ignored_in_single_mode() {
    let (mut c, _ambient) = create_controller();
    c.play_article(Article::new("X", "x1", 0)).unwrap();
    assert!(!c.next().unwrap());
    assert!(!c.previous().unwrap());
    assert_eq!(c.speech().unwrap().spoken().len(), 1);
}

#[test]
fn test_next_during_gap_cancels_timer() {
    let (mut c, _ambient) = create_controller();
    c.play_all(articles_from_pairs([("A", "a"), ("B", "b"), ("C", "c")]))
        .unwrap();
    end_current(&mut c);
    assert_eq!(c.cursor(), 1);

    assert!(c.next().unwrap());
    assert_eq!(c.current_article().unwrap().title, "C");
    assert!(c.pending_advance_due().is_none());

    c.tick(after_delay());
    assert_eq!(c.speech().unwrap().spoken(), vec!["A. a", "C. c"]);
}

#[test]
fn test_stale_completion_after_stop_is_ignored() {
    let (mut c, ambient) = create_controller();
    c.play_all(two_articles()).unwrap();
    let old = current_id(&c);

    c.stop();
    c.handle_speech_event(SpeechEvent::Ended(old));
    c.handle_speech_event(SpeechEvent::Error {
        id: old,
        message: "interrupted".into(),
    });
    c.tick(after_delay());

    assert_eq!(c.state(), PlaybackState::Idle);
    assert!(!*ambient.running.borrow());
    assert!(c.notifier().is_empty(), "stale events must not notify");
    assert_eq!(c.speech().unwrap().spoken().len(), 1);
}

#[test]
fn test_stale_completion_from_superseded_session_is_ignored() {
    let (mut c, _ambient) = create_controller();
    c.play_all(two_articles()).unwrap();
    let old = current_id(&c);

    c.play_article(Article::new("X", "x1", 9)).unwrap();
    c.handle_speech_event(SpeechEvent::Ended(old));

    assert_eq!(c.state(), PlaybackState::Speaking);
    assert_eq!(c.mode(), PlaybackMode::Single);
    assert_eq!(c.current_article().unwrap().title, "X");
}

#[test]
fn test_new_session_cancels_pending_advance() {
    let (mut c, _ambient) = create_controller();
    c.play_all(two_articles()).unwrap();
    end_current(&mut c);
    assert!(c.pending_advance_due().is_some());

    c.play_article(Article::new("X", "x1", 0)).unwrap();
    assert!(c.pending_advance_due().is_none());

    c.tick(after_delay());
    assert_eq!(c.speech().unwrap().spoken(), vec!["A. a1", "X. x1"]);
}

#[test]
fn test_play_without_speech_capability() {
    let config = ReaderConfig::default();
    let mut c: Controller =
        PlaybackController::new(None, Some(SharedAmbient::default()), Vec::new(), &config);
    let warnings_at_start = c.notifier().len();

    let result = c.play_article(Article::new("X", "x1", 0));
    assert!(matches!(result, Err(ReaderError::CapabilityUnavailable(_))));
    assert_eq!(c.state(), PlaybackState::Idle);
    assert!(c.active_utterance().is_none(), "no utterance may be constructed");
    assert_eq!(errors(&c), 1);
    assert_eq!(c.notifier().len(), warnings_at_start + 1);

    assert!(c.play_all(two_articles()).is_err());
    assert_eq!(c.state(), PlaybackState::Idle);
}

#[test]
fn test_play_all_with_empty_queue_is_rejected() {
    let (mut c, ambient) = create_controller();
    let result = c.play_all(Vec::new());

    assert!(matches!(result, Err(ReaderError::InvalidRequest(_))));
    assert_eq!(c.state(), PlaybackState::Idle);
    assert!(!*ambient.running.borrow());
    assert_eq!(c.notifier()[0].message, "No articles available to play");
}

#[test]
fn test_engine_error_advances_like_completion() {
    let (mut c, ambient) = create_controller();
    c.play_all(two_articles()).unwrap();
    let id = current_id(&c);

    c.handle_speech_event(SpeechEvent::Error {
        id,
        message: "synthesis-failed".into(),
    });
    assert_eq!(errors(&c), 1);
    assert!(!*ambient.running.borrow());
    assert_eq!(c.cursor(), 1);

    c.tick(after_delay());
    assert_eq!(
        c.speech().unwrap().spoken(),
        vec!["A. a1", "B. b1"],
        "failed article is not retried"
    );
}

#[test]
fn test_speak_failure_stops_single_playback() {
    let speech = RecordingSpeech {
        fail_speak: true,
        ..Default::default()
    };
    let mut c: Controller = PlaybackController::new(
        Some(speech),
        Some(SharedAmbient::default()),
        Vec::new(),
        &ReaderConfig::default(),
    );

    let result = c.play_article(Article::new("X", "x1", 0));
    assert!(matches!(result, Err(ReaderError::EngineError(_))));
    assert_eq!(c.state(), PlaybackState::Idle);
    assert_eq!(errors(&c), 1);
}

#[test]
fn test_ambient_failures_never_block_speech() {
    let ambient = SharedAmbient {
        fail: true,
        ..Default::default()
    };
    let mut c: Controller = PlaybackController::new(
        Some(RecordingSpeech::default()),
        Some(ambient),
        Vec::new(),
        &ReaderConfig::default(),
    );

    c.play_article(Article::new("X", "x1", 0)).unwrap();
    assert_eq!(c.state(), PlaybackState::Speaking);
    assert!(!c.is_ambient_running());
    end_current(&mut c);
    assert_eq!(c.state(), PlaybackState::Idle);
    assert!(c.notifier().is_empty(), "ambient failures are logged only");
}

#[test]
fn test_ambient_disabled_in_config() {
    let mut config = ReaderConfig::default();
    config.ambient.enabled = false;
    let ambient = SharedAmbient::default();
    let mut c: Controller = PlaybackController::new(
        Some(RecordingSpeech::default()),
        Some(ambient.clone()),
        Vec::new(),
        &config,
    );

    c.play_article(Article::new("X", "x1", 0)).unwrap();
    assert_eq!(*ambient.starts.borrow(), 0);
}

#[test]
fn test_pump_drains_engine_events() {
    let events = Rc::new(RefCell::new(Vec::new()));
    let speech = RecordingSpeech {
        events: Rc::clone(&events),
        ..Default::default()
    };
    let mut c: Controller = PlaybackController::new(
        Some(speech),
        Some(SharedAmbient::default()),
        Vec::new(),
        &ReaderConfig::default(),
    );
    c.play_all(two_articles()).unwrap();
    let id = current_id(&c);

    // A late event from an unrelated utterance is mixed in
    events.borrow_mut().extend([
        SpeechEvent::Ended(UtteranceId(id.0 + 100)),
        SpeechEvent::Started(id),
        SpeechEvent::Ended(id),
    ]);
    c.pump(Instant::now());
    assert!(events.borrow().is_empty());
    assert_eq!(c.cursor(), 1);
    assert!(c.active_utterance().is_none());

    c.pump(after_delay());
    assert_eq!(c.current_article().unwrap().title, "B");

    let id = current_id(&c);
    events.borrow_mut().push(SpeechEvent::Ended(id));
    c.pump(Instant::now());
    assert_eq!(c.state(), PlaybackState::Idle);
}

#[test]
fn test_preferred_voice_is_used() {
    let (mut c, _ambient) = create_controller();
    c.play_article(Article::new("X", "x1", 0)).unwrap();
    let voice = c.active_utterance().unwrap().voice.clone().unwrap();
    assert_eq!(voice.name, "Google UK English Female");
    approx::assert_relative_eq!(c.active_utterance().unwrap().rate, 0.9);
}

#[test]
fn test_progress_resets_between_articles() {
    let (mut c, _ambient) = create_controller();
    c.play_all(two_articles()).unwrap();
    let id = current_id(&c);
    c.handle_speech_event(SpeechEvent::Started(id));
    assert!(c.progress(Instant::now() + Duration::from_millis(100)) > 0.0);

    end_current(&mut c);
    assert_eq!(c.progress(Instant::now()), 0.0);
}
