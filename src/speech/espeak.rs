//! espeak-ng speech engine.
//!
//! Text is synthesised by running `espeak-ng --stdout` on a worker thread; the
//! resulting WAV is decoded and played through a rodio [`Sink`], which gives
//! real pause/resume/stop on the audio. Lifecycle events are produced from
//! [`SpeechEngine::poll_events`], so the caller's loop never blocks on
//! synthesis.

use super::{SpeechEngine, SpeechEvent, Utterance, UtteranceId, VoiceDescriptor};
use crate::{ReaderError, Result};
use rodio::{Decoder, OutputStreamHandle, Sink};
use std::io::{Cursor, Write};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};

const ESPEAK_BINARY: &str = "espeak-ng";

/// Largest WAV we are willing to decode (10 MB)
const MAX_WAV_BYTES: usize = 10 * 1024 * 1024;

struct SynthOutcome {
    id: UtteranceId,
    wav: std::result::Result<Vec<u8>, String>,
}

/// Speech engine backed by the `espeak-ng` command line tool
pub struct EspeakEngine {
    handle: OutputStreamHandle,
    base_words_per_minute: u32,
    voices: Vec<VoiceDescriptor>,
    /// Utterance the engine currently owns (synthesising or playing)
    active: Option<UtteranceId>,
    sink: Option<Sink>,
    paused: bool,
    volume: f32,
    tx: Sender<SynthOutcome>,
    rx: Receiver<SynthOutcome>,
    pending: Vec<SpeechEvent>,
}

impl EspeakEngine {
    /// Probe for `espeak-ng` and load its voice list.
    ///
    /// Returns [`ReaderError::CapabilityUnavailable`] when the binary cannot be run.
    pub fn new(handle: OutputStreamHandle, base_words_per_minute: u32) -> Result<Self> {
        let probe = Command::new(ESPEAK_BINARY)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match probe {
            Ok(status) if status.success() => {}
            Ok(status) => {
                return Err(ReaderError::CapabilityUnavailable(format!(
                    "{ESPEAK_BINARY} --version exited with {status}"
                )))
            }
            Err(e) => {
                return Err(ReaderError::CapabilityUnavailable(format!(
                    "{ESPEAK_BINARY} not found: {e}"
                )))
            }
        }

        let voices = list_voices().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not list espeak-ng voices");
            Vec::new()
        });
        tracing::debug!(count = voices.len(), "espeak-ng voices loaded");

        let (tx, rx) = mpsc::channel();
        Ok(Self {
            handle,
            base_words_per_minute,
            voices,
            active: None,
            sink: None,
            paused: false,
            volume: 1.0,
            tx,
            rx,
            pending: Vec::new(),
        })
    }

    fn words_per_minute(&self, rate: f32) -> u32 {
        ((self.base_words_per_minute as f32 * rate).round() as u32).clamp(80, 450)
    }

    fn start_playback(&mut self, id: UtteranceId, wav: Vec<u8>) -> Result<()> {
        if wav.len() > MAX_WAV_BYTES {
            return Err(ReaderError::EngineError(format!(
                "synthesised audio too large ({} bytes)",
                wav.len()
            )));
        }

        let source = Decoder::new(Cursor::new(wav))
            .map_err(|e| ReaderError::EngineError(format!("Failed to decode speech: {e}")))?;
        let sink = Sink::try_new(&self.handle)
            .map_err(|e| ReaderError::AudioDevice(format!("Failed to create audio sink: {e}")))?;

        sink.set_volume(self.volume);
        sink.append(source);
        if self.paused {
            sink.pause();
        } else {
            sink.play();
        }

        self.sink = Some(sink);
        self.pending.push(SpeechEvent::Started(id));
        Ok(())
    }
}

impl SpeechEngine for EspeakEngine {
    fn speak(&mut self, utterance: &Utterance) -> Result<()> {
        self.cancel();

        self.active = Some(utterance.id);
        self.volume = utterance.volume.clamp(0.0, 1.0);

        let mut args = vec![
            "--stdout".to_string(),
            "--stdin".to_string(),
            "-s".to_string(),
            self.words_per_minute(utterance.rate).to_string(),
            "-p".to_string(),
            espeak_pitch(utterance.pitch).to_string(),
        ];
        if let Some(voice) = &utterance.voice {
            args.push("-v".to_string());
            args.push(voice.language.clone());
        }

        let id = utterance.id;
        let text = utterance.text.clone();
        let tx = self.tx.clone();
        std::thread::spawn(move || {
            let wav = synthesize(&args, &text);
            // Receiver gone means the engine was dropped; nothing left to tell.
            let _ = tx.send(SynthOutcome { id, wav });
        });

        tracing::debug!(id = id.0, "espeak-ng synthesis started");
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        if self.active.is_none() {
            return Err(ReaderError::InvalidRequest("No utterance to pause".into()));
        }
        self.paused = true;
        if let Some(sink) = &self.sink {
            sink.pause();
        }
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        if self.active.is_none() {
            return Err(ReaderError::InvalidRequest("No utterance to resume".into()));
        }
        self.paused = false;
        if let Some(sink) = &self.sink {
            sink.play();
        }
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        self.active = None;
        self.paused = false;
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(sink) = &self.sink {
            sink.set_volume(self.volume);
        }
    }

    fn voices(&self) -> Vec<VoiceDescriptor> {
        self.voices.clone()
    }

    fn poll_events(&mut self) -> Vec<SpeechEvent> {
        while let Ok(outcome) = self.rx.try_recv() {
            if self.active != Some(outcome.id) || self.sink.is_some() {
                // Superseded by a later speak() or cancel()
                continue;
            }
            let result = outcome
                .wav
                .map_err(ReaderError::EngineError)
                .and_then(|wav| self.start_playback(outcome.id, wav));
            if let Err(e) = result {
                tracing::error!(id = outcome.id.0, error = %e, "espeak-ng utterance failed");
                self.active = None;
                self.pending.push(SpeechEvent::Error {
                    id: outcome.id,
                    message: e.to_string(),
                });
            }
        }

        if let (Some(id), Some(sink)) = (self.active, &self.sink) {
            if sink.empty() {
                self.sink = None;
                self.active = None;
                self.pending.push(SpeechEvent::Ended(id));
            }
        }

        std::mem::take(&mut self.pending)
    }
}

/// Map a pitch multiplier (1.0 = neutral) onto espeak's 0-99 scale (50 = neutral).
fn espeak_pitch(pitch: f32) -> u32 {
    ((pitch * 50.0).round() as i64).clamp(0, 99) as u32
}

fn synthesize(args: &[String], text: &str) -> std::result::Result<Vec<u8>, String> {
    let mut child = Command::new(ESPEAK_BINARY)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("Failed to run {ESPEAK_BINARY}: {e}"))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(text.as_bytes())
            .map_err(|e| format!("Failed to send text to {ESPEAK_BINARY}: {e}"))?;
    }

    let output = child
        .wait_with_output()
        .map_err(|e| format!("{ESPEAK_BINARY} did not finish: {e}"))?;
    if !output.status.success() {
        return Err(format!(
            "{ESPEAK_BINARY} failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }
    if output.stdout.is_empty() {
        return Err(format!("{ESPEAK_BINARY} produced no audio"));
    }
    Ok(output.stdout)
}

fn list_voices() -> std::result::Result<Vec<VoiceDescriptor>, String> {
    let output = Command::new(ESPEAK_BINARY)
        .arg("--voices")
        .output()
        .map_err(|e| format!("Failed to list voices: {e}"))?;
    if !output.status.success() {
        return Ok(Vec::new());
    }
    Ok(parse_voice_table(&String::from_utf8_lossy(&output.stdout)))
}

/// Parse the table printed by `espeak-ng --voices`:
///
/// ```text
/// Pty Language       Age/Gender VoiceName          File                 Other Languages
///  5  af              --/M      Afrikaans          gmw/af
///  2  en-gb           --/M      English_(Great_Britain) gmw/en
/// ```
fn parse_voice_table(table: &str) -> Vec<VoiceDescriptor> {
    table
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut columns = line.split_whitespace();
            let _priority = columns.next()?;
            let language = columns.next()?;
            let _age_gender = columns.next()?;
            let name = columns.next()?;
            Some(VoiceDescriptor::new(name.replace('_', " "), language))
        })
        .collect()
}
