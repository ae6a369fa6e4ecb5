//! Best-effort progress estimate for the active utterance.
//!
//! Speech engines do not report position, so duration is guessed from the
//! text length. The value only drives the progress bar; nothing is timed
//! from it.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct ProgressEstimate {
    estimated: Duration,
    /// Speaking time accumulated before the last pause
    banked: Duration,
    running_since: Option<Instant>,
    started: bool,
}

impl ProgressEstimate {
    pub fn new(chars: usize, ms_per_char: u64) -> Self {
        Self {
            estimated: Duration::from_millis(chars as u64 * ms_per_char),
            banked: Duration::ZERO,
            running_since: None,
            started: false,
        }
    }

    pub fn estimated(&self) -> Duration {
        self.estimated
    }

    /// Audio became audible.
    pub fn start(&mut self, now: Instant) {
        if !self.started {
            self.started = true;
            self.running_since = Some(now);
        }
    }

    pub fn pause(&mut self, now: Instant) {
        if let Some(since) = self.running_since.take() {
            self.banked += now.saturating_duration_since(since);
        }
    }

    pub fn resume(&mut self, now: Instant) {
        if self.started && self.running_since.is_none() {
            self.running_since = Some(now);
        }
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        self.banked
            + self
                .running_since
                .map(|since| now.saturating_duration_since(since))
                .unwrap_or_default()
    }

    /// Fraction in `[0, 1]`
    pub fn fraction(&self, now: Instant) -> f32 {
        if self.estimated.is_zero() {
            return if self.started { 1.0 } else { 0.0 };
        }
        (self.elapsed(now).as_secs_f32() / self.estimated.as_secs_f32()).clamp(0.0, 1.0)
    }
}
