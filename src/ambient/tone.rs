//! Sine-oscillator ambient bed played through rodio.

use super::AmbientEngine;
use crate::{ReaderError, Result};
use rodio::{OutputStreamHandle, Sink, Source};
use std::f32::consts::PI;
use std::time::Duration;

pub const AMBIENT_SAMPLE_RATE: u32 = 44_100;

/// Endless mono source summing one sine oscillator per frequency.
pub struct SineBedSource {
    phases: Vec<f32>,
    phase_incs: Vec<f32>,
    sample_rate: u32,
}

impl SineBedSource {
    pub fn new(frequencies: &[f32], sample_rate: u32) -> Self {
        let phase_incs = frequencies
            .iter()
            .map(|freq| 2.0 * PI * freq / sample_rate as f32)
            .collect::<Vec<_>>();
        Self {
            phases: vec![0.0; phase_incs.len()],
            phase_incs,
            sample_rate,
        }
    }
}

impl Iterator for SineBedSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        let mut sample = 0.0;
        for (phase, inc) in self.phases.iter_mut().zip(&self.phase_incs) {
            sample += phase.sin();
            *phase += inc;
            if *phase > 2.0 * PI {
                *phase -= 2.0 * PI;
            }
        }
        Some(sample)
    }
}

impl Source for SineBedSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

/// Ambient engine that plays a [`SineBedSource`] on its own sink.
///
/// A fresh sink and source are built on every `start`; `stop` discards them.
pub struct ToneBed {
    handle: OutputStreamHandle,
    frequencies: Vec<f32>,
    gain: f32,
    sink: Option<Sink>,
}

impl ToneBed {
    pub fn new(handle: OutputStreamHandle, frequencies: Vec<f32>) -> Self {
        Self {
            handle,
            frequencies,
            gain: 0.0,
            sink: None,
        }
    }
}

impl AmbientEngine for ToneBed {
    fn start(&mut self) -> Result<()> {
        if self.sink.is_some() {
            return Ok(());
        }
        let sink = Sink::try_new(&self.handle)
            .map_err(|e| ReaderError::AudioDevice(format!("Failed to create ambient sink: {e}")))?;
        sink.set_volume(self.gain);
        sink.append(SineBedSource::new(&self.frequencies, AMBIENT_SAMPLE_RATE));
        sink.play();
        self.sink = Some(sink);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
        Ok(())
    }

    fn set_gain(&mut self, gain: f32) -> Result<()> {
        self.gain = gain.max(0.0);
        if let Some(sink) = &self.sink {
            sink.set_volume(self.gain);
        }
        Ok(())
    }
}
