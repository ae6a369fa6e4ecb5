//! Ambient background tone.
//!
//! An [`AmbientEngine`] produces the quiet tone bed that plays under speech.
//! [`AmbientBed`] wraps an optional engine with the gating rules the
//! controller relies on: starting a running bed and stopping a stopped bed
//! are no-ops, and engine failures never reach the caller.

#[cfg(feature = "audio")]
pub mod tone;

#[cfg(feature = "audio")]
pub use tone::{SineBedSource, ToneBed};

use crate::Result;

/// Background tone capability.
///
/// Oscillator-style engines are single-use: `stop` may tear the sources down
/// and the next `start` builds fresh ones.
pub trait AmbientEngine {
    fn start(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
    /// Absolute output gain (already attenuated)
    fn set_gain(&mut self, gain: f32) -> Result<()>;
}

/// Gate around an optional [`AmbientEngine`]
pub struct AmbientBed<A> {
    engine: Option<A>,
    running: bool,
    attenuation: f32,
}

impl<A: AmbientEngine> AmbientBed<A> {
    /// `attenuation` scales the user volume down to the ambient gain.
    pub fn new(engine: Option<A>, attenuation: f32) -> Self {
        if engine.is_none() {
            tracing::warn!("ambient engine unavailable, playing speech without background tone");
        }
        Self {
            engine,
            running: false,
            attenuation,
        }
    }

    /// A bed that never makes a sound.
    pub fn disabled() -> Self {
        Self {
            engine: None,
            running: false,
            attenuation: 0.0,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_available(&self) -> bool {
        self.engine.is_some()
    }

    pub fn engine(&self) -> Option<&A> {
        self.engine.as_ref()
    }

    pub fn start(&mut self) {
        if self.running {
            return;
        }
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        match engine.start() {
            Ok(()) => {
                self.running = true;
                tracing::debug!("ambient bed started");
            }
            Err(e) => tracing::warn!(error = %e, "failed to start ambient bed"),
        }
    }

    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        // Marked stopped even on failure: the sources are single-use either way.
        self.running = false;
        if let Some(engine) = self.engine.as_mut() {
            match engine.stop() {
                Ok(()) => tracing::debug!("ambient bed stopped"),
                Err(e) => tracing::warn!(error = %e, "failed to stop ambient bed"),
            }
        }
    }

    /// Apply a user volume (0.0 to 1.0).
    pub fn set_volume(&mut self, volume: f32) {
        let gain = volume.clamp(0.0, 1.0) * self.attenuation;
        if let Some(engine) = self.engine.as_mut() {
            if let Err(e) = engine.set_gain(gain) {
                tracing::warn!(error = %e, "failed to set ambient gain");
            }
        }
    }
}
