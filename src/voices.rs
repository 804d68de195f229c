use log::{info, warn};
use parking_lot::RwLock;
use thiserror::Error;

use crate::speech::Voice;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum VoiceError {
    #[error("no synthesis voices available")]
    NoVoicesAvailable,
}

/// Cache of the voices the engine currently offers, replaced wholesale on
/// every `VoicesChanged` signal. An empty refresh is a valid transient
/// state while the engine is still starting up.
#[derive(Default)]
pub struct VoiceRegistry {
    voices: RwLock<Vec<Voice>>,
}

impl VoiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the cached list in full.
    pub fn refresh(&self, voices: Vec<Voice>) {
        info!("voice list refreshed: {} voice(s)", voices.len());
        *self.voices.write() = voices;
    }

    /// Snapshot of the cached voices, in registry order.
    pub fn list(&self) -> Vec<Voice> {
        self.voices.read().clone()
    }

    /// Resolves a voice by exact name, falling back to the first available
    /// voice when the name is unknown.
    pub fn resolve(&self, name: &str) -> Result<Voice, VoiceError> {
        let voices = self.voices.read();
        if let Some(voice) = voices.iter().find(|voice| voice.name == name) {
            return Ok(voice.clone());
        }
        let fallback = voices.first().cloned().ok_or(VoiceError::NoVoicesAvailable)?;
        warn!("voice '{name}' not available, falling back to '{}'", fallback.name);
        Ok(fallback)
    }

    /// First available voice, used when no voice was ever selected.
    pub fn default_voice(&self) -> Result<Voice, VoiceError> {
        self.voices
            .read()
            .first()
            .cloned()
            .ok_or(VoiceError::NoVoicesAvailable)
    }
}
