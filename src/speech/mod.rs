//! Speech-synthesis collaborator contract.
//!
//! The playback state machine drives a [`SpeechEngine`] and reacts to the
//! [`EngineEvent`]s it emits. Engines are injectable so the state machine
//! can be tested against a recording fake instead of a real synthesizer.

use serde::Serialize;
use thiserror::Error;

pub mod piper;

#[cfg(test)]
pub mod mock;

/// One available synthesis voice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Voice {
    pub name: String,
    pub locale: String,
}

/// Correlates engine completion signals with the utterance they belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct UtteranceId(pub u64);

/// One request to vocalize a text with a voice and prosody parameters.
/// Owned by the playback controller for a single play cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub id: UtteranceId,
    pub text: String,
    pub voice: Voice,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
}

impl Utterance {
    pub fn new(id: UtteranceId, text: String, voice: Voice) -> Self {
        Self {
            id,
            text,
            voice,
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
        }
    }
}

/// Asynchronous signals from the engine, delivered over an mpsc channel and
/// drained by the shell loop between commands.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The available voice list changed; carries the full new list. An
    /// empty list is a legitimate transient state during engine startup.
    VoicesChanged(Vec<Voice>),
    Started(UtteranceId),
    Finished(UtteranceId),
    Errored { id: UtteranceId, message: String },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("voice model not found for '{0}'")]
    VoiceNotFound(String),
    #[error("failed to spawn synthesis process: {0}")]
    Spawn(String),
    #[error("synthesis process exited with status {status}: {stderr}")]
    Synthesis { status: i32, stderr: String },
    #[error("audio output unavailable: {0}")]
    Output(String),
}

/// Narrow contract the playback controller depends on. Cancellation is
/// synchronous from the caller's perspective; completion arrives later as
/// an [`EngineEvent`].
pub trait SpeechEngine: Send {
    /// Starts speaking the utterance, replacing anything currently active.
    fn speak(&mut self, utterance: &Utterance) -> Result<(), EngineError>;
    /// Suspends the active utterance. No-op when nothing is active.
    fn pause(&mut self);
    /// Resumes a suspended utterance. No-op when nothing is suspended.
    fn resume(&mut self);
    /// Cancels the active utterance, if any.
    fn cancel(&mut self);
    /// Asks the engine to (re)publish its voice list as a
    /// [`EngineEvent::VoicesChanged`] signal.
    fn request_voice_list(&mut self);
}
