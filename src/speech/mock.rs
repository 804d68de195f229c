//! Recording engine fake for state-machine tests.

use std::sync::Arc;

use parking_lot::Mutex;

use super::{EngineError, SpeechEngine, Utterance};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Speak { text: String, voice: String },
    Pause,
    Resume,
    Cancel,
    VoiceListRequested,
}

/// Records every call the controller makes; optionally fails `speak`.
pub struct RecordingEngine {
    calls: Arc<Mutex<Vec<EngineCall>>>,
    fail_speak: bool,
}

impl RecordingEngine {
    pub fn new() -> (Self, Arc<Mutex<Vec<EngineCall>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                calls: Arc::clone(&calls),
                fail_speak: false,
            },
            calls,
        )
    }

    pub fn failing() -> (Self, Arc<Mutex<Vec<EngineCall>>>) {
        let (mut engine, calls) = Self::new();
        engine.fail_speak = true;
        (engine, calls)
    }
}

impl SpeechEngine for RecordingEngine {
    fn speak(&mut self, utterance: &Utterance) -> Result<(), EngineError> {
        self.calls.lock().push(EngineCall::Speak {
            text: utterance.text.clone(),
            voice: utterance.voice.name.clone(),
        });
        if self.fail_speak {
            Err(EngineError::Spawn("mock refused to speak".to_string()))
        } else {
            Ok(())
        }
    }

    fn pause(&mut self) {
        self.calls.lock().push(EngineCall::Pause);
    }

    fn resume(&mut self) {
        self.calls.lock().push(EngineCall::Resume);
    }

    fn cancel(&mut self) {
        self.calls.lock().push(EngineCall::Cancel);
    }

    fn request_voice_list(&mut self) {
        self.calls.lock().push(EngineCall::VoiceListRequested);
    }
}
