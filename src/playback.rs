//! Playback state machine over the current page text.
//!
//! Owns the lifecycle of a single in-flight utterance. `play` always
//! supersedes whatever is active rather than queueing; the engine is told
//! to cancel before a replacement starts, so at most one utterance is ever
//! active.

use std::fmt;

use log::{debug, error, info};
use serde::Serialize;
use thiserror::Error;

use crate::speech::{EngineError, EngineEvent, SpeechEngine, Utterance, UtteranceId, Voice};

/// Minimum number of characters (after trimming) worth reading aloud.
const MIN_READABLE_CHARS: usize = 3;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("nothing readable in the current text")]
    EmptyText,
    #[error("speech engine failed: {0}")]
    Engine(#[from] EngineError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaybackState {
    Idle,
    Speaking,
    Paused,
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Speaking => "speaking",
            PlaybackState::Paused => "paused",
        };
        f.write_str(label)
    }
}

pub struct PlaybackController {
    engine: Box<dyn SpeechEngine>,
    state: PlaybackState,
    active: Option<UtteranceId>,
    next_id: u64,
}

impl PlaybackController {
    pub fn new(engine: Box<dyn SpeechEngine>) -> Self {
        Self {
            engine,
            state: PlaybackState::Idle,
            active: None,
            next_id: 0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Starts speaking `text` with `voice`, superseding any active
    /// utterance. Text with fewer than three characters after trimming is
    /// rejected without touching the engine or the current state.
    pub fn play(&mut self, text: &str, voice: Voice) -> Result<UtteranceId, PlaybackError> {
        if text.trim().chars().count() < MIN_READABLE_CHARS {
            return Err(PlaybackError::EmptyText);
        }

        // Clears the active utterance or any stray one left in the engine.
        self.engine.cancel();
        self.active = None;
        self.state = PlaybackState::Idle;

        let id = UtteranceId(self.next_id);
        self.next_id += 1;
        let utterance = Utterance::new(id, text.to_string(), voice);
        self.engine.speak(&utterance)?;

        info!("speaking utterance {id:?} ({} chars)", utterance.text.len());
        self.state = PlaybackState::Speaking;
        self.active = Some(id);
        Ok(id)
    }

    /// Suspends the active utterance. No-op unless speaking.
    pub fn pause(&mut self) -> PlaybackState {
        if self.state == PlaybackState::Speaking {
            self.engine.pause();
            self.state = PlaybackState::Paused;
        }
        self.state
    }

    /// Resumes a suspended utterance. No-op unless paused.
    pub fn resume(&mut self) -> PlaybackState {
        if self.state == PlaybackState::Paused {
            self.engine.resume();
            self.state = PlaybackState::Speaking;
        }
        self.state
    }

    /// Cancels the active utterance and returns to `Idle`. When already
    /// idle nothing is signalled to the engine.
    pub fn stop(&mut self) -> PlaybackState {
        if self.state != PlaybackState::Idle {
            self.engine.cancel();
            self.active = None;
            self.state = PlaybackState::Idle;
        }
        self.state
    }

    /// Asks the engine to republish its voice list; the new list arrives
    /// later as a `VoicesChanged` signal.
    pub fn request_voice_list(&mut self) {
        self.engine.request_voice_list();
    }

    /// Applies an engine completion signal. Signals for anything but the
    /// currently active utterance are stale (superseded or stopped) and are
    /// discarded.
    pub fn handle_event(&mut self, event: &EngineEvent) {
        match event {
            EngineEvent::Started(id) if self.active == Some(*id) => {
                debug!("utterance {id:?} started");
            }
            EngineEvent::Finished(id) if self.active == Some(*id) => {
                info!("utterance {id:?} finished");
                self.active = None;
                self.state = PlaybackState::Idle;
            }
            EngineEvent::Errored { id, message } if self.active == Some(*id) => {
                error!("utterance {id:?} failed: {message}");
                self.active = None;
                self.state = PlaybackState::Idle;
            }
            EngineEvent::VoicesChanged(_) => {}
            other => debug!("ignoring stale engine event {other:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::mock::{EngineCall, RecordingEngine};

    fn voice() -> Voice {
        Voice {
            name: "Alex".to_string(),
            locale: "en-US".to_string(),
        }
    }

    fn controller() -> (PlaybackController, std::sync::Arc<parking_lot::Mutex<Vec<EngineCall>>>) {
        let (engine, calls) = RecordingEngine::new();
        (PlaybackController::new(Box::new(engine)), calls)
    }

    #[test]
    fn starts_idle() {
        let (controller, _) = controller();
        assert_eq!(controller.state(), PlaybackState::Idle);
    }

    #[test]
    fn short_text_is_rejected_without_state_change() {
        let (mut controller, calls) = controller();
        let error = controller.play("ab", voice()).unwrap_err();
        assert!(matches!(error, PlaybackError::EmptyText));
        assert_eq!(controller.state(), PlaybackState::Idle);
        assert!(calls.lock().is_empty());
    }

    #[test]
    fn whitespace_padding_does_not_count_as_readable() {
        let (mut controller, calls) = controller();
        assert!(matches!(
            controller.play("   a \n ", voice()),
            Err(PlaybackError::EmptyText)
        ));
        assert!(calls.lock().is_empty());
    }

    #[test]
    fn play_cancels_strays_then_speaks() {
        let (mut controller, calls) = controller();
        controller.play("Hello world", voice()).unwrap();
        assert_eq!(controller.state(), PlaybackState::Speaking);
        assert_eq!(
            *calls.lock(),
            vec![
                EngineCall::Cancel,
                EngineCall::Speak {
                    text: "Hello world".to_string(),
                    voice: "Alex".to_string(),
                },
            ]
        );
    }

    #[test]
    fn play_supersedes_active_utterance() {
        let (mut controller, calls) = controller();
        let first = controller.play("First page", voice()).unwrap();
        let second = controller.play("Second page", voice()).unwrap();
        assert_ne!(first, second);
        assert_eq!(controller.state(), PlaybackState::Speaking);
        let calls = calls.lock();
        assert_eq!(
            *calls,
            vec![
                EngineCall::Cancel,
                EngineCall::Speak {
                    text: "First page".to_string(),
                    voice: "Alex".to_string(),
                },
                EngineCall::Cancel,
                EngineCall::Speak {
                    text: "Second page".to_string(),
                    voice: "Alex".to_string(),
                },
            ]
        );
    }

    #[test]
    fn pause_resume_cycle() {
        let (mut controller, calls) = controller();
        controller.play("Hello world", voice()).unwrap();
        assert_eq!(controller.pause(), PlaybackState::Paused);
        assert_eq!(controller.resume(), PlaybackState::Speaking);
        let calls = calls.lock();
        assert_eq!(calls[calls.len() - 2], EngineCall::Pause);
        assert_eq!(calls[calls.len() - 1], EngineCall::Resume);
    }

    #[test]
    fn pause_when_idle_is_a_noop() {
        let (mut controller, calls) = controller();
        assert_eq!(controller.pause(), PlaybackState::Idle);
        assert_eq!(controller.resume(), PlaybackState::Idle);
        assert!(calls.lock().is_empty());
    }

    #[test]
    fn resume_while_speaking_is_a_noop() {
        let (mut controller, calls) = controller();
        controller.play("Hello world", voice()).unwrap();
        assert_eq!(controller.resume(), PlaybackState::Speaking);
        assert!(!calls.lock().contains(&EngineCall::Resume));
    }

    #[test]
    fn play_from_paused_supersedes() {
        let (mut controller, _) = controller();
        controller.play("Hello world", voice()).unwrap();
        controller.pause();
        controller.play("Replacement", voice()).unwrap();
        assert_eq!(controller.state(), PlaybackState::Speaking);
    }

    #[test]
    fn stop_cancels_and_returns_to_idle() {
        let (mut controller, calls) = controller();
        controller.play("Hello world", voice()).unwrap();
        assert_eq!(controller.stop(), PlaybackState::Idle);
        assert_eq!(*calls.lock().last().unwrap(), EngineCall::Cancel);
    }

    #[test]
    fn stop_from_paused_returns_to_idle() {
        let (mut controller, _) = controller();
        controller.play("Hello world", voice()).unwrap();
        controller.pause();
        assert_eq!(controller.stop(), PlaybackState::Idle);
    }

    #[test]
    fn stop_when_idle_signals_nothing() {
        let (mut controller, calls) = controller();
        assert_eq!(controller.stop(), PlaybackState::Idle);
        assert!(calls.lock().is_empty());
    }

    #[test]
    fn play_then_stop_always_ends_idle() {
        let (mut controller, _) = controller();
        for _ in 0..3 {
            controller.play("Hello world", voice()).unwrap();
            controller.stop();
            assert_eq!(controller.state(), PlaybackState::Idle);
        }
    }

    #[test]
    fn finished_event_returns_to_idle() {
        let (mut controller, _) = controller();
        let id = controller.play("Hello world", voice()).unwrap();
        controller.handle_event(&EngineEvent::Finished(id));
        assert_eq!(controller.state(), PlaybackState::Idle);
    }

    #[test]
    fn stale_finished_event_is_discarded() {
        let (mut controller, _) = controller();
        let first = controller.play("First page", voice()).unwrap();
        controller.play("Second page", voice()).unwrap();
        controller.handle_event(&EngineEvent::Finished(first));
        assert_eq!(controller.state(), PlaybackState::Speaking);
    }

    #[test]
    fn finished_after_stop_is_discarded() {
        let (mut controller, _) = controller();
        let id = controller.play("Hello world", voice()).unwrap();
        controller.stop();
        controller.handle_event(&EngineEvent::Finished(id));
        assert_eq!(controller.state(), PlaybackState::Idle);
    }

    #[test]
    fn error_event_returns_to_idle() {
        let (mut controller, _) = controller();
        let id = controller.play("Hello world", voice()).unwrap();
        controller.handle_event(&EngineEvent::Errored {
            id,
            message: "device lost".to_string(),
        });
        assert_eq!(controller.state(), PlaybackState::Idle);
    }

    #[test]
    fn engine_failure_leaves_idle_with_no_active_utterance() {
        let (engine, calls) = RecordingEngine::failing();
        let mut controller = PlaybackController::new(Box::new(engine));
        let error = controller.play("Hello world", voice()).unwrap_err();
        assert!(matches!(error, PlaybackError::Engine(_)));
        assert_eq!(controller.state(), PlaybackState::Idle);
        // A later stop has nothing to cancel.
        let before = calls.lock().len();
        controller.stop();
        assert_eq!(calls.lock().len(), before);
    }
}
