//! One reading session: a page store, a playback controller, and a voice
//! registry behind per-component locks, with the cross-component rules
//! enforced in one place.
//!
//! Rules: loading a document stops any in-flight utterance before the old
//! pages are replaced; every successful page move stops playback (the text
//! underneath it changed); commands that catch a load in flight are
//! rejected with [`SessionError::DocumentNotReady`].

use log::info;
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use thiserror::Error;

use crate::document::{DocumentIngestor, IngestError};
use crate::extract::PageExtractor;
use crate::playback::{PlaybackController, PlaybackError, PlaybackState};
use crate::speech::{EngineEvent, SpeechEngine, Voice};
use crate::store::{PageStore, StoreError};
use crate::voices::{VoiceError, VoiceRegistry};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Playback(#[from] PlaybackError),
    #[error(transparent)]
    Voice(#[from] VoiceError),
    #[error("a document is still loading")]
    DocumentNotReady,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Empty,
    Loading,
    Ready,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    pub title: String,
    pub pages: usize,
}

pub struct ReaderSession {
    ingestor: DocumentIngestor,
    store: Mutex<PageStore>,
    playback: Mutex<PlaybackController>,
    voices: VoiceRegistry,
    selected_voice: Mutex<Option<String>>,
    phase: RwLock<SessionPhase>,
}

impl ReaderSession {
    pub fn new(engine: Box<dyn SpeechEngine>, extractor: Box<dyn PageExtractor>) -> Self {
        Self {
            ingestor: DocumentIngestor::new(extractor),
            store: Mutex::new(PageStore::new()),
            playback: Mutex::new(PlaybackController::new(engine)),
            voices: VoiceRegistry::new(),
            selected_voice: Mutex::new(None),
            phase: RwLock::new(SessionPhase::Empty),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        *self.phase.read()
    }

    /// Ingests and installs a new document. On success the previous
    /// document is replaced in full and the pointer rests on page 1; on
    /// failure the previous document and phase are untouched.
    pub fn load(&self, bytes: &[u8], filename: &str) -> Result<DocumentSummary, SessionError> {
        let previous = {
            let mut phase = self.phase.write();
            if *phase == SessionPhase::Loading {
                return Err(SessionError::DocumentNotReady);
            }
            let previous = *phase;
            *phase = SessionPhase::Loading;
            previous
        };

        // Extraction runs with no component lock held; concurrent commands
        // observe the Loading phase instead of racing the install.
        match self.ingestor.ingest(bytes, filename) {
            Ok(document) => {
                let summary = DocumentSummary {
                    title: document.title().to_string(),
                    pages: document.page_count(),
                };
                let mut phase = self.phase.write();
                // The running utterance refers to now-stale text.
                self.playback.lock().stop();
                self.store.lock().load(document);
                *phase = SessionPhase::Ready;
                info!("session ready: '{}' ({} pages)", summary.title, summary.pages);
                Ok(summary)
            }
            Err(err) => {
                *self.phase.write() = previous;
                Err(err.into())
            }
        }
    }

    pub fn next(&self) -> Result<bool, SessionError> {
        let _phase = self.read_phase_checked()?;
        let moved = self.store.lock().next()?;
        if moved {
            self.playback.lock().stop();
        }
        Ok(moved)
    }

    pub fn prev(&self) -> Result<bool, SessionError> {
        let _phase = self.read_phase_checked()?;
        let moved = self.store.lock().prev()?;
        if moved {
            self.playback.lock().stop();
        }
        Ok(moved)
    }

    pub fn current_text(&self) -> Result<String, SessionError> {
        let _phase = self.read_phase_checked()?;
        Ok(self.store.lock().current_text()?.to_string())
    }

    /// `(current page, page count)` when a document is loaded.
    pub fn position(&self) -> Option<(usize, usize)> {
        self.store.lock().position()
    }

    /// Reads the current page aloud with the selected voice, superseding
    /// any active utterance.
    pub fn play(&self) -> Result<(), SessionError> {
        let _phase = self.read_phase_checked()?;
        let text = self.store.lock().current_text()?.to_string();
        let voice = self.playback_voice()?;
        self.playback.lock().play(&text, voice)?;
        Ok(())
    }

    pub fn pause(&self) -> Result<PlaybackState, SessionError> {
        let _phase = self.read_phase_checked()?;
        Ok(self.playback.lock().pause())
    }

    pub fn resume(&self) -> Result<PlaybackState, SessionError> {
        let _phase = self.read_phase_checked()?;
        Ok(self.playback.lock().resume())
    }

    pub fn stop(&self) -> Result<PlaybackState, SessionError> {
        let _phase = self.read_phase_checked()?;
        Ok(self.playback.lock().stop())
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.playback.lock().state()
    }

    /// Remembers a voice for subsequent `play` calls. Unknown names resolve
    /// to the registry fallback, and the resolved voice is what sticks.
    pub fn select_voice(&self, name: &str) -> Result<Voice, SessionError> {
        let voice = self.voices.resolve(name)?;
        *self.selected_voice.lock() = Some(voice.name.clone());
        info!("selected voice '{}'", voice.name);
        Ok(voice)
    }

    pub fn voices(&self) -> Vec<Voice> {
        self.voices.list()
    }

    /// Asks the engine for a fresh voice list; the result arrives as a
    /// `VoicesChanged` signal.
    pub fn refresh_voices(&self) {
        self.playback.lock().request_voice_list();
    }

    /// Routes an engine signal to the component that owns its state.
    pub fn handle_event(&self, event: EngineEvent) {
        match event {
            EngineEvent::VoicesChanged(voices) => self.voices.refresh(voices),
            other => self.playback.lock().handle_event(&other),
        }
    }

    fn playback_voice(&self) -> Result<Voice, VoiceError> {
        let selected = self.selected_voice.lock();
        match selected.as_deref() {
            Some(name) => self.voices.resolve(name),
            None => self.voices.default_voice(),
        }
    }

    /// Holds a phase read guard for the duration of the calling command so
    /// a concurrent load cannot install underneath it.
    fn read_phase_checked(
        &self,
    ) -> Result<parking_lot::RwLockReadGuard<'_, SessionPhase>, SessionError> {
        let phase = self.phase.read();
        if *phase == SessionPhase::Loading {
            return Err(SessionError::DocumentNotReady);
        }
        Ok(phase)
    }
}
