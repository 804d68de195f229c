use crate::playback::PlaybackState;
use crate::session::ReaderSession;

use super::CommandError;

/// Reads the current page aloud with the selected voice.
pub fn play(session: &ReaderSession) -> Result<PlaybackState, CommandError> {
    session.play()?;
    Ok(session.playback_state())
}

pub fn pause(session: &ReaderSession) -> Result<PlaybackState, CommandError> {
    session.pause().map_err(Into::into)
}

pub fn resume(session: &ReaderSession) -> Result<PlaybackState, CommandError> {
    session.resume().map_err(Into::into)
}

pub fn stop(session: &ReaderSession) -> Result<PlaybackState, CommandError> {
    session.stop().map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{ExtractError, ExtractedPages, PageExtractor};
    use crate::speech::mock::RecordingEngine;
    use crate::speech::{EngineEvent, Voice};

    struct OnePage;
    struct Page;

    impl PageExtractor for OnePage {
        fn open(&self, _bytes: &[u8]) -> Result<Box<dyn ExtractedPages>, ExtractError> {
            Ok(Box::new(Page))
        }
    }

    impl ExtractedPages for Page {
        fn page_count(&self) -> usize {
            1
        }

        fn fragments(&self, _page: usize) -> Result<Vec<String>, ExtractError> {
            Ok(vec!["readable page text".to_string()])
        }
    }

    fn ready_session() -> ReaderSession {
        let (engine, _) = RecordingEngine::new();
        let session = ReaderSession::new(Box::new(engine), Box::new(OnePage));
        session.handle_event(EngineEvent::VoicesChanged(vec![Voice {
            name: "Alex".to_string(),
            locale: "en-US".to_string(),
        }]));
        session.load(b"%PDF-", "book.pdf").unwrap();
        session
    }

    #[test]
    fn full_control_cycle() {
        let session = ready_session();
        assert_eq!(play(&session).unwrap(), PlaybackState::Speaking);
        assert_eq!(pause(&session).unwrap(), PlaybackState::Paused);
        assert_eq!(resume(&session).unwrap(), PlaybackState::Speaking);
        assert_eq!(stop(&session).unwrap(), PlaybackState::Idle);
    }

    #[test]
    fn play_before_load_maps_to_no_document() {
        let (engine, _) = RecordingEngine::new();
        let session = ReaderSession::new(Box::new(engine), Box::new(OnePage));
        let error = play(&session).unwrap_err();
        assert_eq!(error.code, super::super::ERROR_NO_DOCUMENT);
    }
}
