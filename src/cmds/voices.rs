//! Voice commands: list the registry and pick the reading voice.

use crate::session::ReaderSession;
use crate::speech::Voice;

use super::CommandError;

pub fn list_voices(session: &ReaderSession) -> Vec<Voice> {
    session.voices()
}

/// Selects the voice used by subsequent `play` commands. Unknown names
/// resolve to the registry fallback; the resolved voice is returned so the
/// shell can show what actually stuck.
pub fn select_voice(session: &ReaderSession, name: &str) -> Result<Voice, CommandError> {
    session.select_voice(name).map_err(Into::into)
}
