//! Draft persistence for resumable wizard sessions.

use std::io;
use std::path::{Path, PathBuf};

use crate::wizard::session::WizardSession;

/// Where in-progress wizard drafts live between runs.
///
/// `load` hands back the raw JSON value so
/// [`WizardSession::restore`] decides whether the shape is still usable.
pub trait DraftStore {
    fn save(&self, session: &WizardSession) -> io::Result<()>;
    fn load(&self) -> io::Result<Option<serde_json::Value>>;
    fn clear(&self) -> io::Result<()>;
}

/// Draft persisted as a JSON file next to the user's config.
pub struct FileDraftStore {
    path: PathBuf,
}

impl FileDraftStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl DraftStore for FileDraftStore {
    fn save(&self, session: &WizardSession) -> io::Result<()> {
        let json = serde_json::to_string_pretty(session).map_err(io::Error::other)?;
        std::fs::write(&self.path, json)
    }

    fn load(&self) -> io::Result<Option<serde_json::Value>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        match serde_json::from_str(&contents) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                // a corrupt draft is abandoned, not fatal
                log::warn!("draft at {} is not valid JSON, ignoring: {e}", self.path.display());
                Ok(None)
            }
        }
    }

    fn clear(&self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// In-memory store for tests and embedders that manage persistence
/// themselves.
#[cfg(test)]
pub struct MemoryDraftStore {
    slot: std::sync::Mutex<Option<serde_json::Value>>,
}

#[cfg(test)]
impl MemoryDraftStore {
    pub fn new() -> Self {
        Self {
            slot: std::sync::Mutex::new(None),
        }
    }
}

#[cfg(test)]
impl DraftStore for MemoryDraftStore {
    fn save(&self, session: &WizardSession) -> io::Result<()> {
        let value = serde_json::to_value(session).map_err(io::Error::other)?;
        *self.slot.lock().unwrap() = Some(value);
        Ok(())
    }

    fn load(&self) -> io::Result<Option<serde_json::Value>> {
        Ok(self.slot.lock().unwrap().clone())
    }

    fn clear(&self) -> io::Result<()> {
        *self.slot.lock().unwrap() = None;
        Ok(())
    }
}
