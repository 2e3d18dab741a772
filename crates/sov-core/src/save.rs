//! Versioned JSON save files.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SovError, SovResult};
use crate::event::EventId;
use crate::state::ReignState;

/// Save format written by this build.
pub const SAVE_FORMAT_VERSION: u32 = 1;

/// A reign frozen to disk, with the event awaiting a decision (if any).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveGame {
    /// Format version; loading rejects anything else.
    pub format_version: u32,
    /// When the save was written.
    pub saved_at: DateTime<Utc>,
    /// The reign.
    pub state: ReignState,
    /// Event presented but not yet resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_event: Option<EventId>,
}

impl SaveGame {
    /// Wrap a state, stamped now.
    pub fn new(state: ReignState, pending_event: Option<EventId>) -> Self {
        Self {
            format_version: SAVE_FORMAT_VERSION,
            saved_at: Utc::now(),
            state,
            pending_event,
        }
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> SovResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and version-check a save.
    pub fn from_json(json: &str) -> SovResult<Self> {
        let save: SaveGame = serde_json::from_str(json)?;
        if save.format_version != SAVE_FORMAT_VERSION {
            return Err(SovError::UnsupportedSaveVersion {
                found: save.format_version,
                expected: SAVE_FORMAT_VERSION,
            });
        }
        Ok(save)
    }

    /// Write to `path`.
    pub fn write(&self, path: &Path) -> SovResult<()> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(|source| SovError::Io {
            path: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), year = self.state.year(), "game saved");
        Ok(())
    }

    /// Read from `path`.
    pub fn read(path: &Path) -> SovResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| SovError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }
}
