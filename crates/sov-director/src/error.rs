//! Error types for event direction and reign sessions.

use sov_core::SovError;
use thiserror::Error;

/// Result type for director and session operations.
pub type DirectorResult<T> = Result<T, DirectorError>;

/// Errors that can occur while directing a reign.
#[derive(Debug, Error)]
pub enum DirectorError {
    /// No event is feasible and no last-resort event is configured. This is
    /// a content gap, not the end of the reign.
    #[error("no feasible event in year {year}")]
    NoFeasibleEvent {
        /// The year the draw was attempted.
        year: u32,
    },

    /// A decision was submitted with no event awaiting one.
    #[error("no event is awaiting a decision")]
    NoPendingEvent,

    /// The reign model rejected the action. State is unchanged.
    #[error(transparent)]
    Rejected(#[from] SovError),

    /// Malformed session configuration.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// Configuration file could not be read.
    #[error("{path}: {source}")]
    Io {
        /// The file involved.
        path: String,
        /// The underlying error.
        source: std::io::Error,
    },
}

impl DirectorError {
    /// Whether the player can simply try something else.
    pub fn is_rejection(&self) -> bool {
        matches!(self, DirectorError::Rejected(e) if e.is_state_error())
            || matches!(self, DirectorError::NoPendingEvent)
    }
}
