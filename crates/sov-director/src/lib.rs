//! Event direction for Sovereign.
//!
//! Each turn the [`Director`] narrows the catalog to feasible events, lets an
//! optional [`NarrativeScorer`] pick among a sample of them, and falls back to
//! a deterministic drama ranking whenever the scorer is missing or fails.
//! [`ReignSession`] wraps the director and a reign into the interface a
//! front end drives.

/// Chronicle export.
pub mod chronicle;
/// Director and session configuration.
pub mod config;
/// Event selection.
pub mod director;
/// Error types used throughout the crate.
pub mod error;
/// The rules layer.
pub mod filter;
/// The drama fallback.
pub mod ranker;
/// Narrative scorers.
pub mod scorer;
/// Interactive reign sessions.
pub mod session;

pub use chronicle::{Chronicle, ReignSummary};
pub use config::{DirectorConfig, SessionConfig};
pub use director::{Director, DirectorMode, DirectorStats, Selection, SelectionMethod};
pub use error::{DirectorError, DirectorResult};
pub use filter::{FeasibilityFilter, Rejection};
pub use scorer::{LlmScorer, NarrativeScorer, OllamaBackend, ScorerError};
pub use session::{ReignEnd, ReignOutcome, ReignSession};
