//! The optional narrative layer: a scorer that picks the most fitting event.
//!
//! A scorer is a capability, not a requirement. The director asks
//! [`NarrativeScorer::is_available`] once and falls back to drama ranking for
//! any failure, so an absent or broken scorer never blocks a turn.

mod llm;
mod ollama;
mod prompt;

pub use llm::{BackendError, CompletionBackend, CompletionRequest, LlmScorer};
pub use ollama::{DEFAULT_OLLAMA_BASE_URL, DEFAULT_OLLAMA_MODEL, OllamaBackend};
pub use prompt::{Momentum, build_prompt, extract_decision, momentum};

use sov_core::{Event, EventId, ReignState};
use thiserror::Error;

/// Why a scorer produced no decision.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScorerError {
    /// The scorer cannot answer right now.
    #[error("scorer unavailable: {0}")]
    Unavailable(String),

    /// No answer within the time limit.
    #[error("scorer timed out")]
    Timeout,

    /// The resource behind the scorer is gone for good.
    #[error("scorer disconnected: {0}")]
    Disconnected(String),

    /// An answer arrived but named no candidate.
    #[error("unparseable scorer answer: {0:?}")]
    Unparseable(String),
}

/// Picks the narratively best event from a candidate list.
///
/// Implementations must not mutate anything they are shown; they only ever
/// receive shared references.
pub trait NarrativeScorer: Send + Sync {
    /// Human-readable name, for logs.
    fn name(&self) -> &str;

    /// Whether the scorer can currently answer.
    fn is_available(&self) -> bool;

    /// Choose one of `candidates`. Must return the id of an element of
    /// `candidates`.
    fn select_event(
        &self,
        candidates: &[&Event],
        state: &ReignState,
    ) -> Result<EventId, ScorerError>;
}
