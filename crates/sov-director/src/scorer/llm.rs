//! A scorer backed by a text-completion model.

use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use sov_core::{Event, EventId, ReignState, StatusTagRule, TagSet, status_tags};
use thiserror::Error;
use tracing::{debug, warn};

use super::prompt::{build_prompt, extract_decision};
use super::{NarrativeScorer, ScorerError};

/// Room for a short line of reasoning before the choice.
const MAX_TOKENS: u32 = 150;
/// Low temperature keeps the model on-format.
const TEMPERATURE: f32 = 0.3;
const STOP_SEQUENCES: [&str; 3] = ["###", "Human:", "User:"];
/// Deadline for requests built outside a scorer.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// A single completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Full prompt text.
    pub prompt: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Generation stops at any of these.
    pub stop: Vec<String>,
    /// The caller stops waiting after this long, so the backend must give up
    /// by then too.
    pub timeout: Duration,
}

impl CompletionRequest {
    /// A request with the director's sampling settings.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            stop: STOP_SEQUENCES.iter().map(|s| s.to_string()).collect(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set the deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Failure reported by a completion backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The model server cannot be reached at all.
    #[error("backend unreachable: {0}")]
    Unreachable(String),
    /// The server answered, but not with a completion.
    #[error("completion failed: {0}")]
    Failed(String),
}

/// A text-completion model.
pub trait CompletionBackend: Send + Sync {
    /// Human-readable name, for logs.
    fn name(&self) -> &str;

    /// Whether the model can currently be called.
    fn is_available(&self) -> bool;

    /// Complete `request.prompt`. May block, but must return once
    /// `request.timeout` has elapsed.
    fn complete(&self, request: &CompletionRequest) -> Result<String, BackendError>;
}

/// [`NarrativeScorer`] that asks a completion model to choose.
///
/// Each call runs on its own worker thread. The timeout is passed down to the
/// backend, which cancels its request when it expires; an answer that still
/// arrives late is discarded.
pub struct LlmScorer {
    backend: Arc<dyn CompletionBackend>,
    timeout: Duration,
    status_rules: Vec<StatusTagRule>,
}

impl LlmScorer {
    /// Wrap `backend`, waiting at most `timeout` per decision.
    pub fn new(backend: Arc<dyn CompletionBackend>, timeout: Duration) -> Self {
        Self {
            backend,
            timeout,
            status_rules: sov_core::tag::default_status_rules(),
        }
    }

    /// Use these status tag rules when describing the ruler.
    pub fn with_status_rules(mut self, rules: Vec<StatusTagRule>) -> Self {
        self.status_rules = rules;
        self
    }

    fn reputation(&self, state: &ReignState) -> TagSet {
        let mut tags = state.tags().clone();
        tags.extend(status_tags(&self.status_rules, state.resources()));
        tags
    }

    fn call_backend(&self, request: CompletionRequest) -> Result<String, ScorerError> {
        let (tx, rx) = mpsc::channel();
        let backend = Arc::clone(&self.backend);
        thread::Builder::new()
            .name("sov-scorer".to_string())
            .spawn(move || {
                // The receiver is gone if we already timed out.
                let _ = tx.send(backend.complete(&request));
            })
            .map_err(|e| ScorerError::Unavailable(e.to_string()))?;

        match rx.recv_timeout(self.timeout) {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(BackendError::Unreachable(msg))) => Err(ScorerError::Disconnected(msg)),
            Ok(Err(BackendError::Failed(msg))) => Err(ScorerError::Unavailable(msg)),
            Err(RecvTimeoutError::Timeout) => Err(ScorerError::Timeout),
            Err(RecvTimeoutError::Disconnected) => Err(ScorerError::Unavailable(
                "scorer worker exited without answering".to_string(),
            )),
        }
    }
}

impl NarrativeScorer for LlmScorer {
    fn name(&self) -> &str {
        self.backend.name()
    }

    fn is_available(&self) -> bool {
        self.backend.is_available()
    }

    fn select_event(
        &self,
        candidates: &[&Event],
        state: &ReignState,
    ) -> Result<EventId, ScorerError> {
        if candidates.is_empty() {
            return Err(ScorerError::Unavailable("no candidates".to_string()));
        }
        let prompt = build_prompt(candidates, state, &self.reputation(state));
        let text = self.call_backend(CompletionRequest::new(prompt).with_timeout(self.timeout))?;
        debug!(backend = self.backend.name(), answer = text.trim(), "scorer answered");

        extract_decision(&text, candidates.len())
            .and_then(|i| candidates.get(i))
            .map(|event| event.id.clone())
            .ok_or_else(|| {
                warn!(answer = text.trim(), "scorer answer names no candidate");
                ScorerError::Unparseable(text.trim().to_string())
            })
    }
}
