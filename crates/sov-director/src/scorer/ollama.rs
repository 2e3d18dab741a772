//! Completion backend for an Ollama server.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::llm::{BackendError, CompletionBackend, CompletionRequest};

/// Default Ollama base URL.
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Default model for Ollama.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions<'a>,
}

#[derive(Debug, Serialize)]
struct GenerateOptions<'a> {
    num_predict: u32,
    temperature: f32,
    stop: &'a [String],
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Talks to Ollama's `/api/generate` endpoint.
///
/// Availability is checked once, at construction, against `/api/tags`.
pub struct OllamaBackend {
    client: Client,
    base_url: String,
    model: String,
    available: bool,
}

impl OllamaBackend {
    /// Connect to `base_url` and check that it answers.
    pub fn new(base_url: &str, model: &str) -> Self {
        let client = Client::new();
        let base_url = base_url.trim_end_matches('/').to_string();
        let available = answers(&client, &base_url);
        if available {
            info!(%base_url, model, "ollama backend available");
        } else {
            warn!(%base_url, "ollama not reachable, narrative scoring disabled");
        }
        Self {
            client,
            base_url,
            model: model.to_string(),
            available,
        }
    }

    /// Create a backend from environment variables.
    ///
    /// Uses `OLLAMA_BASE_URL` and `OLLAMA_MODEL`, falling back to defaults if
    /// not set.
    pub fn from_env() -> Self {
        let base_url = std::env::var("OLLAMA_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_OLLAMA_BASE_URL.to_string());
        let model =
            std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| DEFAULT_OLLAMA_MODEL.to_string());
        Self::new(&base_url, &model)
    }

    /// The model name requested.
    pub fn model(&self) -> &str {
        &self.model
    }
}

fn answers(client: &Client, base_url: &str) -> bool {
    client
        .get(format!("{base_url}/api/tags"))
        .timeout(HEALTH_CHECK_TIMEOUT)
        .send()
        .is_ok_and(|r| r.status().is_success())
}

fn request_body<'a>(model: &'a str, request: &'a CompletionRequest) -> GenerateRequest<'a> {
    GenerateRequest {
        model,
        prompt: &request.prompt,
        stream: false,
        options: GenerateOptions {
            num_predict: request.max_tokens,
            temperature: request.temperature,
            stop: &request.stop,
        },
    }
}

impl CompletionBackend for OllamaBackend {
    fn name(&self) -> &str {
        "ollama"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    fn complete(&self, request: &CompletionRequest) -> Result<String, BackendError> {
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request_body(&self.model, request))
            // Ends the request when the scorer stops waiting.
            .timeout(request.timeout)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    BackendError::Unreachable(e.to_string())
                } else {
                    BackendError::Failed(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(BackendError::Failed(format!("{status}: {body}")));
        }

        // The deadline covers reading the body as well.
        let body: GenerateResponse = response
            .json()
            .map_err(|e| BackendError::Failed(e.to_string()))?;
        Ok(body.response)
    }
}
