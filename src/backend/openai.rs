//! OpenAI-Compatible Backend
//!
//! Talks to any OpenAI-compatible endpoint: the hosted API or a local
//! server such as Ollama's `/v1` shim. Completion-style prompts go to
//! `/completions`, chat-style prompts to `/chat/completions`.
//!
//! Real HTTP calls require the `llm-backends` feature; without it the
//! backend reports `NotConfigured` so the rest of the crate stays
//! testable offline.

use super::{BackendError, LlmBackend, PromptPayload};

/// Default endpoint for a local Ollama-style server.
pub const DEFAULT_LOCAL_URL: &str = "http://localhost:11434/v1";

/// Default hosted endpoint.
pub const DEFAULT_REMOTE_URL: &str = "https://api.openai.com/v1";

/// OpenAI-compatible HTTP backend.
pub struct OpenAiBackend {
    api_url: String,
    api_key: Option<String>,
    model: String,
    max_tokens: usize,
    // Only read when real HTTP calls are compiled in
    #[cfg_attr(not(feature = "llm-backends"), allow(dead_code))]
    timeout_secs: u64,
}

impl OpenAiBackend {
    /// Remote endpoint; the key falls back to `OPENAI_API_KEY`.
    pub fn remote(api_url: Option<String>, api_key: Option<String>, model: String) -> Self {
        Self {
            api_url: api_url.unwrap_or_else(|| DEFAULT_REMOTE_URL.to_string()),
            api_key: api_key.or_else(|| std::env::var("OPENAI_API_KEY").ok()),
            model,
            max_tokens: 2048,
            timeout_secs: 120,
        }
    }

    /// Local OpenAI-compatible endpoint; no key required.
    pub fn local(api_url: Option<String>, model: String) -> Self {
        Self {
            api_url: api_url.unwrap_or_else(|| DEFAULT_LOCAL_URL.to_string()),
            api_key: None,
            model,
            max_tokens: 2048,
            timeout_secs: 120,
        }
    }

    pub fn set_max_tokens(&mut self, max_tokens: usize) {
        self.max_tokens = max_tokens;
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    #[cfg(feature = "llm-backends")]
    fn call_api(&self, prompt: &PromptPayload, temperature: f32) -> Result<String, BackendError> {
        let client = ureq::AgentBuilder::new()
            .timeout(std::time::Duration::from_secs(self.timeout_secs))
            .build();

        let (url, body) = match prompt {
            PromptPayload::Instruct(text) => (
                format!("{}/completions", self.api_url),
                ureq::json!({
                    "model": self.model,
                    "prompt": text,
                    "max_tokens": self.max_tokens,
                    "temperature": temperature,
                }),
            ),
            PromptPayload::Chat(messages) => (
                format!("{}/chat/completions", self.api_url),
                ureq::json!({
                    "model": self.model,
                    "messages": messages,
                    "max_tokens": self.max_tokens,
                    "temperature": temperature,
                }),
            ),
        };

        let mut request = client.post(&url).set("content-type", "application/json");
        if let Some(key) = &self.api_key {
            request = request.set("authorization", &format!("Bearer {}", key));
        }

        let response = request.send_json(body).map_err(|e| match e {
            ureq::Error::Status(status, resp) => BackendError::Api {
                status,
                message: resp.into_string().unwrap_or_default(),
            },
            _ => BackendError::Network {
                message: e.to_string(),
            },
        })?;

        let body: serde_json::Value =
            response
                .into_json()
                .map_err(|e| BackendError::Malformed {
                    message: e.to_string(),
                })?;

        let answer = match prompt {
            PromptPayload::Instruct(_) => body["choices"][0]["text"].as_str(),
            PromptPayload::Chat(_) => body["choices"][0]["message"]["content"].as_str(),
        }
        .ok_or_else(|| BackendError::Malformed {
            message: "missing choices text in response".to_string(),
        })?;

        Ok(answer.trim().to_string())
    }

    #[cfg(not(feature = "llm-backends"))]
    fn call_api(&self, _prompt: &PromptPayload, _temperature: f32) -> Result<String, BackendError> {
        Err(BackendError::NotConfigured {
            backend: "openai".to_string(),
        })
    }
}

impl LlmBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    fn is_available(&self) -> bool {
        if !cfg!(feature = "llm-backends") {
            return false;
        }
        // Local endpoints need no key; remote ones do
        self.api_key.is_some() || self.api_url != DEFAULT_REMOTE_URL
    }

    fn send(&self, prompt: &PromptPayload, temperature: f32) -> Result<String, BackendError> {
        self.call_api(prompt, temperature)
    }
}
