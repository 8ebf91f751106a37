//! Model Backend
//!
//! The external language-model collaborator behind the enrichment
//! pipeline. The contract is deliberately small: a prompt goes in as
//! either a flat instruction string or role-tagged chat turns, text comes
//! back, and every failure is opaque to the caller, which retries with a
//! fixed sleep and no backoff.
//!
//! Retry outcomes are reported structurally via [`CallReport`] rather
//! than printed, so the caller decides on logging verbosity.

pub mod openai;

use std::thread;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

pub use openai::OpenAiBackend;

/// One role-tagged turn of a chat-style prompt.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Prompt payload: completion-style or chat-style transport.
#[derive(Debug, Clone)]
pub enum PromptPayload {
    /// Flat instruction string for a completions endpoint
    Instruct(String),
    /// Role-tagged turns for a chat endpoint
    Chat(Vec<ChatMessage>),
}

/// Backend failures. All of them are retriable from the caller's point
/// of view; none are retried by the backend itself.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("Backend '{backend}' is not configured")]
    NotConfigured { backend: String },

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed response: {message}")]
    Malformed { message: String },
}

/// A language-model backend.
pub trait LlmBackend {
    /// Backend name for diagnostics
    fn name(&self) -> &str;

    /// Whether the backend is ready to accept calls
    fn is_available(&self) -> bool;

    /// Send one prompt; a single attempt, no internal retries.
    fn send(&self, prompt: &PromptPayload, temperature: f32) -> Result<String, BackendError>;
}

/// Structured record of a retried call.
#[derive(Debug)]
pub struct CallReport {
    /// Attempts actually made (1-based; 0 only if max_attempts was 0)
    pub attempts_used: usize,

    /// The last failure, if every attempt failed
    pub last_error: Option<BackendError>,
}

/// Call a backend with a bounded number of attempts and a fixed sleep
/// between them. Returns the first successful reply together with the
/// attempt count, or `None` plus the last error once attempts run out.
pub fn call_with_retry(
    backend: &dyn LlmBackend,
    prompt: &PromptPayload,
    temperature: f32,
    max_attempts: usize,
    retry_delay: Duration,
) -> (Option<String>, CallReport) {
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        match backend.send(prompt, temperature) {
            Ok(text) => {
                return (
                    Some(text),
                    CallReport {
                        attempts_used: attempt,
                        last_error: None,
                    },
                )
            }
            Err(e) => {
                last_error = Some(e);
                if attempt < max_attempts {
                    thread::sleep(retry_delay);
                }
            }
        }
    }

    (
        None,
        CallReport {
            attempts_used: max_attempts,
            last_error,
        },
    )
}
