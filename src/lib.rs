//! Proseeds - LLM-Guided Protocol Seed Enrichment
//!
//! Augments a corpus of protocol message sequences ("seeds") used to
//! drive a protocol fuzzer by inserting message types that are valid for
//! the protocol but absent from a given seed. The model call is an
//! external collaborator; everything around it is a deterministic
//! pipeline that computes what is missing, decides which subsets to
//! request per variant, bounds the prompt size, and reconciles the
//! unstructured reply back into a strictly sequence-shaped artifact.
//!
//! # Pipeline
//!
//! ```text
//! seed dir -> extract -> missing -> combine/sample
//!                                        |
//!                          per variant:  v
//!              prompt -> model call -> reconcile -> validate -> normalize
//!                                                                  |
//!                                          enriched_<seed> files <-+
//! ```
//!
//! # Example
//!
//! ```no_run
//! use proseeds::backend::OpenAiBackend;
//! use proseeds::batch::{BatchOptions, BatchOrchestrator};
//! use proseeds::config::ProseedsConfig;
//! use std::path::Path;
//!
//! let config = ProseedsConfig::load(Path::new("proseeds.toml"))?;
//! config.validate()?;
//! let backend = OpenAiBackend::local(None, config.model.name.clone());
//! let result = BatchOrchestrator::new(&backend, BatchOptions::from_config(&config)).run()?;
//! println!("{}", result.report);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Generated sequences are only syntactically plausible: the pipeline
//! guarantees protocol-line shape and the absence of generation
//! artifacts, not semantic correctness.

pub mod backend;
pub mod batch;
pub mod config;
pub mod enrich;
pub mod protocol;

pub use backend::{BackendError, CallReport, ChatMessage, LlmBackend, OpenAiBackend, PromptPayload};
pub use batch::{BatchOptions, BatchOrchestrator, BatchResult, RunReport};
pub use config::{ConfigError, ProseedsConfig};
pub use enrich::{EnrichError, EnrichmentOutcome, OutcomeState, VariantRequest};
pub use protocol::ProtocolSpec;
