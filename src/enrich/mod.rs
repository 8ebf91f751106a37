//! Seed Enrichment Pipeline
//!
//! The deterministic pipeline around the external model collaborator:
//!
//! ```text
//! seed dir -> extract -> missing -> combine/sample
//!                                        |
//!                          per variant:  v
//!              prompt -> model call -> reconcile -> validate -> normalize
//! ```
//!
//! Each stage is a small, independently testable module. The model call
//! itself lives in [`crate::backend`]; everything here is pure text and
//! set computation.

pub mod combine;
pub mod extract;
pub mod missing;
pub mod normalize;
pub mod prompt;
pub mod reconcile;
pub mod validate;

use std::path::PathBuf;

use thiserror::Error;

use crate::backend::{BackendError, CallReport};

/// Placeholder tokens the model must never emit. Prompts forbid them,
/// the reconciler drops lines led by them, and the validator rejects any
/// candidate still carrying one.
pub const PLACEHOLDER_TOKENS: [&str; 4] = ["COMMAND", "RESPONSE", "PARAMETER", "VALUE"];

/// One enrichment attempt for a seed, targeting a specific subset of
/// missing message types. Created by the sampler, consumed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantRequest {
    /// Seed file this variant enriches
    pub seed_path: PathBuf,

    /// Missing message types this variant asks the model to insert
    pub target_subset: Vec<String>,

    /// Index of this variant among the seed's variants (0-based)
    pub attempt_index: usize,
}

/// Terminal state of one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeState {
    /// Reconciled text passed validation and was persisted
    Accepted,
    /// Reconciled text was present but failed validation
    Rejected,
    /// No usable model response (transport failure, malformed reply,
    /// or reconciliation produced nothing)
    Failed,
}

/// Result of processing one variant end to end.
#[derive(Debug)]
pub struct EnrichmentOutcome {
    pub request: VariantRequest,

    /// Attempts made and the last transport error, if any
    pub call: CallReport,

    /// Raw model reply, if any attempt produced one
    pub raw_model_text: Option<String>,

    /// Cleaned candidate sequence, if reconciliation produced one
    pub reconciled_text: Option<String>,

    pub state: OutcomeState,
}

impl EnrichmentOutcome {
    pub fn accepted(&self) -> bool {
        self.state == OutcomeState::Accepted
    }
}

/// Enrichment pipeline errors.
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("Unsupported protocol: {0}")]
    UnsupportedProtocol(String),

    #[error("Seed directory not found: {0}")]
    SeedDirNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}
