//! Batch Orchestrator
//!
//! Drives the enrichment pipeline over a directory of seeds: per-seed
//! missing-type resolution, variant sampling, one model call per variant
//! with bounded retries, reconciliation, validation, normalization, and
//! persistence under deterministic names. A single variant's failure
//! never aborts the batch; every failure increments exactly one counter.
//!
//! Everything runs strictly sequentially: one seed, one variant, one
//! model call in flight at a time.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use crate::backend::{call_with_retry, ChatMessage, LlmBackend, PromptPayload};
use crate::config::ProseedsConfig;
use crate::enrich::{
    combine, extract, missing, normalize, prompt::PromptSynthesizer, reconcile, validate,
    EnrichError, EnrichmentOutcome, OutcomeState, VariantRequest,
};
use crate::protocol;

/// Orchestrator settings, typically derived from [`ProseedsConfig`].
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub protocol: String,
    pub seed_dir: PathBuf,
    pub output_dir: PathBuf,

    /// Chat transport instead of completion-style
    pub chat_mode: bool,

    pub temperature: f32,
    pub max_tokens: usize,
    pub safety_margin_tokens: usize,

    pub max_corpus_sample: usize,
    pub max_subset_size: usize,
    pub variants_per_seed: usize,

    pub retries: usize,
    pub retry_delay: Duration,

    /// Fixed sampling seed; None draws from entropy
    pub rng_seed: Option<u64>,
}

impl BatchOptions {
    /// Derive orchestrator options from a loaded config.
    pub fn from_config(config: &ProseedsConfig) -> Self {
        Self {
            protocol: config.protocol.clone(),
            seed_dir: PathBuf::from(&config.paths.seed_dir),
            output_dir: config.output_dir(),
            chat_mode: config.model.mode.eq_ignore_ascii_case("chat"),
            temperature: config.model.temperature,
            max_tokens: config.model.max_tokens,
            safety_margin_tokens: config.advanced.safety_margin_tokens,
            max_corpus_sample: config.advanced.max_corpus_sample,
            max_subset_size: config.advanced.max_subset_size,
            variants_per_seed: config.advanced.variants_per_seed,
            retries: config.advanced.retries,
            retry_delay: Duration::from_secs(config.advanced.retry_delay_secs),
            rng_seed: config.advanced.rng_seed,
        }
    }
}

/// Aggregate counters for one run. Reproducible from the same inputs
/// modulo the collaborator's non-determinism and the sampler's draws.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Accepted and persisted variants
    pub success: usize,

    /// Seeds skipped because nothing was missing for them
    pub skip: usize,

    /// Failed variants plus unreadable/unwritable files
    pub fail: usize,

    /// Seed files considered
    pub total_seeds: usize,

    /// Where accepted variants were written
    pub output_dir: PathBuf,
}

impl std::fmt::Display for RunReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "success: {}, skip: {}, fail: {}, total seeds: {}, output: {}",
            self.success,
            self.skip,
            self.fail,
            self.total_seeds,
            self.output_dir.display()
        )
    }
}

/// Everything a run produced.
#[derive(Debug)]
pub struct BatchResult {
    /// Output file name -> accepted, normalized content
    pub outputs: BTreeMap<String, String>,

    /// Per-variant terminal states, for diagnostics
    pub outcomes: Vec<EnrichmentOutcome>,

    pub report: RunReport,
}

/// Sequential driver over a seed directory.
pub struct BatchOrchestrator<'a> {
    backend: &'a dyn LlmBackend,
    opts: BatchOptions,
    context_enricher: Option<Box<dyn Fn(&[String]) -> String>>,
}

impl<'a> BatchOrchestrator<'a> {
    pub fn new(backend: &'a dyn LlmBackend, opts: BatchOptions) -> Self {
        Self {
            backend,
            opts,
            context_enricher: None,
        }
    }

    /// Attach a context hook invoked once per variant with the target
    /// subset; its output is appended to the enrichment instruction.
    pub fn with_context_enricher(mut self, enricher: Box<dyn Fn(&[String]) -> String>) -> Self {
        self.context_enricher = Some(enricher);
        self
    }

    /// Run the batch.
    pub fn run(&self) -> Result<BatchResult, EnrichError> {
        let proto = protocol::lookup(&self.opts.protocol)
            .ok_or_else(|| EnrichError::UnsupportedProtocol(self.opts.protocol.clone()))?;
        let canonical = proto.canonical_types();

        if !self.opts.seed_dir.is_dir() {
            return Err(EnrichError::SeedDirNotFound(
                self.opts.seed_dir.display().to_string(),
            ));
        }

        let seed_files = list_seed_files(&self.opts.seed_dir)?;
        let total_seeds = seed_files.len();

        let mut outputs = BTreeMap::new();
        let mut outcomes = Vec::new();
        let mut report = RunReport {
            success: 0,
            skip: 0,
            fail: 0,
            total_seeds,
            output_dir: self.opts.output_dir.clone(),
        };

        // Corpus-wide pass over a bounded sample; unreadable seeds are
        // simply not part of the sample
        let sample_texts: Vec<String> = seed_files
            .iter()
            .take(self.opts.max_corpus_sample)
            .filter_map(|p| fs::read_to_string(p).ok())
            .collect();
        let corpus_missing = missing::corpus_missing(
            sample_texts.iter().map(|s| s.as_str()),
            &canonical,
            self.opts.max_corpus_sample,
        );

        // Already-complete corpus: terminate successfully with zero work
        if corpus_missing.is_empty() {
            return Ok(BatchResult {
                outputs,
                outcomes,
                report,
            });
        }

        fs::create_dir_all(&self.opts.output_dir)?;

        let mut rng = match self.opts.rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let synthesizer =
            PromptSynthesizer::new(self.opts.max_tokens, self.opts.safety_margin_tokens);

        for seed_path in &seed_files {
            let content = match fs::read_to_string(seed_path) {
                Ok(c) => c,
                Err(_) => {
                    report.fail += 1;
                    continue;
                }
            };

            let used = extract::used_types(&content, &canonical);
            let seed_missing = missing::seed_missing(&corpus_missing, &used);
            if seed_missing.is_empty() {
                report.skip += 1;
                continue;
            }

            let variants = combine::sample_variants(
                &seed_missing,
                self.opts.max_subset_size,
                self.opts.variants_per_seed,
                &mut rng,
            );
            let variant_count = variants.len();

            for (idx, subset) in variants.into_iter().enumerate() {
                let request = VariantRequest {
                    seed_path: seed_path.clone(),
                    target_subset: subset,
                    attempt_index: idx,
                };

                let outcome = self.enrich_variant(proto, &content, request, &synthesizer);

                if outcome.state == OutcomeState::Accepted {
                    let reconciled = outcome
                        .reconciled_text
                        .as_deref()
                        .unwrap_or_default();
                    let normalized = normalize::normalize_crlf(reconciled);
                    let name = output_name(seed_path, idx, variant_count);

                    match fs::write(self.opts.output_dir.join(&name), normalized.as_bytes()) {
                        Ok(()) => {
                            report.success += 1;
                            outputs.insert(name, normalized);
                        }
                        Err(_) => report.fail += 1,
                    }
                } else {
                    report.fail += 1;
                }

                outcomes.push(outcome);
            }
        }

        Ok(BatchResult {
            outputs,
            outcomes,
            report,
        })
    }

    /// Synthesize, call, reconcile, and validate one variant.
    fn enrich_variant(
        &self,
        proto: &protocol::ProtocolSpec,
        seed_content: &str,
        request: VariantRequest,
        synthesizer: &PromptSynthesizer,
    ) -> EnrichmentOutcome {
        let enricher = self.context_enricher.as_deref();
        let prompt_text = synthesizer.synthesize(
            proto.name,
            proto.exemplar,
            seed_content,
            &request.target_subset,
            enricher,
        );

        let payload = if self.opts.chat_mode {
            PromptPayload::Chat(vec![ChatMessage::user(prompt_text)])
        } else {
            PromptPayload::Instruct(prompt_text)
        };

        let (raw, call) = call_with_retry(
            self.backend,
            &payload,
            self.opts.temperature,
            self.opts.retries,
            self.opts.retry_delay,
        );

        let raw = match raw {
            Some(text) => text,
            None => {
                return EnrichmentOutcome {
                    request,
                    call,
                    raw_model_text: None,
                    reconciled_text: None,
                    state: OutcomeState::Failed,
                }
            }
        };

        let reconciled = reconcile::reconcile(&raw, proto.name);
        if reconciled.trim().is_empty() {
            return EnrichmentOutcome {
                request,
                call,
                raw_model_text: Some(raw),
                reconciled_text: None,
                state: OutcomeState::Failed,
            };
        }

        let state = match validate::validate(&reconciled, proto.name) {
            Ok(()) => OutcomeState::Accepted,
            Err(_) => OutcomeState::Rejected,
        };

        EnrichmentOutcome {
            request,
            call,
            raw_model_text: Some(raw),
            reconciled_text: Some(reconciled),
            state,
        }
    }
}

/// Top-level regular files, sorted by name for reproducible iteration.
fn list_seed_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// Deterministic output name: `enriched_<name>` for a single variant,
/// `enriched_<stem>_<index><ext>` when a seed has several.
fn output_name(seed_path: &Path, variant_index: usize, variant_count: usize) -> String {
    let file_name = seed_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "seed".to_string());

    if variant_count <= 1 {
        return format!("enriched_{}", file_name);
    }

    let stem = seed_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "seed".to_string());
    let ext = seed_path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    format!("enriched_{}_{}{}", stem, variant_index + 1, ext)
}
