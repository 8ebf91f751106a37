//! End-to-End Pipeline Tests
//!
//! Drive the batch orchestrator over real seed directories with scripted
//! model backends and check the on-disk results: accepted variants land
//! under deterministic names with CRLF framing, rejections and transport
//! failures count without aborting the batch, covered seeds are skipped.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use proseeds::{
    BackendError, BatchOptions, BatchOrchestrator, LlmBackend, OutcomeState, PromptPayload,
};

/// Replies with the same canned text on every call.
struct CannedBackend {
    reply: &'static str,
}

impl LlmBackend for CannedBackend {
    fn name(&self) -> &str {
        "canned"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn send(&self, _prompt: &PromptPayload, _temperature: f32) -> Result<String, BackendError> {
        Ok(self.reply.to_string())
    }
}

/// Fails every call with a transport error.
struct DownBackend;

impl LlmBackend for DownBackend {
    fn name(&self) -> &str {
        "down"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn send(&self, _prompt: &PromptPayload, _temperature: f32) -> Result<String, BackendError> {
        Err(BackendError::Network {
            message: "connection refused".to_string(),
        })
    }
}

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("proseeds_pipeline_{}", tag));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn ftp_opts(seed_dir: PathBuf, output_dir: PathBuf) -> BatchOptions {
    BatchOptions {
        protocol: "FTP".to_string(),
        seed_dir,
        output_dir,
        chat_mode: false,
        temperature: 0.5,
        max_tokens: 2048,
        safety_margin_tokens: 50,
        max_corpus_sample: 10,
        max_subset_size: 2,
        variants_per_seed: 1,
        retries: 2,
        retry_delay: Duration::from_millis(0),
        rng_seed: Some(42),
    }
}

#[test]
fn test_explanatory_reply_is_enriched_and_normalized() {
    let dir = scratch_dir("accept");
    fs::write(dir.join("seed_login.raw"), "USER ubuntu\r\nPASS ubuntu\r\n").unwrap();

    let backend = CannedBackend {
        reply: "Here is the enriched sequence:\n\nUSER ubuntu\nPASS ubuntu\nTYPE I\n\nThis adds the missing commands.",
    };
    let opts = ftp_opts(dir.clone(), dir.join("out"));
    let result = BatchOrchestrator::new(&backend, opts).run().unwrap();

    assert_eq!(result.report.success, 1);
    assert_eq!(result.report.skip, 0);
    assert_eq!(result.report.fail, 0);
    assert_eq!(result.report.total_seeds, 1);
    assert_eq!(result.outcomes.len(), 1);
    assert_eq!(result.outcomes[0].state, OutcomeState::Accepted);
    assert_eq!(result.outcomes[0].call.attempts_used, 1);
    assert!(result.outcomes[0].call.last_error.is_none());

    // Surrounding prose stripped, framing normalized to CRLF
    let written = fs::read_to_string(dir.join("out").join("enriched_seed_login.raw")).unwrap();
    assert_eq!(written, "USER ubuntu\r\nPASS ubuntu\r\nTYPE I\r\n");
    assert!(!written.ends_with("\r\n\r\n"));
    assert_eq!(
        result.outputs.get("enriched_seed_login.raw").map(String::as_str),
        Some(written.as_str())
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_placeholder_reply_is_rejected_not_written() {
    let dir = scratch_dir("reject");
    fs::write(dir.join("seed_login.raw"), "USER ubuntu\r\nPASS ubuntu\r\n").unwrap();

    let backend = CannedBackend {
        reply: "COMMAND ubuntu\nRESPONSE ok\n",
    };
    let opts = ftp_opts(dir.clone(), dir.join("out"));
    let result = BatchOrchestrator::new(&backend, opts).run().unwrap();

    assert_eq!(result.report.success, 0);
    assert_eq!(result.report.fail, 1);
    assert_eq!(result.outcomes[0].state, OutcomeState::Rejected);
    assert!(result.outputs.is_empty());
    assert!(!dir.join("out").join("enriched_seed_login.raw").exists());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_backend_failure_exhausts_retries_and_continues() {
    let dir = scratch_dir("down");
    fs::write(dir.join("seed_a.raw"), "USER a\r\n").unwrap();
    fs::write(dir.join("seed_b.raw"), "USER b\r\n").unwrap();

    let opts = ftp_opts(dir.clone(), dir.join("out"));
    let result = BatchOrchestrator::new(&DownBackend, opts).run().unwrap();

    // Every variant fails terminally, but the run itself completes
    assert_eq!(result.report.success, 0);
    assert_eq!(result.report.fail, 2);
    assert_eq!(result.report.total_seeds, 2);
    assert!(result
        .outcomes
        .iter()
        .all(|o| o.state == OutcomeState::Failed && o.raw_model_text.is_none()));
    // The retry record survives into the outcome, so diagnostics can say
    // how a variant died
    for outcome in &result.outcomes {
        assert_eq!(outcome.call.attempts_used, 2);
        assert!(matches!(
            outcome.call.last_error,
            Some(BackendError::Network { .. })
        ));
    }

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_covered_seed_is_skipped() {
    let dir = scratch_dir("skip");
    // Only the first seed (sorted order) is part of the corpus sample,
    // so everything except USER is corpus-missing
    fs::write(dir.join("a_login.raw"), "USER x\r\n").unwrap();
    let full: String = proseeds::protocol::canonical_types("FTP")
        .into_iter()
        .filter(|c| c != "USER")
        .map(|c| format!("{} x\r\n", c))
        .collect();
    fs::write(dir.join("b_full.raw"), &full).unwrap();

    let backend = CannedBackend {
        reply: "PASV x\nQUIT x\n",
    };
    let mut opts = ftp_opts(dir.clone(), dir.join("out"));
    opts.max_corpus_sample = 1;
    let result = BatchOrchestrator::new(&backend, opts).run().unwrap();

    // b_full already uses every corpus-missing type: skipped
    assert_eq!(result.report.skip, 1);
    assert_eq!(result.report.success, 1);
    assert_eq!(result.report.total_seeds, 2);
    assert!(result.outputs.contains_key("enriched_a_login.raw"));
    assert!(!result.outputs.contains_key("enriched_b_full.raw"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_sampling_is_deterministic_across_runs() {
    let dir = scratch_dir("determinism");
    fs::write(dir.join("seed_login.raw"), "USER ubuntu\r\nPASS ubuntu\r\n").unwrap();

    let backend = CannedBackend {
        reply: "USER ubuntu\nPASS ubuntu\nQUIT x\n",
    };
    let mut opts = ftp_opts(dir.clone(), dir.join("out"));
    opts.rng_seed = Some(7);
    opts.variants_per_seed = 2;

    let first = BatchOrchestrator::new(&backend, opts.clone()).run().unwrap();
    let second = BatchOrchestrator::new(&backend, opts).run().unwrap();

    let first_subsets: Vec<_> = first
        .outcomes
        .iter()
        .map(|o| o.request.target_subset.clone())
        .collect();
    let second_subsets: Vec<_> = second
        .outcomes
        .iter()
        .map(|o| o.request.target_subset.clone())
        .collect();
    assert_eq!(first_subsets, second_subsets);
    assert_eq!(
        first.outputs.keys().collect::<Vec<_>>(),
        second.outputs.keys().collect::<Vec<_>>()
    );

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_multi_variant_outputs_are_indexed() {
    let dir = scratch_dir("variants");
    fs::write(dir.join("seed_login.raw"), "USER ubuntu\r\nPASS ubuntu\r\n").unwrap();

    let backend = CannedBackend {
        reply: "USER ubuntu\nPASS ubuntu\nSTAT x\n",
    };
    let mut opts = ftp_opts(dir.clone(), dir.join("out"));
    opts.variants_per_seed = 3;
    let result = BatchOrchestrator::new(&backend, opts).run().unwrap();

    assert_eq!(result.report.success, 3);
    for i in 1..=3 {
        let name = format!("enriched_seed_login_{}.raw", i);
        assert!(result.outputs.contains_key(&name), "missing {}", name);
        assert!(dir.join("out").join(&name).exists());
    }

    let _ = fs::remove_dir_all(&dir);
}
