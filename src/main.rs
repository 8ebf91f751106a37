//! Proseeds - LLM-Guided Protocol Seed Enrichment
//!
//! CLI entry point for enriching fuzzer seed corpora from a TOML config.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use proseeds::backend::OpenAiBackend;
use proseeds::batch::{BatchOptions, BatchOrchestrator};
use proseeds::config::ProseedsConfig;
use proseeds::enrich::OutcomeState;
use proseeds::protocol;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "proseeds")]
#[command(version)]
#[command(about = "LLM-guided protocol seed enrichment for fuzzing corpora", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrich a seed directory according to a config file
    Run {
        /// Config file path
        #[arg(short, long, default_value = "proseeds.toml")]
        config: PathBuf,

        /// Override the configured protocol
        #[arg(long)]
        protocol: Option<String>,

        /// Override the configured seed directory
        #[arg(long)]
        seed_dir: Option<PathBuf>,

        /// Override the configured output directory
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Override the number of variants per seed
        #[arg(long)]
        variants: Option<usize>,

        /// Override the sampling seed (for reproducible runs)
        #[arg(long)]
        rng_seed: Option<u64>,

        /// Print per-variant outcomes
        #[arg(short, long)]
        verbose: bool,
    },

    /// List supported protocols and their canonical command sets
    Protocols,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            protocol,
            seed_dir,
            output_dir,
            variants,
            rng_seed,
            verbose,
        } => {
            let mut cfg = ProseedsConfig::load(&config)
                .with_context(|| format!("loading config from {}", config.display()))?;

            if let Some(p) = protocol {
                cfg.protocol = p;
            }
            if let Some(dir) = seed_dir {
                cfg.paths.seed_dir = dir.display().to_string();
            }
            if let Some(dir) = output_dir {
                cfg.paths.output_dir = Some(dir.display().to_string());
            }
            if let Some(n) = variants {
                cfg.advanced.variants_per_seed = n;
            }
            if let Some(seed) = rng_seed {
                cfg.advanced.rng_seed = Some(seed);
            }

            cfg.validate()?;
            run_batch(&cfg, verbose)
        }

        Commands::Protocols => {
            for name in protocol::supported() {
                let types = protocol::canonical_types(name);
                println!("{} ({} commands)", name, types.len());
                let listed: Vec<String> = types.into_iter().collect();
                println!("  {}", listed.join(", "));
            }
            Ok(())
        }
    }
}

fn run_batch(cfg: &ProseedsConfig, verbose: bool) -> Result<()> {
    let mut backend = if cfg.model.use_local {
        OpenAiBackend::local(cfg.model.api_url.clone(), cfg.model.name.clone())
    } else {
        OpenAiBackend::remote(
            cfg.model.api_url.clone(),
            cfg.model.api_key.clone(),
            cfg.model.name.clone(),
        )
    };
    backend.set_max_tokens(cfg.model.max_tokens);

    if !proseeds::LlmBackend::is_available(&backend) {
        if cfg!(feature = "llm-backends") {
            bail!(
                "no API key configured; set model.api_key in the config or the OPENAI_API_KEY \
                 environment variable"
            );
        }
        bail!("model backend disabled; rebuild with --features llm-backends");
    }

    println!("Enriching {} seeds from {}", cfg.protocol, cfg.paths.seed_dir);
    println!("  model: {} via {}", backend.model(), backend.api_url());
    println!(
        "  variants per seed: {}, subset cap: {}",
        cfg.advanced.variants_per_seed, cfg.advanced.max_subset_size
    );

    let opts = BatchOptions::from_config(cfg);
    let result = BatchOrchestrator::new(&backend, opts)
        .run()
        .context("enrichment batch failed")?;

    if verbose {
        for outcome in &result.outcomes {
            let state = match outcome.state {
                OutcomeState::Accepted => "accepted",
                OutcomeState::Rejected => "rejected",
                OutcomeState::Failed => "failed",
            };
            println!(
                "  {} [{}] {} ({} attempts)",
                outcome.request.seed_path.display(),
                outcome.request.target_subset.join(", "),
                state,
                outcome.call.attempts_used
            );
            if let Some(err) = &outcome.call.last_error {
                println!("    last error: {}", err);
            }
        }
    }

    println!("Done. {}", result.report);
    Ok(())
}
