//! Command-line entry point.
//!
//! # Startup sequence
//!
//! 1. Parse arguments.
//! 2. Initialise logging (`RUST_LOG` overrides the `info` default).
//! 3. Load [`AppConfig`] from `--config` or the platform settings file, then
//!    layer environment overrides.
//! 4. Build a current-thread [`tokio`] runtime; the pipeline is strictly
//!    sequential.
//! 5. Dispatch the subcommand.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use wordbook_verify::{
    config::{AppConfig, AppPaths, ENV_LLM_API_KEY},
    pipeline::{CorrectionPipeline, PipelineResult},
    wordlist::EntryIndex,
};

#[derive(Parser, Debug)]
#[command(name = "wordbook-verify")]
#[command(about = "Verify a vocabulary list and correct unrecognized words with an LLM")]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Partition the word list into recognized and unrecognized words
    Check {
        /// Word list, one word per line
        words: PathBuf,
    },

    /// Run both correction rounds and rewrite the word list
    Correct {
        /// Word list, one word per line
        words: PathBuf,

        /// Parser output: JSON array of {word, meaning, line}
        #[arg(short, long)]
        entries: Option<PathBuf>,

        /// Save the report (.json for JSON, anything else for text)
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Do not modify the word list
        #[arg(long)]
        dry_run: bool,
    },

    /// Show resolved paths and configuration status
    Env,
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn check(config: &AppConfig, words: &Path) -> anyhow::Result<()> {
    let pipeline = CorrectionPipeline::from_config(config);
    let partition = pipeline
        .check(words)
        .await
        .with_context(|| format!("checking {}", words.display()))?;

    println!(
        "{} words: {} recognized, {} unrecognized ({:.1}%)",
        partition.total(),
        partition.recognized.len(),
        partition.unrecognized.len(),
        partition.recognition_rate()
    );
    for word in &partition.unrecognized {
        println!("  {word}");
    }
    Ok(())
}

async fn correct(
    config: &AppConfig,
    words: &Path,
    entries: Option<&Path>,
    report: Option<&Path>,
    dry_run: bool,
) -> anyhow::Result<PipelineResult> {
    let index = match entries {
        Some(path) => EntryIndex::load(path)?,
        None => EntryIndex::default(),
    };
    log::info!("{} parser entries loaded", index.len());

    let apply = config.pipeline.apply_corrections && !dry_run;
    let pipeline = CorrectionPipeline::from_config(config).with_apply(apply);
    let result = pipeline
        .run(words, &index)
        .await
        .with_context(|| format!("correcting {}", words.display()))?;

    print!("{}", result.render_text());
    if let Some(path) = report {
        result
            .save(path)
            .with_context(|| format!("writing report {}", path.display()))?;
    }
    Ok(result)
}

fn env(config: &AppConfig, settings: &Path) {
    let paths = AppPaths::new();
    println!("config dir:    {}", paths.config_dir.display());
    println!(
        "settings file: {} ({})",
        settings.display(),
        if settings.exists() { "found" } else { "not found, using defaults" }
    );
    println!("oracle:        {}", config.oracle.endpoint);
    println!("llm endpoint:  {}", config.llm.base_url);
    println!("llm model:     {}", config.llm.model);
    println!(
        "llm key:       {}",
        if config.llm.is_usable() {
            "set".to_string()
        } else {
            format!("missing (set {ENV_LLM_API_KEY})")
        }
    );
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> anyhow::Result<()> {
    // 1. Arguments
    let cli = Cli::parse();

    // 2. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 3. Configuration
    let settings = cli
        .config
        .clone()
        .unwrap_or_else(|| AppPaths::new().settings_file);
    let mut config = AppConfig::load_from(&settings)
        .with_context(|| format!("loading {}", settings.display()))?;
    config.apply_env_overrides();

    // 4. Runtime
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    // 5. Dispatch
    match cli.command {
        Command::Check { words } => rt.block_on(check(&config, &words)),
        Command::Correct {
            words,
            entries,
            report,
            dry_run,
        } => {
            rt.block_on(correct(
                &config,
                &words,
                entries.as_deref(),
                report.as_deref(),
                dry_run,
            ))?;
            Ok(())
        }
        Command::Env => {
            env(&config, &settings);
            Ok(())
        }
    }
}
