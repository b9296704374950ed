//! `qualis` command line.
//!
//! Validates record files with the multi-agent orchestrator, scores free
//! text with the deterministic scorer, and checks records against the
//! embedded schema.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use qualis_core::{
    Actor, ActorRole, QualityScorer, Record, RecordKind, StandardRules, Suggestion,
    DEFAULT_THRESHOLD,
};
use qualis_runtime::{HistoryLookup, InMemoryHistory, NoHistory, Orchestrator, OrchestratorConfig};

/// Qualis: quality validation for food-safety compliance records.
#[derive(Parser, Debug)]
#[command(name = "qualis")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a record with the validation agents.
    ///
    /// Prints the verdict as JSON. Exits 1 when the record is not valid.
    Validate(ValidateArgs),

    /// Score a free-text field or a drafted suggestion.
    Score(ScoreArgs),

    /// Check a record against the record schema only.
    Check(CheckArgs),
}

#[derive(Args, Debug)]
struct ValidateArgs {
    /// Record file (YAML or JSON)
    record: PathBuf,

    /// Orchestrator config (YAML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Recent submissions as a YAML or JSON list of {category, reported_at}
    #[arg(long)]
    history: Option<PathBuf>,

    #[arg(long, default_value = "cli")]
    actor_id: String,

    #[arg(long, default_value = "operator")]
    actor_role: ActorRole,

    /// Include per-agent traces and conflicts
    #[arg(long)]
    trace: bool,
}

#[derive(Args, Debug)]
struct ScoreArgs {
    /// Text file to score, or `-` for stdin
    input: PathBuf,

    /// Record kind the text belongs to (nca or mjc)
    #[arg(long, default_value = "nca")]
    kind: RecordKind,

    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: u32,

    /// Treat the input as a drafted suggestion in JSON
    #[arg(long)]
    suggestion: bool,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Record file (YAML or JSON)
    record: PathBuf,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Validate(args) => validate(args).await,
        Command::Score(args) => score(args),
        Command::Check(args) => check(args),
    }
}

async fn validate(args: ValidateArgs) -> Result<ExitCode> {
    let record = Record::from_file(&args.record)
        .with_context(|| format!("Failed to load record {}", args.record.display()))?;

    let config = match &args.config {
        Some(path) => OrchestratorConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => OrchestratorConfig::default(),
    };

    let history: Arc<dyn HistoryLookup> = match &args.history {
        Some(path) => Arc::new(load_history(path)?),
        None => Arc::new(NoHistory),
    };

    let orchestrator = Orchestrator::new(config, Arc::new(StandardRules::new()), history);
    let actor = Actor::new(args.actor_id, args.actor_role);
    let kind = record.kind();

    let report = orchestrator
        .validate_submission_detailed(&record, &actor, kind)
        .await;
    let valid = report.result.valid;

    let output = if args.trace {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string_pretty(&report.result)?
    };
    println!("{}", output);

    Ok(if valid { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn load_history(path: &Path) -> Result<InMemoryHistory> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read history {}", path.display()))?;
    InMemoryHistory::from_yaml(&text)
        .with_context(|| format!("Failed to parse history {}", path.display()))
}

fn score(args: ScoreArgs) -> Result<ExitCode> {
    let text = read_input(&args.input)?;
    let scorer = QualityScorer::new(args.threshold);

    let score = if args.suggestion {
        let suggestion: Suggestion =
            serde_json::from_str(&text).context("Failed to parse suggestion JSON")?;
        scorer.calculate_suggestion_quality(&suggestion, args.kind)
    } else {
        scorer.calculate_field_quality(&text, args.kind)
    };

    println!("{}", serde_json::to_string_pretty(&score)?);
    Ok(ExitCode::SUCCESS)
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(text);
    }

    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn check(args: CheckArgs) -> Result<ExitCode> {
    let record = Record::from_file(&args.record)
        .with_context(|| format!("Record {} failed validation", args.record.display()))?;

    println!("{} {} ok", record.kind(), record.id());
    Ok(ExitCode::SUCCESS)
}
