//! Incident triage planner CLI
//!
//! The `triage-plan` command turns a failure record stream and a scoring
//! policy into a ranked incident plan.
//!
//! ## Commands
//!
//! - `plan`: score, rank and validate incidents, then write the plan
//! - `check`: re-validate an existing plan file against a policy
//! - `score`: score a single inline record

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{info, Level};

use triage_core::{
    ingest_reader, parse_record, run_pipeline, score_incident, validate_plan_document,
    write_summary_json, write_summary_md, JsonFileSink, PlanSummary, Policy,
};

#[derive(Parser)]
#[command(name = "triage-plan")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Policy-driven triage planner for test-failure incidents", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Also write log lines to this file (truncated on each run)
    #[arg(long, global = true, env = "TRIAGE_LOG_FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the ranked incident plan
    Plan {
        /// Scoring policy (YAML or JSON)
        #[arg(short, long, env = "TRIAGE_POLICY", default_value = "sample_data/Policy.yaml")]
        policy: PathBuf,

        /// Failure records, one JSON object per line
        #[arg(short, long, env = "TRIAGE_FAILURES", default_value = "sample_data/Failures.jsonl")]
        failures: PathBuf,

        /// Where to write the ranked plan
        #[arg(
            short,
            long,
            env = "TRIAGE_OUTPUT",
            default_value = "test_results/final_incidents_list.json"
        )]
        output: PathBuf,

        /// Optional summary artifact (JSON)
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Optional summary for PR comments (markdown)
        #[arg(long)]
        summary_md: Option<PathBuf>,
    },

    /// Re-validate an existing plan file against a policy
    Check {
        /// Scoring policy (YAML or JSON)
        #[arg(short, long, env = "TRIAGE_POLICY", default_value = "sample_data/Policy.yaml")]
        policy: PathBuf,

        /// Plan file written by `plan`
        #[arg(long, default_value = "test_results/final_incidents_list.json")]
        plan: PathBuf,
    },

    /// Score one failure record given inline as JSON
    Score {
        /// Scoring policy (YAML or JSON)
        #[arg(short, long, env = "TRIAGE_POLICY", default_value = "sample_data/Policy.yaml")]
        policy: PathBuf,

        /// Failure record, e.g. '{"module": "auth", "impacted_layers": ["UI"]}'
        record: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    match &cli.log_file {
        Some(path) => triage_core::init_tracing_to_file(cli.json, level, path)
            .with_context(|| format!("Failed to open log file {:?}", path))?,
        None => triage_core::init_tracing(cli.json, level),
    }

    match cli.command {
        Commands::Plan {
            policy,
            failures,
            output,
            summary,
            summary_md,
        } => cmd_plan(
            &policy,
            &failures,
            &output,
            summary.as_deref(),
            summary_md.as_deref(),
        ),
        Commands::Check { policy, plan } => cmd_check(&policy, &plan),
        Commands::Score { policy, record } => cmd_score(&policy, &record),
    }
}

fn load_policy(path: &Path) -> Result<Policy> {
    Policy::load(path).with_context(|| format!("Failed to load policy {:?}", path))
}

/// Build, validate and write the ranked plan
fn cmd_plan(
    policy_path: &Path,
    failures_path: &Path,
    output: &Path,
    summary_path: Option<&Path>,
    summary_md_path: Option<&Path>,
) -> Result<()> {
    let policy = load_policy(policy_path)?;

    let file = File::open(failures_path)
        .with_context(|| format!("Failed to open failure records {:?}", failures_path))?;
    let ingest = ingest_reader(BufReader::new(file))
        .with_context(|| format!("Failed to read failure records {:?}", failures_path))?;

    let mut sink = JsonFileSink::new(output);
    let outcome = run_pipeline(&policy, ingest, &mut sink).context("Failed to build incident plan")?;

    println!(
        "✓ Data validation passed for {} incidents.",
        outcome.plan.len()
    );
    if !outcome.warnings.is_empty() {
        let lines: Vec<String> = outcome.warnings.iter().map(|w| w.line.to_string()).collect();
        println!(
            "Skipped {} malformed line(s): {}",
            outcome.warnings.len(),
            lines.join(", ")
        );
    }

    if summary_path.is_some() || summary_md_path.is_some() {
        let summary =
            PlanSummary::from_plan(&outcome.plan, outcome.warnings.len(), &policy.digest());
        if let Some(path) = summary_path {
            write_summary_json(path, &summary)?;
            println!("Summary written to {:?}", path);
        }
        if let Some(path) = summary_md_path {
            write_summary_md(path, &summary)?;
            println!("Markdown summary written to {:?}", path);
        }
    }

    info!(output = ?output, incidents = outcome.plan.len(), "plan written");
    println!(
        "Plan written to {} with {} incidents.",
        output.display(),
        outcome.plan.len()
    );

    Ok(())
}

/// Re-validate an existing plan file
fn cmd_check(policy_path: &Path, plan_path: &Path) -> Result<()> {
    let policy = load_policy(policy_path)?;

    let raw = std::fs::read_to_string(plan_path)
        .with_context(|| format!("Failed to read plan {:?}", plan_path))?;
    let document: serde_json::Value = serde_json::from_str(&raw)
        .with_context(|| format!("Plan is not valid JSON: {:?}", plan_path))?;

    let plan = validate_plan_document(&policy, &document)
        .with_context(|| format!("Plan {:?} failed validation", plan_path))?;

    println!("✓ Data validation passed for {} incidents.", plan.len());
    Ok(())
}

/// Score one inline record
fn cmd_score(policy_path: &Path, record: &str) -> Result<()> {
    let policy = load_policy(policy_path)?;

    let incident = parse_record(record)
        .context("Record is not a valid failure record")?
        .context("Record is empty")?;
    let scored = score_incident(&policy, &incident);

    println!("{}", serde_json::to_string_pretty(&scored)?);
    Ok(())
}
