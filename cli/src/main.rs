//! Stable matching command-line tool
//!
//! Usage:
//!   stable-match generate --agents 10 --seed 7 --out instance.csv
//!   stable-match solve --instance instance.csv --trace
//!   stable-match batch --agents 20 --trials 100 --series-out series.csv

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use stable_match_core_rs::batch::{BatchConfig, BatchReport, BatchRunner, ErrorPolicy};
use stable_match_core_rs::export::{
    read_instance_csv, write_instance_csv, write_json, write_matching_csv, write_series_csv,
    write_trace_csv,
};
use stable_match_core_rs::generator::{PreferenceGenerator, RandomPreferenceGenerator};
use stable_match_core_rs::measures::{compute_measures, Measures};
use stable_match_core_rs::{engine, Instance, Matching, StepTrace, TraceMode};
use std::fs::File;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "stable-match")]
#[command(about = "Deferred acceptance matching, measures and batch experiments")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a random instance in the Type,Name,Preferences CSV format
    Generate {
        /// Agents per side
        #[arg(long)]
        agents: usize,

        /// RNG seed
        #[arg(long, default_value_t = 12345)]
        seed: u64,

        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Match one instance and print its measures
    Solve {
        /// Instance CSV file
        #[arg(long)]
        instance: PathBuf,

        /// Print every proposal step
        #[arg(long)]
        trace: bool,

        /// Write the matching as CSV
        #[arg(long)]
        matching_out: Option<PathBuf>,

        /// Write the step trace as CSV (implies --trace)
        #[arg(long)]
        trace_out: Option<PathBuf>,

        /// Write the full measures record as JSON
        #[arg(long)]
        measures_out: Option<PathBuf>,
    },

    /// Run many random trials and report per-trial and mean measures
    Batch {
        /// JSON batch config; flags below override its fields
        #[arg(long)]
        config: Option<PathBuf>,

        /// Agents per side
        #[arg(long)]
        agents: Option<usize>,

        /// Number of trials
        #[arg(long)]
        trials: Option<usize>,

        /// Base RNG seed
        #[arg(long)]
        seed: Option<u64>,

        /// Stop at the first failed trial
        #[arg(long)]
        abort_on_error: bool,

        /// Concurrent generator calls
        #[arg(long)]
        max_in_flight: Option<usize>,

        /// Per-call generator timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Write the series as CSV
        #[arg(long)]
        series_out: Option<PathBuf>,

        /// Write the full report as JSON
        #[arg(long)]
        report_out: Option<PathBuf>,
    },
}

/// `RUST_LOG` directives when set and valid, `info` otherwise
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; results go to stdout
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(
            std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(),
        ))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Generate { agents, seed, out } => generate(agents, seed, out.as_deref()),
        Command::Solve {
            instance,
            trace,
            matching_out,
            trace_out,
            measures_out,
        } => solve(
            &instance,
            trace || trace_out.is_some(),
            matching_out.as_deref(),
            trace_out.as_deref(),
            measures_out.as_deref(),
        ),
        Command::Batch {
            config,
            agents,
            trials,
            seed,
            abort_on_error,
            max_in_flight,
            timeout_ms,
            series_out,
            report_out,
        } => {
            let mut batch_config = match config {
                Some(path) => load_config(&path)?,
                None => BatchConfig::default(),
            };
            if let Some(agents) = agents {
                batch_config.num_agents = agents;
            }
            if let Some(trials) = trials {
                batch_config.num_trials = trials;
            }
            if let Some(seed) = seed {
                batch_config.seed = seed;
            }
            if abort_on_error {
                batch_config.error_policy = ErrorPolicy::AbortOnFirstError;
            }
            if let Some(max_in_flight) = max_in_flight {
                batch_config.max_in_flight = max_in_flight;
            }
            if timeout_ms.is_some() {
                batch_config.generator_timeout_ms = timeout_ms;
            }

            batch(batch_config, series_out.as_deref(), report_out.as_deref()).await
        }
    }
}

// ============================================================================
// Subcommands
// ============================================================================

fn generate(agents: usize, seed: u64, out: Option<&Path>) -> Result<()> {
    let instance = PreferenceGenerator::generate(&RandomPreferenceGenerator::new(seed), 0, agents)
        .context("Failed to generate instance")?;

    match out {
        Some(path) => {
            write_instance_csv(create(path)?, &instance)?;
            info!(agents, seed, path = %path.display(), "instance written");
        }
        None => write_instance_csv(io::stdout().lock(), &instance)?,
    }
    Ok(())
}

fn solve(
    path: &Path,
    trace: bool,
    matching_out: Option<&Path>,
    trace_out: Option<&Path>,
    measures_out: Option<&Path>,
) -> Result<()> {
    let file = File::open(path).with_context(|| format!("Failed to open instance file: {:?}", path))?;
    let instance = read_instance_csv(BufReader::new(file))
        .with_context(|| format!("Failed to read instance: {:?}", path))?;
    info!(agents = instance.len(), fingerprint = %instance.fingerprint(), "instance loaded");

    let mode = if trace {
        TraceMode::Enabled
    } else {
        TraceMode::Disabled
    };
    let outcome = engine::run(&instance, mode).context("Matching failed")?;

    if let Some(steps) = &outcome.trace {
        print_trace(steps);
        if let Some(path) = trace_out {
            write_trace_csv(create(path)?, steps)?;
        }
    }

    print_matching(&instance, &outcome.matching);
    println!("Proposals: {}", outcome.proposals);

    let measures = compute_measures(&instance, &outcome.matching).context("Measures failed")?;
    print_measures(&measures);

    if let Some(path) = matching_out {
        write_matching_csv(create(path)?, &outcome.matching)?;
    }
    if let Some(path) = measures_out {
        write_json(create(path)?, &measures)?;
    }
    Ok(())
}

async fn batch(config: BatchConfig, series_out: Option<&Path>, report_out: Option<&Path>) -> Result<()> {
    let generator = RandomPreferenceGenerator::new(config.seed);
    let runner = BatchRunner::new(config).context("Invalid batch config")?;

    let handle = runner.cancellation_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, finishing current trial");
            handle.cancel();
        }
    });

    let report = runner.run_async(&generator).await;
    print_report(&report);

    if let Some(path) = series_out {
        write_series_csv(create(path)?, &report.series)?;
    }
    if let Some(path) = report_out {
        write_json(create(path)?, &report)?;
    }
    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    Ok(BufWriter::new(file))
}

fn load_config(path: &Path) -> Result<BatchConfig> {
    let file = File::open(path).with_context(|| format!("Failed to open config: {:?}", path))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse config: {:?}", path))
}

fn print_trace(trace: &StepTrace) {
    println!("Steps:");
    for record in trace.steps() {
        match record.outcome.other_student() {
            Some(other) => println!(
                "  {:>3}. {} -> {}: {} ({})",
                record.step,
                record.student,
                record.school,
                record.event_type(),
                other
            ),
            None => println!(
                "  {:>3}. {} -> {}: {}",
                record.step,
                record.student,
                record.school,
                record.event_type()
            ),
        }
    }
}

fn print_matching(instance: &Instance, matching: &Matching) {
    println!("Matching:");
    for assignment in matching.assignments() {
        println!(
            "  {} <- {}",
            assignment.school,
            assignment.student.as_deref().unwrap_or("-")
        );
    }
    if !matching.is_complete(instance) {
        warn!("matching is not complete");
    }
}

fn print_measures(measures: &Measures) {
    println!("Measures:");
    println!("  Average rank (students): {:.2}", measures.avg_rank_students);
    println!("  Average rank (schools):  {:.2}", measures.avg_rank_schools);
    println!("  Egalitarian cost:        {}", measures.egalitarian_cost);
    println!("  Utilitarian welfare:     {:.2}", measures.welfare);
    println!("  Average score (students): {:.2}", measures.avg_score_students);
    println!("  Average score (schools):  {:.2}", measures.avg_score_schools);
    println!("  Pareto-optimal:          {}", measures.pareto_optimal);
}

fn print_report(report: &BatchReport) {
    for row in report.series.rows() {
        println!(
            "Trial {:>4}: avg rank S={:.2} E={:.2}  cost={}  welfare={:.2}  pareto={}",
            row.trial,
            row.avg_rank_students,
            row.avg_rank_schools,
            row.egalitarian_cost,
            row.welfare,
            row.pareto_optimal
        );
    }
    for failure in &report.failures {
        println!("Trial {:>4}: FAILED {}", failure.trial, failure.error);
    }

    let summary = report.series.summary();
    println!();
    println!("Status: {:?}", report.status);
    println!(
        "Successful trials: {} / {}",
        report.successful_trials(),
        report.attempted_trials()
    );
    println!("Mean average rank (students): {:.2}", summary.mean_avg_rank_students);
    println!("Mean average rank (schools):  {:.2}", summary.mean_avg_rank_schools);
    println!("Mean egalitarian cost:        {:.2}", summary.mean_egalitarian_cost);
    println!("Mean welfare:                 {:.2}", summary.mean_welfare);
    println!("Pareto rate:                  {:.2}", summary.pareto_rate);
}
