use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use gesture_search::pattern::{MAX_CODE_LEN, MIN_CODE_LEN};
use gesture_search::{
    CandidatePool, Code, RunInput, SearchConfig, SearchCoordinator, SearchOutcome,
    SimulatedOracle,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

// --- Command Line Arguments ---

#[derive(Parser)]
#[command(name = "gesture-search")]
#[command(about = "Concurrent search over 3x3 gesture codes")]
#[command(version)]
#[command(subcommand_required = true)]
#[command(arg_required_else_help = true)]
struct Cli {
    /// Log at debug level
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print candidate pool statistics, or the codes themselves
    Pool {
        /// Print every code, one per line
        #[arg(long)]
        dump: bool,
        /// Only codes of this length (4-9)
        #[arg(long)]
        length: Option<usize>,
    },
    /// Run a full search against an in-process oracle with a known secret
    Simulate(SimulateArgs),
}

#[derive(Args)]
struct SimulateArgs {
    /// Session identifier passed to every probe
    #[arg(long)]
    identifier: String,
    /// Credential passed to every probe; whitespace is stripped, so values
    /// pasted across several lines work
    #[arg(long)]
    credential: String,
    /// Secret code the oracle accepts
    #[arg(long, conflicts_with = "secret_index", required_unless_present = "secret_index")]
    secret: Option<String>,
    /// Use the pool element at this zero-based index as the secret
    #[arg(long)]
    secret_index: Option<usize>,
    /// Number of concurrent workers
    #[arg(long)]
    workers: Option<usize>,
    /// Simulated latency per probe in milliseconds
    #[arg(long, default_value_t = 0)]
    latency_ms: u64,
    /// Extra random latency per probe, up to this many milliseconds
    #[arg(long, default_value_t = 0)]
    jitter_ms: u64,
    /// Probability that a wrong code reports a transient error
    #[arg(long, default_value_t = 0.0)]
    transient_rate: f64,
    /// Seed for the simulated oracle
    #[arg(long)]
    seed: Option<u64>,
    /// Make the confirmation step fail
    #[arg(long)]
    fail_confirmation: bool,
    /// YAML configuration file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write every attempt to this JSONL file
    #[arg(long)]
    attempt_log: Option<PathBuf>,
    /// Abort the run after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Print the final report as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Pool { dump, length } => cmd_pool(dump, length),
        Commands::Simulate(args) => cmd_simulate(args).await,
    }
}

fn cmd_pool(dump: bool, length: Option<usize>) -> Result<()> {
    if let Some(len) = length {
        if !(MIN_CODE_LEN..=MAX_CODE_LEN).contains(&len) {
            bail!(
                "--length must be between {} and {}, got {}",
                MIN_CODE_LEN,
                MAX_CODE_LEN,
                len
            );
        }
    }

    let pool = CandidatePool::generate();
    let selected = |code: &&Code| length.map_or(true, |len| code.len() == len);

    if dump {
        let stdout = std::io::stdout();
        let mut out = std::io::BufWriter::new(stdout.lock());
        for code in pool.iter().filter(selected) {
            writeln!(out, "{}", code)?;
        }
        out.flush()?;
        return Ok(());
    }

    let stats = pool.stats();
    match length {
        Some(len) => println!("length {}: {} codes", len, stats.count_for(len)),
        None => {
            println!("total: {} codes", stats.total);
            for len in MIN_CODE_LEN..=MAX_CODE_LEN {
                println!("length {}: {}", len, stats.count_for(len));
            }
        }
    }
    Ok(())
}

fn strip_whitespace(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}

fn load_config(args: &SimulateArgs) -> Result<SearchConfig> {
    let mut config = match &args.config {
        Some(path) => SearchConfig::from_yaml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SearchConfig::default(),
    };
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }
    if args.attempt_log.is_some() {
        config = config.with_attempt_log(args.attempt_log.clone());
    }
    if let Some(secs) = args.timeout_secs {
        config = config.with_run_timeout(Some(Duration::from_secs(secs)));
    }
    config.validate()?;
    Ok(config)
}

async fn cmd_simulate(args: SimulateArgs) -> Result<()> {
    let config = load_config(&args)?;
    let input = RunInput::new(
        args.identifier.trim(),
        strip_whitespace(&args.credential),
    )?;

    let pool = Arc::new(CandidatePool::generate());
    let secret = match (&args.secret, args.secret_index) {
        (Some(code), _) => Code::parse(code)?,
        (None, Some(index)) => pool.get(index).with_context(|| {
            format!("--secret-index {} is outside the pool of {}", index, pool.len())
        })?,
        (None, None) => bail!("either --secret or --secret-index is required"),
    };
    info!(
        "Simulating secret {} at pool position {:?}",
        secret,
        pool.position(&secret)
    );

    let oracle = Arc::new(
        SimulatedOracle::new(secret)
            .with_latency(
                Duration::from_millis(args.latency_ms),
                Duration::from_millis(args.jitter_ms),
            )
            .with_transient_rate(args.transient_rate)
            .with_failing_confirmation(args.fail_confirmation)
            .with_seed(args.seed),
    );

    let coordinator = SearchCoordinator::new(config, pool, oracle)?;
    let (progress_tx, mut progress_rx) = coordinator.progress_channel();
    let coordinator = coordinator.with_progress_sink(progress_tx);

    let printer = tokio::spawn(async move {
        let stderr = std::io::stderr();
        while let Some(snapshot) = progress_rx.recv().await {
            let mut err = stderr.lock();
            let _ = write!(err, "\r{}", snapshot.display_line());
            let _ = err.flush();
        }
        let _ = writeln!(stderr.lock());
    });

    let (cancel_tx, cancel_rx) = oneshot::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling search");
            let _ = cancel_tx.send(());
        }
    });

    let report = coordinator.run_with_cancel(input, cancel_rx).await?;
    let _ = printer.await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        match &report.outcome {
            SearchOutcome::Found {
                code,
                index,
                confirmation,
            } => {
                println!("found: {} (candidate {} of {})", code, index + 1, report.total);
                if !confirmation.is_confirmed() {
                    println!("confirmation: {:?}", confirmation);
                }
            }
            SearchOutcome::Exhausted => println!("exhausted {} candidates, nothing found", report.total),
            SearchOutcome::Cancelled { attempted } => {
                println!("cancelled after {} of {} candidates", attempted, report.total)
            }
            SearchOutcome::Aborted { attempted, reason } => {
                println!("aborted after {} candidates: {}", attempted, reason)
            }
        }
        println!(
            "probes: {}, failures: {}, transient: {}, elapsed: {}ms",
            report.metrics.probes_issued,
            report.metrics.failures,
            report.metrics.transient_errors,
            report.elapsed_ms
        );
    }

    match report.outcome {
        SearchOutcome::Found { .. } | SearchOutcome::Exhausted => Ok(()),
        SearchOutcome::Cancelled { .. } => bail!("search cancelled"),
        SearchOutcome::Aborted { reason, .. } => bail!("search aborted: {}", reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_whitespace() {
        assert_eq!(strip_whitespace("a=1;\n b=2;\t c=3"), "a=1;b=2;c=3");
        assert_eq!(strip_whitespace(" \n "), "");
    }

    #[test]
    fn test_simulate_args_parse() {
        let cli = Cli::try_parse_from([
            "gesture-search",
            "simulate",
            "--identifier",
            "42",
            "--credential",
            "uid=1",
            "--secret-index",
            "56",
        ])
        .unwrap();
        match cli.command {
            Commands::Simulate(args) => {
                assert_eq!(args.secret_index, Some(56));
                assert!(args.secret.is_none());
            }
            Commands::Pool { .. } => panic!("expected simulate"),
        }
    }
}
