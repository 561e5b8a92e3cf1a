// placerank: keyword rank tracking for local place search
//
// Exit codes: 0 normal completion (not-found included), 2 configuration
// error, 3 blocked with no route left or nothing could run.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use placerank::{
    BatchReport, BatchTask, BrowserFetcher, FetcherKind, HttpFetcher, JsonFileSource, JsonlSink,
    MemorySink, PageFetcher, RankConfig, RankConfigBuilder, RankContext, RankError, SearchTask,
    TaskSource, run_batch,
};

const EXIT_CONFIG: u8 = 2;
const EXIT_BLOCKED: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Single,
    Batch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FetcherArg {
    Http,
    Browser,
}

/// placerank: find where a place ranks for a keyword in local search results.
#[derive(Debug, Clone, Parser)]
#[command(name = "placerank", version, long_about = None)]
struct Cli {
    /// Run one task from flags, or many from a task file
    #[arg(long, value_enum, default_value_t = Mode::Single)]
    mode: Mode,

    /// Search keyword (single mode)
    #[arg(long)]
    keyword: Option<String>,

    /// Display name of the place to find (single mode)
    #[arg(long)]
    target: Option<String>,

    /// Place id (CID) of the target; exact id match wins over names
    #[arg(long = "target-id")]
    target_id: Option<String>,

    /// Deepest rank to look at; defaults to the config value
    #[arg(long = "max-rank")]
    max_rank: Option<i32>,

    /// JSON array of tasks (batch mode)
    #[arg(long)]
    tasks: Option<PathBuf>,

    /// JSON config file; defaults apply to missing keys
    #[arg(long)]
    config: Option<PathBuf>,

    /// Append outcomes to this JSON Lines file instead of printing them
    #[arg(long)]
    output: Option<PathBuf>,

    /// Transport override
    #[arg(long, value_enum)]
    fetcher: Option<FetcherArg>,

    /// Browser headless override
    #[arg(long)]
    headless: Option<bool>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!("{e:#}");
            match e.downcast_ref::<RankError>() {
                Some(RankError::Configuration(_)) => ExitCode::from(EXIT_CONFIG),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

async fn load_config(cli: &Cli) -> Result<RankConfig> {
    let base = match &cli.config {
        Some(path) => RankConfig::from_json_file(path).await?,
        None => RankConfig::default(),
    };
    let base = base.with_env_overrides()?;

    let mut builder = RankConfigBuilder::from_config(base);
    if let Some(kind) = cli.fetcher {
        builder = builder.fetcher(match kind {
            FetcherArg::Http => FetcherKind::Http,
            FetcherArg::Browser => FetcherKind::Browser,
        });
    }
    if let Some(headless) = cli.headless {
        builder = builder.headless(headless);
    }
    if let Some(max_rank) = cli.max_rank {
        builder = builder.max_rank(max_rank);
    }
    Ok(builder.build()?)
}

async fn load_tasks(cli: &Cli, config: &RankConfig) -> Result<Vec<BatchTask>> {
    match cli.mode {
        Mode::Single => {
            let keyword = cli
                .keyword
                .clone()
                .ok_or_else(|| RankError::config("--keyword is required in single mode"))?;
            let task = SearchTask::new(
                keyword,
                cli.target.clone().unwrap_or_default(),
                cli.target_id.clone(),
                config.max_rank(),
            )?;
            Ok(vec![task.into()])
        }
        Mode::Batch => {
            let path = cli
                .tasks
                .clone()
                .ok_or_else(|| RankError::config("--tasks is required in batch mode"))?;
            Ok(JsonFileSource::new(path, config.max_rank()).load().await?)
        }
    }
}

async fn run(cli: Cli) -> Result<u8> {
    let config = load_config(&cli).await?;
    let tasks = load_tasks(&cli, &config).await?;
    let fetcher_kind = config.fetcher();
    let ctx = RankContext::new(config)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing the current load");
            on_signal.cancel();
        }
    });

    let report = match fetcher_kind {
        FetcherKind::Http => {
            let fetcher = HttpFetcher::new(ctx.config()).context("building HTTP client")?;
            run_with_sink(&cli, &ctx, &fetcher, tasks, &cancel).await?
        }
        FetcherKind::Browser => {
            let fetcher = BrowserFetcher::new(ctx.config());
            let report = run_with_sink(&cli, &ctx, &fetcher, tasks, &cancel).await;
            fetcher.shutdown().await;
            report?
        }
    };

    info!("{}", serde_json::to_string(&report)?);
    if report.blocked_without_route() || report.nothing_run() {
        return Ok(EXIT_BLOCKED);
    }
    Ok(0)
}

async fn run_with_sink<F: PageFetcher>(
    cli: &Cli,
    ctx: &RankContext,
    fetcher: &F,
    tasks: Vec<BatchTask>,
    cancel: &CancellationToken,
) -> Result<BatchReport> {
    match &cli.output {
        Some(path) => {
            let sink = JsonlSink::new(path);
            Ok(run_batch(ctx, fetcher, tasks, &sink, cancel).await)
        }
        None => {
            let sink = MemorySink::new();
            let report = run_batch(ctx, fetcher, tasks, &sink, cancel).await;
            for outcome in sink.outcomes() {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            }
            Ok(report)
        }
    }
}
