//! Bounded worker pool over independent tasks
//!
//! Workers pull from a shared queue and each owns its pacing state. Inside a
//! worker sessions run one after another. The pool is sized to the Active
//! proxy count so workers never queue up behind each other on one route.

pub mod source;

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::context::RankContext;
use crate::fetch::PageFetcher;
use crate::gateway::PoolStats;
use crate::session::{SearchOutcome, TerminalState};
use crate::sink::{ResultSink, TaskContext};

pub use source::{BatchTask, JsonFileSource, TaskSource};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub found: usize,
    pub not_found: usize,
    pub blocked: usize,
    /// Never started: no route or quota was left when their turn came
    pub skipped: usize,
    pub sink_failures: usize,
    pub pool_stats: PoolStats,
}

impl BatchReport {
    fn count(&mut self, outcome: &SearchOutcome) {
        match outcome.terminal {
            TerminalState::Found => self.found += 1,
            TerminalState::Blocked => self.blocked += 1,
            TerminalState::Exhausted => self.not_found += 1,
        }
    }

    #[must_use]
    pub fn executed(&self) -> usize {
        self.found + self.not_found + self.blocked
    }

    /// Blocked with no Active proxy left to continue on. Direct egress has
    /// no alternative route, so any block counts.
    #[must_use]
    pub fn blocked_without_route(&self) -> bool {
        self.blocked > 0 && self.pool_stats.active == 0
    }

    /// Tasks were given but none could start (quota or routes gone)
    #[must_use]
    pub fn nothing_run(&self) -> bool {
        self.total > 0 && self.executed() == 0
    }
}

/// Workers for this run
#[must_use]
pub fn worker_count(ctx: &RankContext) -> usize {
    if !ctx.config().use_proxy() {
        return 1;
    }
    ctx.config()
        .max_workers()
        .min(ctx.pool().active_count())
        .max(1)
}

/// Run every task and hand each outcome to `sink`
pub async fn run_batch<F, S>(
    ctx: &RankContext,
    fetcher: &F,
    tasks: Vec<BatchTask>,
    sink: &S,
    cancel: &CancellationToken,
) -> BatchReport
where
    F: PageFetcher,
    S: ResultSink,
{
    let total = tasks.len();
    let workers = worker_count(ctx);
    info!("Starting batch: {total} tasks on {workers} workers");

    let queue = Mutex::new(VecDeque::from(tasks));
    let report = Mutex::new(BatchReport {
        total,
        ..BatchReport::default()
    });

    let runs = (0..workers).map(|id| worker(id, ctx, fetcher, &queue, sink, &report, cancel));
    futures::future::join_all(runs).await;

    let mut report = report.into_inner();
    report.skipped = queue.into_inner().len();
    report.pool_stats = ctx.pool().stats();
    info!(
        "Batch finished: {} found, {} not found, {} blocked, {} skipped",
        report.found, report.not_found, report.blocked, report.skipped
    );
    report
}

async fn worker<F, S>(
    id: usize,
    ctx: &RankContext,
    fetcher: &F,
    queue: &Mutex<VecDeque<BatchTask>>,
    sink: &S,
    report: &Mutex<BatchReport>,
    cancel: &CancellationToken,
) where
    F: PageFetcher,
    S: ResultSink,
{
    let gateway = ctx.gateway();
    let session = ctx.session(&gateway, fetcher);

    loop {
        if cancel.is_cancelled() {
            info!("Worker {id}: cancelled");
            break;
        }
        if ctx.config().use_proxy() && ctx.pool().active_count() == 0 {
            warn!("Worker {id}: no active proxy left, stopping");
            break;
        }
        if let Err(e) = gateway.ensure_quota() {
            warn!("Worker {id}: {e}, stopping");
            break;
        }

        let Some(item) = queue.lock().pop_front() else {
            break;
        };

        let task_context = TaskContext::new(item.tracked_place_id.clone());
        let outcome = session.run(&item.task, cancel).await;
        let recorded = sink.record(&outcome, &task_context).await;
        {
            let mut report = report.lock();
            report.count(&outcome);
            if !recorded {
                report.sink_failures += 1;
            }
        }

        if outcome.blocked && !queue.lock().is_empty() {
            let pause = ctx.config().block_pause();
            warn!("Worker {id}: blocked, pausing {pause:?}");
            tokio::select! {
                () = tokio::time::sleep(pause) => {}
                () = cancel.cancelled() => {}
            }
        }
    }
}
