//! `NetworkSimulationManager` — spreads the replicas of one job over a set
//! of workers.
//!
//! # Scheduling loop
//!
//! ```text
//! INIT every worker; a worker that fails INIT is removed.
//! loop:
//!   ① Dispatch — while replicas are pending and a worker is idle, take
//!                min(window, pending) replicas (halving the window first if
//!                it cannot finish within the running-time cap) and spawn
//!                the TASK exchange under the worker's timeout.
//!   ② Collect  — wait for one dispatch outcome:
//!                  Done      → merge results, requeue anything missing,
//!                              worker idle again
//!                  Failed    → the worker's executor rejected the batch;
//!                              stop dispatching, the job fails
//!                  Migrated  → requeue the batch, the liveness-check connection
//!                              replaces the old one, window halved
//!                  Removed   → requeue the batch, worker evicted
//!   ③ Stop     — nothing in flight and nothing pending (or no worker left,
//!                or the job failed)
//! CLOSE_CONNECTION to every remaining worker, expect the echo.
//! ```
//!
//! Every dispatch of a replica counts as an attempt.  A replica requeued
//! after `max_task_attempts` attempts fails the job with `RetriesExhausted`.
//!
//! The loop task owns the pending queue, the idle queue and the tracker, so
//! none of them need a lock.  A worker never has more than one batch in
//! flight, and a requeued replica goes to the front of the queue.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use cas_core::ReplicaId;
use cas_sim::Trajectory;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::{
    BoxedStream, Command, Connector, FramedConnection, JobId, JobSpec, ManagerConfig, NetError,
    NetResult, SimulationEvent, SimulationState, SimulationTracker, SlaveState, TaskBatch, TaskOutcome,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum JobStatus {
    Complete,
    /// Every worker was lost before these replicas ran.
    Partial { missing: Vec<ReplicaId> },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobOutcome {
    pub job:     JobId,
    /// One trajectory per completed replica, in replica order.
    pub results: Vec<Trajectory>,
    pub status:  JobStatus,
    /// Final state of every worker assigned to the job.
    pub slaves:  Vec<SlaveState>,
}

impl JobOutcome {
    pub fn is_complete(&self) -> bool {
        self.status == JobStatus::Complete
    }
}

// ── Dispatch plumbing ─────────────────────────────────────────────────────────

type Connection = FramedConnection<BoxedStream>;

/// An initialised connection to the worker in `slot`.
struct Link {
    slot: usize,
    addr: String,
    conn: Connection,
}

/// Message from a dispatch task back to the scheduling loop.
enum Dispatch {
    /// The batch failed; the liveness check is under way.
    TimedOut { slot: usize },
    Done {
        link:    Link,
        batch:   Vec<ReplicaId>,
        results: Vec<Trajectory>,
        elapsed: Duration,
    },
    Failed {
        link:    Link,
        batch:   Vec<ReplicaId>,
        message: String,
    },
    Migrated {
        link:  Link,
        batch: Vec<ReplicaId>,
        cause: NetError,
    },
    Removed {
        slot:  usize,
        batch: Vec<ReplicaId>,
        cause: NetError,
    },
}

struct DispatchContext<C> {
    connector: Arc<C>,
    job:       JobSpec,
    config:    ManagerConfig,
}

// ── Manager ───────────────────────────────────────────────────────────────────

pub struct NetworkSimulationManager<C: Connector> {
    connector: Arc<C>,
    workers:   Vec<String>,
    config:    ManagerConfig,
}

impl<C: Connector> NetworkSimulationManager<C> {
    /// Manager over `workers` (addresses understood by `connector`).
    pub fn new(connector: Arc<C>, workers: Vec<String>, config: ManagerConfig) -> NetResult<Self> {
        if workers.is_empty() {
            return Err(NetError::NoWorkers);
        }
        Ok(Self { connector, workers, config })
    }

    #[inline]
    pub fn workers(&self) -> &[String] {
        &self.workers
    }

    /// Run every replica of `job` and wait for the outcome.
    pub async fn run(&self, job: JobSpec) -> NetResult<JobOutcome> {
        self.run_tracked(JobId(0), job, None).await
    }

    /// [`run`](Self::run), reporting progress on `events`.
    pub async fn run_tracked(
        &self,
        id:     JobId,
        job:    JobSpec,
        events: Option<mpsc::UnboundedSender<SimulationEvent>>,
    ) -> NetResult<JobOutcome> {
        let mut pending: VecDeque<ReplicaId> = (0..job.config.replicas).map(ReplicaId).collect();
        let state = SimulationState::new(id, job.model.name.clone(), &self.workers, pending.len(), &self.config);
        let mut tracker = SimulationTracker::new(state, events);
        let ctx = Arc::new(DispatchContext {
            connector: Arc::clone(&self.connector),
            job,
            config:    self.config.clone(),
        });
        info!(
            job = %id,
            model = %ctx.job.model.name,
            replicas = pending.len(),
            workers = self.workers.len(),
            "job started"
        );

        // ── INIT ──────────────────────────────────────────────────────────
        let mut idle: VecDeque<Link> = VecDeque::new();
        for (slot, addr) in self.workers.iter().enumerate() {
            let init = tokio::time::timeout(self.config.first_batch_timeout, open_session(&ctx, addr)).await;
            match init {
                Ok(Ok(conn)) => {
                    debug!(worker = %addr, "worker initialised");
                    idle.push_back(Link { slot, addr: addr.clone(), conn });
                }
                Ok(Err(e)) => {
                    warn!(worker = %addr, error = %e, "worker initialisation failed, removing");
                    tracker.remove_slave(slot);
                }
                Err(_) => {
                    warn!(worker = %addr, "worker initialisation timed out, removing");
                    tracker.remove_slave(slot);
                }
            }
        }

        // ── Schedule ──────────────────────────────────────────────────────
        let (tx, mut rx) = mpsc::unbounded_channel::<Dispatch>();
        let mut results: BTreeMap<ReplicaId, Trajectory> = BTreeMap::new();
        let mut attempts = vec![0u32; pending.len()];
        let mut failure: Option<NetError> = None;
        let mut running = 0usize;
        let max_attempts = self.config.max_task_attempts;

        loop {
            while failure.is_none() && !pending.is_empty() {
                let Some(link) = idle.pop_front() else { break };
                let (batch, timeout) = self.plan_batch(&mut tracker, link.slot, &mut pending);
                for r in &batch {
                    if let Some(n) = attempts.get_mut(r.index()) {
                        *n += 1;
                    }
                }
                debug!(worker = %link.addr, tasks = batch.len(), ?timeout, "batch dispatched");
                running += 1;
                tracker.increase_running();
                tracker.set_pending(pending.len());
                tokio::spawn(dispatch(Arc::clone(&ctx), link, batch, timeout, tx.clone()));
            }
            if running == 0 {
                break;
            }
            let Some(outcome) = rx.recv().await else { break };

            match outcome {
                Dispatch::TimedOut { slot } => {
                    tracker.update_slave(slot, SlaveState::timed_out);
                    continue;
                }
                Dispatch::Done { link, batch, results: trajectories, elapsed } => {
                    let accepted = merge_results(&mut results, &batch, trajectories);
                    let missing: Vec<ReplicaId> =
                        batch.iter().copied().filter(|r| !results.contains_key(r)).collect();
                    if !missing.is_empty() {
                        warn!(worker = %link.addr, missing = missing.len(), "incomplete results, rescheduling");
                        let exhausted = reschedule(&mut pending, missing, &attempts, max_attempts);
                        failure = failure.or(exhausted);
                    }
                    tracker.update_slave(link.slot, |s| s.update(elapsed, accepted));
                    tracker.add_completed(accepted);
                    idle.push_back(link);
                }
                Dispatch::Failed { link, batch, message } => {
                    error!(worker = %link.addr, tasks = batch.len(), error = %message, "batch rejected by the executor");
                    reschedule(&mut pending, batch, &attempts, max_attempts);
                    failure.get_or_insert(NetError::Executor(message));
                    idle.push_back(link);
                }
                Dispatch::Migrated { link, batch, cause } => {
                    warn!(worker = %link.addr, error = %cause, "batch lost, worker answered the ping; migrating");
                    let addr = link.addr.clone();
                    tracker.update_slave(link.slot, |s| {
                        s.force_expired_time_limit();
                        s.migrate(addr);
                    });
                    let exhausted = reschedule(&mut pending, batch, &attempts, max_attempts);
                    failure = failure.or(exhausted);
                    idle.push_back(link);
                }
                Dispatch::Removed { slot, batch, cause } => {
                    let worker = tracker.slave(slot).map(|s| s.worker.clone()).unwrap_or_default();
                    warn!(%worker, error = %cause, "worker lost, removing");
                    tracker.remove_slave(slot);
                    let exhausted = reschedule(&mut pending, batch, &attempts, max_attempts);
                    failure = failure.or(exhausted);
                }
            }
            running -= 1;
            tracker.decrease_running();
            tracker.set_pending(pending.len());
        }

        // ── Conclude ──────────────────────────────────────────────────────
        let closed = close_all(idle, &self.config).await;
        tracker.conclude();
        if let Some(e) = failure {
            error!(job = %id, completed = results.len(), error = %e, "job failed");
            return Err(e);
        }
        closed?;

        let missing: Vec<ReplicaId> = {
            let mut m: Vec<ReplicaId> = pending.into_iter().collect();
            m.sort_unstable();
            m
        };
        if missing.is_empty() {
            info!(job = %id, completed = results.len(), "job complete");
        } else {
            warn!(job = %id, completed = results.len(), missing = missing.len(), "job concluded without workers");
        }
        let status = if missing.is_empty() {
            JobStatus::Complete
        } else {
            JobStatus::Partial { missing }
        };
        Ok(JobOutcome {
            job:     id,
            results: results.into_values().collect(),
            status,
            slaves:  tracker.state().slaves.clone(),
        })
    }

    /// Take the next batch for `slot` and the timeout to wait for it.
    fn plan_batch(
        &self,
        tracker: &mut SimulationTracker,
        slot:    usize,
        pending: &mut VecDeque<ReplicaId>,
    ) -> (Vec<ReplicaId>, Duration) {
        let config = &self.config;
        let planned = tracker.update_slave(slot, |slave| {
            let mut window = slave.expected_tasks();
            if !slave.can_complete(window) {
                slave.force_expired_time_limit();
                window = slave.expected_tasks();
                warn!(worker = %slave.worker, window, "window halved to fit the running-time cap");
            }
            (window, slave.timeout(config))
        });
        let (window, timeout) = planned.unwrap_or((1, config.first_batch_timeout));
        let n = window.min(pending.len());
        (pending.drain(..n).collect(), timeout)
    }
}

// ── Free functions ────────────────────────────────────────────────────────────

/// Connect to `addr` and run the INIT handshake.
async fn open_session<C: Connector>(ctx: &DispatchContext<C>, addr: &str) -> NetResult<Connection> {
    let stream = ctx.connector.connect(addr).await?;
    let mut conn = FramedConnection::new(stream, ctx.config.max_frame_len);
    conn.send_command(Command::Init).await?;
    conn.send(&ctx.job).await?;
    conn.expect_command(Command::InitResponse).await?;
    Ok(conn)
}

/// One TASK round trip.
async fn exchange(conn: &mut Connection, batch: &[ReplicaId]) -> NetResult<TaskOutcome> {
    conn.send_command(Command::Task).await?;
    conn.send(&TaskBatch { replicas: batch.to_vec() }).await?;
    conn.expect_command(Command::Results).await?;
    conn.recv().await
}

/// Fresh connection + INIT + PING, all within `ping_timeout`.
async fn check_alive<C: Connector>(ctx: &DispatchContext<C>, addr: &str) -> NetResult<Connection> {
    let attempt = async {
        let mut conn = open_session(ctx, addr).await?;
        conn.send_command(Command::Ping).await?;
        conn.expect_command(Command::Pong).await?;
        Ok(conn)
    };
    match tokio::time::timeout(ctx.config.ping_timeout, attempt).await {
        Ok(result) => result,
        Err(_) => Err(NetError::Timeout(ctx.config.ping_timeout)),
    }
}

async fn dispatch<C: Connector>(
    ctx:     Arc<DispatchContext<C>>,
    mut link: Link,
    batch:   Vec<ReplicaId>,
    timeout: Duration,
    tx:      mpsc::UnboundedSender<Dispatch>,
) {
    let started = Instant::now();
    let attempt = match tokio::time::timeout(timeout, exchange(&mut link.conn, &batch)).await {
        Ok(result) => result,
        Err(_) => Err(NetError::Timeout(timeout)),
    };

    let outcome = match attempt {
        Ok(TaskOutcome::Completed(results)) => Dispatch::Done { link, batch, results, elapsed: started.elapsed() },
        Ok(TaskOutcome::Failed(message)) => Dispatch::Failed { link, batch, message },
        Err(cause) => {
            let _ = tx.send(Dispatch::TimedOut { slot: link.slot });
            let Link { slot, addr, conn: stale } = link;
            drop(stale);
            match check_alive(&ctx, &addr).await {
                Ok(conn) => Dispatch::Migrated { link: Link { slot, addr, conn }, batch, cause },
                Err(e) => {
                    debug!(worker = %addr, error = %e, "liveness check failed");
                    Dispatch::Removed { slot, batch, cause }
                }
            }
        }
    };
    let _ = tx.send(outcome);
}

/// Keep the trajectories that belong to `batch` and are new.
fn merge_results(
    results:      &mut BTreeMap<ReplicaId, Trajectory>,
    batch:        &[ReplicaId],
    trajectories: Vec<Trajectory>,
) -> usize {
    let mut accepted = 0;
    for t in trajectories {
        if batch.contains(&t.replica) && !results.contains_key(&t.replica) {
            results.insert(t.replica, t);
            accepted += 1;
        }
    }
    accepted
}

/// Put `batch` back at the front of the queue, order preserved.  Returns
/// `RetriesExhausted` for the first replica that has no attempt left.
fn reschedule(
    pending:      &mut VecDeque<ReplicaId>,
    batch:        Vec<ReplicaId>,
    attempts:     &[u32],
    max_attempts: u32,
) -> Option<NetError> {
    let exhausted = batch
        .iter()
        .copied()
        .find(|r| attempts.get(r.index()).is_some_and(|&n| n >= max_attempts))
        .map(|replica| NetError::RetriesExhausted { replica, attempts: max_attempts });
    for r in batch.into_iter().rev() {
        pending.push_front(r);
    }
    exhausted
}

/// CLOSE_CONNECTION handshake with every live worker.
///
/// A wrong echo is returned as `Protocol` once every link has been tried;
/// transport failures at this point are only logged.
async fn close_all(links: VecDeque<Link>, config: &ManagerConfig) -> NetResult<()> {
    let mut first_error = None;
    for mut link in links {
        let handshake = async {
            link.conn.send_command(Command::CloseConnection).await?;
            link.conn.expect_command(Command::CloseConnection).await
        };
        let result = match tokio::time::timeout(config.ping_timeout, handshake).await {
            Ok(result) => result,
            Err(_) => Err(NetError::Timeout(config.ping_timeout)),
        };
        match result {
            Ok(()) => debug!(worker = %link.addr, "connection closed"),
            Err(e @ NetError::Protocol { .. }) => {
                warn!(worker = %link.addr, error = %e, "wrong answer to CLOSE_CONNECTION");
                first_error.get_or_insert(e);
            }
            Err(e) => warn!(worker = %link.addr, error = %e, "close failed"),
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
