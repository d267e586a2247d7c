//! `Master` — accepts client jobs and runs each on the registered workers.
//!
//! ```text
//! client → master   INIT  JobSpec
//! master → client   INIT_RESPONSE
//!                   … NetworkSimulationManager runs the job …
//! master → client   DATA_RESPONSE  JobOutcome
//! ```
//!
//! Running jobs report through an `mpsc` queue that the master folds into
//! its [`MasterState`]; every change is published on a `watch` channel.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tracing::{info, warn};

use crate::{
    Command, Connector, FramedConnection, JobId, JobOutcome, JobSpec, ManagerConfig, MasterState,
    NetResult, NetworkSimulationManager,
};

pub struct Master<C: Connector> {
    state:     Mutex<MasterState>,
    snapshots: watch::Sender<MasterState>,
    connector: Arc<C>,
    config:    ManagerConfig,
    next_job:  AtomicU64,
}

impl<C: Connector> Master<C> {
    pub fn new(address: impl Into<String>, connector: Arc<C>, config: ManagerConfig) -> Self {
        let state = MasterState::new(address);
        let (snapshots, _) = watch::channel(state.clone());
        Self {
            state: Mutex::new(state),
            snapshots,
            connector,
            config,
            next_job: AtomicU64::new(0),
        }
    }

    // ── Workers ───────────────────────────────────────────────────────────

    /// Register or refresh a worker.  Returns true if it was unknown.
    pub fn register_worker(&self, worker: impl Into<String>) -> bool {
        let worker = worker.into();
        let added = self.mutate(|s| s.add_worker(worker.clone()));
        if added {
            info!(%worker, "worker registered");
        }
        added
    }

    pub fn remove_worker(&self, worker: &str) -> bool {
        self.mutate(|s| s.remove_worker(worker))
    }

    pub fn reset_keep_alive(&self) {
        self.mutate(MasterState::reset_keep_alive);
    }

    /// Drop workers that did not re-register since the last reset.
    pub fn clean_keep_alive(&self) -> Vec<String> {
        let silent = self.mutate(MasterState::clean_keep_alive);
        for worker in &silent {
            warn!(%worker, "worker silent since last keep-alive, dropped");
        }
        silent
    }

    // ── State ─────────────────────────────────────────────────────────────

    pub fn subscribe(&self) -> watch::Receiver<MasterState> {
        self.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> MasterState {
        self.state.lock().clone()
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut MasterState) -> R) -> R {
        let mut state = self.state.lock();
        let result = f(&mut state);
        self.snapshots.send_replace(state.clone());
        result
    }

    // ── Jobs ──────────────────────────────────────────────────────────────

    /// Run `job` on the currently registered workers.
    pub async fn run_job(&self, job: JobSpec) -> NetResult<JobOutcome> {
        let id = JobId(self.next_job.fetch_add(1, Ordering::Relaxed));
        let workers = self.state.lock().workers();
        let manager = NetworkSimulationManager::new(Arc::clone(&self.connector), workers, self.config.clone())?;

        let (events, mut queue) = mpsc::unbounded_channel();
        // The tracker owns the sender, so the drain ends with the run.
        let run = async move { manager.run_tracked(id, job, Some(events)).await };
        let drain = async {
            while let Some(event) = queue.recv().await {
                self.mutate(|s| s.apply(event));
            }
        };
        let (outcome, ()) = tokio::join!(run, drain);
        outcome
    }

    /// Serve one client session.
    pub async fn serve_client<S>(&self, stream: S) -> NetResult<()>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let mut conn = FramedConnection::new(stream, self.config.max_frame_len);
        conn.expect_command(Command::Init).await?;
        let job: JobSpec = conn.recv().await?;
        conn.send_command(Command::InitResponse).await?;
        info!(model = %job.model.name, replicas = job.config.replicas, "client job accepted");

        let outcome = self.run_job(job).await?;
        conn.send_command(Command::DataResponse).await?;
        conn.send(&outcome).await
    }

    /// Accept client connections forever.
    pub async fn listen_clients(self: Arc<Self>, listener: TcpListener) -> NetResult<()> {
        info!(addr = ?listener.local_addr().ok(), "master listening");
        loop {
            let (stream, peer) = listener.accept().await?;
            stream.set_nodelay(true)?;
            let master = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(e) = master.serve_client(stream).await {
                    warn!(%peer, error = %e, "client session failed");
                }
            });
        }
    }
}

/// Client side: submit `job` to a master and wait for its outcome.
pub async fn submit_job<S>(stream: S, job: &JobSpec, max_frame_len: usize) -> NetResult<JobOutcome>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    let mut conn = FramedConnection::new(stream, max_frame_len);
    conn.send_command(Command::Init).await?;
    conn.send(job).await?;
    conn.expect_command(Command::InitResponse).await?;
    conn.expect_command(Command::DataResponse).await?;
    conn.recv().await
}
