//! Worker side of the protocol.
//!
//! ```text
//! INIT  JobSpec      → prepare            → INIT_RESPONSE
//! TASK  TaskBatch    → execute (blocking) → RESULTS  TaskOutcome
//! PING               →                      PONG
//! CLOSE_CONNECTION   →                      CLOSE_CONNECTION, then hang up
//! ```
//!
//! One connection serves one job at a time; a later INIT replaces it.  An
//! executor error is answered with `TaskOutcome::Failed` and the connection
//! stays open.

use std::marker::PhantomData;
use std::sync::Arc;

use cas_core::ReplicaId;
use cas_sim::{Trajectory, run_ids};
use cas_state::CollectiveState;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::{
    Command, FramedConnection, JobSpec, ManagerConfig, ModelSpec, NetError, NetResult, TaskBatch, TaskOutcome,
};

/// Runs replicas for the worker.
pub trait ReplicaExecutor: Send + Sync + 'static {
    /// Called on INIT.  An error closes the connection without an answer.
    fn prepare(&self, _job: &JobSpec) -> NetResult<()> {
        Ok(())
    }

    /// One trajectory per replica in `replicas`.
    fn execute(&self, job: &JobSpec, replicas: &[ReplicaId]) -> NetResult<Vec<Trajectory>>;
}

/// Executor that builds the initial state from the [`ModelSpec`] and runs
/// the replicas with `cas-sim`.
pub struct SimulationExecutor<S, F> {
    build:  F,
    _state: PhantomData<fn() -> S>,
}

impl<S, F> SimulationExecutor<S, F>
where
    S: CollectiveState + Send + Sync,
    F: Fn(&ModelSpec) -> Result<S, String> + Send + Sync + 'static,
{
    pub fn new(build: F) -> Self {
        Self { build, _state: PhantomData }
    }
}

impl<S, F> ReplicaExecutor for SimulationExecutor<S, F>
where
    S: CollectiveState + Send + Sync + 'static,
    F: Fn(&ModelSpec) -> Result<S, String> + Send + Sync + 'static,
{
    fn prepare(&self, job: &JobSpec) -> NetResult<()> {
        job.config.validate().map_err(|e| NetError::Executor(e.to_string()))?;
        (self.build)(&job.model).map(drop).map_err(NetError::Executor)
    }

    fn execute(&self, job: &JobSpec, replicas: &[ReplicaId]) -> NetResult<Vec<Trajectory>> {
        let initial = (self.build)(&job.model).map_err(NetError::Executor)?;
        run_ids(&job.config, &initial, replicas.to_vec()).map_err(|e| NetError::Executor(e.to_string()))
    }
}

// ── Server ────────────────────────────────────────────────────────────────────

pub struct WorkerServer<E> {
    executor:      Arc<E>,
    max_frame_len: usize,
}

impl<E: ReplicaExecutor> WorkerServer<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor:      Arc::new(executor),
            max_frame_len: ManagerConfig::default().max_frame_len,
        }
    }

    pub fn with_max_frame_len(mut self, max_frame_len: usize) -> Self {
        self.max_frame_len = max_frame_len;
        self
    }

    /// Serve one master connection until CLOSE_CONNECTION or hang-up.
    pub async fn serve_connection<S>(&self, stream: S) -> NetResult<()>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send,
    {
        let mut conn = FramedConnection::new(stream, self.max_frame_len);
        let mut job: Option<Arc<JobSpec>> = None;

        loop {
            let command: Command = match conn.recv().await {
                Ok(command) => command,
                Err(e) if e.is_disconnect() => return Ok(()),
                Err(e) => return Err(e),
            };
            match command {
                Command::Init => {
                    let spec: JobSpec = conn.recv().await?;
                    self.executor.prepare(&spec)?;
                    debug!(model = %spec.model.name, replicas = spec.config.replicas, "job initialised");
                    job = Some(Arc::new(spec));
                    conn.send_command(Command::InitResponse).await?;
                }
                Command::Task => {
                    let Some(spec) = job.clone() else {
                        return Err(NetError::Protocol { expected: Command::Init, found: Command::Task });
                    };
                    let batch: TaskBatch = conn.recv().await?;
                    let tasks = batch.replicas.len();
                    let executor = Arc::clone(&self.executor);
                    let run = tokio::task::spawn_blocking(move || executor.execute(&spec, &batch.replicas));
                    let outcome = match run.await {
                        Ok(Ok(results)) => {
                            debug!(tasks, "batch executed");
                            TaskOutcome::Completed(results)
                        }
                        Ok(Err(e)) => {
                            warn!(tasks, error = %e, "batch failed");
                            TaskOutcome::Failed(e.to_string())
                        }
                        Err(e) => {
                            warn!(tasks, error = %e, "executor panicked");
                            TaskOutcome::Failed(e.to_string())
                        }
                    };
                    conn.send_command(Command::Results).await?;
                    conn.send(&outcome).await?;
                }
                Command::Ping => conn.send_command(Command::Pong).await?,
                Command::CloseConnection => {
                    conn.send_command(Command::CloseConnection).await?;
                    return Ok(());
                }
                other => return Err(NetError::Protocol { expected: Command::Task, found: other }),
            }
        }
    }

    /// Accept master connections forever, one task per connection.
    pub async fn listen(self: Arc<Self>, listener: TcpListener) -> NetResult<()> {
        info!(addr = ?listener.local_addr().ok(), "worker listening");
        loop {
            let (stream, peer) = listener.accept().await?;
            stream.set_nodelay(true)?;
            let server = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(e) = server.serve_connection(stream).await {
                    warn!(%peer, error = %e, "master connection failed");
                }
            });
        }
    }
}
