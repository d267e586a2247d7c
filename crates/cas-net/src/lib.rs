//! `cas-net` — master/worker distribution of simulation replicas.
//!
//! # Components
//!
//! | Module             | Contents                                                  |
//! |--------------------|-----------------------------------------------------------|
//! | [`command`]        | `Command`, `JobSpec`, `ModelSpec`, `TaskBatch`, `TaskOutcome`, `JobId` |
//! | [`codec`]          | bincode payload encoding                                  |
//! | [`frame`]          | `FramedConnection`: length-prefixed frames                |
//! | [`transport`]      | `Connector`, `TcpConnector`, `LoopbackConnector`          |
//! | [`config`]         | `ManagerConfig`                                           |
//! | [`slave_state`]    | `SlaveState`: task window, RTT estimate, timeouts         |
//! | [`simulation_state`] | `SimulationState`, `SimulationTracker`, `SimulationEvent` |
//! | [`master_state`]   | `MasterState`: workers, running jobs, keep-alive          |
//! | [`manager`]        | `NetworkSimulationManager`, `JobOutcome`, `JobStatus`     |
//! | [`worker`]         | `WorkerServer`, `ReplicaExecutor`, `SimulationExecutor`   |
//! | [`master`]         | `Master` client sessions, `submit_job`                    |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! let server = Arc::new(WorkerServer::new(SimulationExecutor::new(build_model)));
//! let connector = LoopbackConnector::new().with_worker("w0", server);
//! let manager = NetworkSimulationManager::new(Arc::new(connector), vec!["w0".into()], ManagerConfig::default())?;
//! let outcome = manager.run(job).await?;
//! ```

pub mod codec;
pub mod command;
pub mod config;
pub mod error;
pub mod frame;
pub mod manager;
pub mod master;
pub mod master_state;
pub mod simulation_state;
pub mod slave_state;
pub mod transport;
pub mod worker;


pub use command::{Command, JobId, JobSpec, ModelSpec, TaskBatch, TaskOutcome};
pub use config::ManagerConfig;
pub use error::{NetError, NetResult};
pub use frame::FramedConnection;
pub use manager::{JobOutcome, JobStatus, NetworkSimulationManager};
pub use master::{Master, submit_job};
pub use master_state::MasterState;
pub use simulation_state::{SimulationEvent, SimulationState, SimulationTracker};
pub use slave_state::{SlaveState, SlaveStatus};
pub use transport::{AsyncStream, BoxedStream, Connector, LoopbackConnector, TcpConnector};
pub use worker::{ReplicaExecutor, SimulationExecutor, WorkerServer};
