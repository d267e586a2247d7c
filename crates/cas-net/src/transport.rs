//! How the master reaches a worker.
//!
//! # Implementations
//!
//! - [`TcpConnector`]: plain TCP, `addr` is `host:port`.
//! - [`LoopbackConnector`]: in-process workers over `tokio::io::duplex`,
//!   `addr` is the name the worker was registered under.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream};
use tokio::net::TcpStream;

use crate::{NetResult, ReplicaExecutor, WorkerServer};

/// Byte stream of one worker connection.
pub trait AsyncStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> AsyncStream for T {}

pub type BoxedStream = Box<dyn AsyncStream>;

#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Open a fresh connection to `addr`.
    async fn connect(&self, addr: &str) -> NetResult<BoxedStream>;
}

// ── TCP ───────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, addr: &str) -> NetResult<BoxedStream> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Box::new(stream))
    }
}

// ── Loopback ──────────────────────────────────────────────────────────────────

type ConnectionFuture = Pin<Box<dyn Future<Output = ()> + Send>>;
type ConnectionHandler = Arc<dyn Fn(DuplexStream) -> ConnectionFuture + Send + Sync>;

/// In-process transport: every `connect` spawns the registered handler on
/// the far end of a fresh duplex pipe.
#[derive(Clone)]
pub struct LoopbackConnector {
    handlers:    HashMap<String, ConnectionHandler>,
    buffer_size: usize,
}

impl LoopbackConnector {
    pub fn new() -> Self {
        Self { handlers: HashMap::new(), buffer_size: 64 * 1024 }
    }

    /// Register `handler` under `name`; it receives the worker end of each
    /// new connection.
    pub fn with_handler<F, Fut>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(DuplexStream) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: ConnectionHandler = Arc::new(move |stream: DuplexStream| -> ConnectionFuture { Box::pin(handler(stream)) });
        self.handlers.insert(name.into(), handler);
        self
    }

    /// Register a [`WorkerServer`] under `name`.
    pub fn with_worker<E: ReplicaExecutor>(self, name: impl Into<String>, server: Arc<WorkerServer<E>>) -> Self {
        let name = name.into();
        let label = name.clone();
        self.with_handler(name, move |stream| {
            let server = Arc::clone(&server);
            let label = label.clone();
            async move {
                if let Err(e) = server.serve_connection(stream).await {
                    tracing::debug!(worker = %label, error = %e, "loopback connection ended");
                }
            }
        })
    }
}

impl Default for LoopbackConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for LoopbackConnector {
    async fn connect(&self, addr: &str) -> NetResult<BoxedStream> {
        let handler = self.handlers.get(addr).ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, format!("no loopback worker named {addr}"))
        })?;
        let (client, server) = tokio::io::duplex(self.buffer_size.max(1024));
        tokio::spawn(handler(server));
        Ok(Box::new(client))
    }
}
