use std::time::Duration;

use cas_core::ReplicaId;
use thiserror::Error;

use crate::Command;

#[derive(Debug, Error)]
pub enum NetError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(String),

    #[error("protocol error: expected {expected}, found {found}")]
    Protocol { expected: Command, found: Command },

    #[error("no answer within {0:?}")]
    Timeout(Duration),

    #[error("no workers available")]
    NoWorkers,

    #[error("executor error: {0}")]
    Executor(String),

    #[error("{replica} was lost on all {attempts} attempts")]
    RetriesExhausted { replica: ReplicaId, attempts: u32 },

    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge { len: usize, max: usize },
}

impl NetError {
    /// True when the peer closed the stream between frames.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
    }
}

pub type NetResult<T> = Result<T, NetError>;
