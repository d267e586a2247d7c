//! Length-prefixed frames over any async byte stream.
//!
//! A frame is a big-endian `u32` length followed by that many payload bytes.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::codec::{decode, encode};
use crate::{Command, NetError, NetResult};

pub struct FramedConnection<S> {
    stream:        S,
    max_frame_len: usize,
}

impl<S: AsyncRead + AsyncWrite + Unpin + Send> FramedConnection<S> {
    pub fn new(stream: S, max_frame_len: usize) -> Self {
        Self { stream, max_frame_len }
    }

    /// Encode `message` and write it as one frame.
    pub async fn send<M: Serialize + Sync>(&mut self, message: &M) -> NetResult<()> {
        let bytes = encode(message)?;
        if bytes.len() > self.max_frame_len {
            return Err(NetError::FrameTooLarge { len: bytes.len(), max: self.max_frame_len });
        }
        let len = u32::try_from(bytes.len())
            .map_err(|_| NetError::FrameTooLarge { len: bytes.len(), max: u32::MAX as usize })?;
        self.stream.write_u32(len).await?;
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Read one frame and decode it.
    pub async fn recv<M: DeserializeOwned>(&mut self) -> NetResult<M> {
        let len = self.stream.read_u32().await? as usize;
        if len > self.max_frame_len {
            return Err(NetError::FrameTooLarge { len, max: self.max_frame_len });
        }
        let mut buf = vec![0u8; len];
        self.stream.read_exact(&mut buf).await?;
        decode(&buf)
    }

    pub async fn send_command(&mut self, command: Command) -> NetResult<()> {
        self.send(&command).await
    }

    /// Read a command and fail with `Protocol` unless it is `expected`.
    pub async fn expect_command(&mut self, expected: Command) -> NetResult<()> {
        let found: Command = self.recv().await?;
        if found == expected {
            Ok(())
        } else {
            Err(NetError::Protocol { expected, found })
        }
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}
