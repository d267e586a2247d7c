//! Payload encoding.  bincode keeps frames compact and needs no schema.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{NetError, NetResult};

pub fn encode<M: Serialize>(message: &M) -> NetResult<Vec<u8>> {
    bincode::serialize(message).map_err(|e| NetError::Codec(e.to_string()))
}

pub fn decode<M: DeserializeOwned>(bytes: &[u8]) -> NetResult<M> {
    bincode::deserialize(bytes).map_err(|e| NetError::Codec(e.to_string()))
}
