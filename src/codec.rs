//! Codecs (§4.2): JSON for graph items, a self-describing binary codec
//! (bincode framing) for bitmap blobs and OAuth records.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CodecError, CodecResult};

/// JSON codec for `Item`/graph payloads.
pub struct JsonCodec;

impl JsonCodec {
    pub fn encode<T: Serialize>(value: &T) -> CodecResult<Vec<u8>> {
        serde_json::to_vec_pretty(value).map_err(|e| CodecError::Encode(e.to_string()))
    }

    pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }
}

/// Self-describing binary codec for index blobs and OAuth records.
/// Unknown fields on structures that derive `#[serde(default)]` on their
/// optional members are tolerated by construction, matching the spec's
/// forward-compatibility requirement for `.gob`-style persistence.
pub struct BinCodec;

impl BinCodec {
    pub fn encode<T: Serialize>(value: &T) -> CodecResult<Vec<u8>> {
        bincode::serialize(value).map_err(|e| CodecError::Encode(e.to_string()))
    }

    pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> CodecResult<T> {
        bincode::deserialize(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }
}
