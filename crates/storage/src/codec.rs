//! Entity encoding for blob storage.

use bytes::Bytes;

use crate::{
    error::{StoreError, StoreResult},
    types::LogEntity,
};

/// Converts a [`LogEntity`] to and from blob content.
///
/// `decode` distinguishes a payload that decodes to nothing (`Ok(None)`,
/// e.g. an empty blob or a JSON `null`) from a payload that fails to decode
/// (`Err`).
pub trait EntityCodec: Send + Sync {
    /// Encodes `entity` into bytes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if the entity cannot be encoded.
    fn encode(&self, entity: &LogEntity) -> StoreResult<Bytes>;

    /// Decodes bytes into an entity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if the content is malformed.
    fn decode(&self, content: &[u8]) -> StoreResult<Option<LogEntity>>;
}

/// JSON codec backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl EntityCodec for JsonCodec {
    fn encode(&self, entity: &LogEntity) -> StoreResult<Bytes> {
        serde_json::to_vec(entity)
            .map(Bytes::from)
            .map_err(|e| StoreError::serialization_with_source("failed to encode log entity", e))
    }

    fn decode(&self, content: &[u8]) -> StoreResult<Option<LogEntity>> {
        if content.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        serde_json::from_slice::<Option<LogEntity>>(content)
            .map_err(|e| StoreError::serialization_with_source("failed to decode log entity", e))
    }
}
