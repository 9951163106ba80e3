//! Blob store trait definition.
//!
//! A blob store holds opaque byte content under a container name and a blob
//! name. The logger serializes a [`LogEntity`](crate::LogEntity) with an
//! [`EntityCodec`](crate::EntityCodec) before uploading it.

use async_trait::async_trait;
use bytes::Bytes;

use crate::{error::StoreResult, options::ClientOptions, types::ContentInfo};

/// Abstract blob-oriented object store.
///
/// | Method | Description |
/// |--------|-------------|
/// | [`ensure_container_named`](BlobStore::ensure_container_named) | Load a container client |
/// | [`ensure_blob_named`](BlobStore::ensure_blob_named) | Load a blob client inside a container |
/// | [`put`](BlobStore::put) | Upload content |
/// | [`get_stream`](BlobStore::get_stream) | Download content |
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Loads a client for `container`, creating it when `create_if_missing` is set.
    #[must_use = "store operations may fail and errors must be handled"]
    async fn ensure_container_named(
        &self,
        container: &str,
        create_if_missing: bool,
        options: &ClientOptions,
    ) -> StoreResult<()>;

    /// Loads a client for `blob` inside an already loaded `container`.
    ///
    /// The blob itself does not need to exist yet.
    #[must_use = "store operations may fail and errors must be handled"]
    async fn ensure_blob_named(&self, container: &str, blob: &str) -> StoreResult<()>;

    /// Uploads `content` to `blob`.
    ///
    /// With `overwrite == false`, an existing blob is rejected with
    /// [`FailureReason::ResourceAlreadyExists`](crate::FailureReason::ResourceAlreadyExists).
    #[must_use = "store operations may fail and errors must be handled"]
    async fn put(
        &self,
        container: &str,
        blob: &str,
        content: Bytes,
        overwrite: bool,
    ) -> StoreResult<ContentInfo>;

    /// Downloads the full content of `blob`.
    #[must_use = "store operations may fail and errors must be handled"]
    async fn get_stream(&self, container: &str, blob: &str) -> StoreResult<Bytes>;
}
