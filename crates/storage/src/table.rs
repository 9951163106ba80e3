//! Table store trait definition.
//!
//! A table store persists [`LogEntity`] records addressed by partition key
//! and row key inside a named table. Implementations wrap a cloud table
//! service SDK; [`MemoryTableStore`](crate::MemoryTableStore) is the
//! in-process reference implementation.

use async_trait::async_trait;

use crate::{error::StoreResult, options::ClientOptions, types::LogEntity};

/// Abstract table-oriented store.
///
/// | Method | Description |
/// |--------|-------------|
/// | [`ensure_named`](TableStore::ensure_named) | Load a client for a table, creating it if asked |
/// | [`put`](TableStore::put) | Insert an entity |
/// | [`get`](TableStore::get) | Read an entity by partition key and row key |
///
/// Every method may fail with [`StoreError::ServiceRejected`](crate::StoreError::ServiceRejected)
/// carrying the service's reason code, or with a local error.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Loads a client for `table`, creating the table when `create_if_missing` is set.
    #[must_use = "store operations may fail and errors must be handled"]
    async fn ensure_named(
        &self,
        table: &str,
        create_if_missing: bool,
        options: &ClientOptions,
    ) -> StoreResult<()>;

    /// Inserts `entity` into `table`.
    ///
    /// Inserting an entity whose keys already exist is rejected with
    /// [`FailureReason::ResourceAlreadyExists`](crate::FailureReason::ResourceAlreadyExists).
    #[must_use = "store operations may fail and errors must be handled"]
    async fn put(&self, table: &str, entity: &LogEntity) -> StoreResult<()>;

    /// Reads the entity addressed by `partition_key` and `row_key` from `table`.
    #[must_use = "store operations may fail and errors must be handled"]
    async fn get(&self, table: &str, partition_key: &str, row_key: &str)
    -> StoreResult<LogEntity>;
}
