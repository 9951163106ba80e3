//! Store abstractions for the azlogger log persistence client.
//!
//! This crate provides the [`TableStore`] and [`BlobStore`] traits and the
//! types that cross them. The logger crate drives these traits through its
//! retry engines; cloud SDK adapters implement them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      AzLogger facade                        │
//! │     (filtering, key/name generation, configuration gate)    │
//! ├─────────────────────────────────────────────────────────────┤
//! │           TableService          │        BlobService        │
//! │        (load → operate → back off and retry)                │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    azlogger-storage                         │
//! │          TableStore trait   │   BlobStore trait             │
//! ├──────────────────┬──────────────────────────────────────────┤
//! │ Memory*Store     │      cloud SDK adapters                  │
//! │   (testing)      │        (production)                      │
//! └──────────────────┴──────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```
//! use azlogger_storage::{BlobStore, ClientOptions, EntityCodec, JsonCodec, LogEntity,
//!     MemoryBlobStore, SeverityLevel};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = MemoryBlobStore::new();
//!     store.ensure_container_named("azlogs-202601", true, &ClientOptions::default()).await?;
//!
//!     let entity = LogEntity::new("18", "row-1", SeverityLevel::Info, "svc");
//!     store.put("azlogs-202601", "Info/18/row-1.json", JsonCodec.encode(&entity)?, false).await?;
//!
//!     let bytes = store.get_stream("azlogs-202601", "Info/18/row-1.json").await?;
//!     assert_eq!(JsonCodec.decode(&bytes)?, Some(entity));
//!     Ok(())
//! }
//! ```
//!
//! # Error Handling
//!
//! All operations return [`StoreResult<T>`]. Implementations report requests
//! the service refused as [`StoreError::ServiceRejected`] with a
//! [`FailureReason`]; anything else is [`StoreError::Internal`] or
//! [`StoreError::Serialization`].
//!
//! # Feature Flags
//!
//! - **`testutil`**: Enables the `testutil` module with fault-injecting store wrappers. Enable this
//!   in `[dev-dependencies]` for integration tests.

#![deny(unsafe_code)]

pub mod blob;
pub mod codec;
pub mod error;
pub mod memory;
pub mod options;
pub mod table;
#[cfg(any(test, feature = "testutil"))]
#[allow(clippy::expect_used)]
pub mod testutil;
pub mod types;

// Re-export primary types at crate root for convenience
pub use blob::BlobStore;
pub use codec::{EntityCodec, JsonCodec};
pub use error::{BoxError, ConfigError, FailureReason, StoreError, StoreResult};
pub use memory::{
    MemoryBlobStore, MemoryTableStore, validate_blob_name, validate_container_name,
    validate_table_name,
};
pub use options::{ClientOptions, RetryMode, RetryOptions};
pub use table::TableStore;
pub use types::{
    ContentInfo, KeyError, LogEntity, SeverityLevel, VERBOSE_LABEL_SLOTS, VerboseLabels,
};
