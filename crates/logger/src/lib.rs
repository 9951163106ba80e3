//! Structured log persistence to table and blob stores.
//!
//! [`AzLogger`] takes a [`RawLog`], filters it, generates its keys and target
//! names, and hands it to a retry engine that loads the table or blob client
//! and writes, backing off and retrying transient failures. Reads go the other
//! way and pass through the read filter before reaching the caller.
//!
//! # Architecture
//!
//! ```text
//! RawLog ─► ReadOnlyRawLog ─► LogFilter (write) ─► GenerationStrategy
//!                                                        │
//!                          ┌─────────────────────────────┴──────┐
//!                          ▼                                    ▼
//!                    TableService                          BlobService
//!             (ensure table → add/get)         (ensure container → ensure blob → put/get)
//!                          │                                    │
//!                          ▼                                    ▼
//!                     TableStore                            BlobStore
//!                          │                                    │
//!                          └──────────► LogFilter (read) ◄──────┘
//!                                              │
//!                                              ▼
//!                                         ReadOnlyLog
//! ```
//!
//! All mutable state lives behind one async gate inside [`AzLogger`].
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use azlogger::{AzLogger, LogFilter, RawLog, ReadOptions, SeverityLevel, WriteOptions};
//! use azlogger_storage::{MemoryBlobStore, MemoryTableStore};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let logger = AzLogger::builder()
//!     .table_store(Arc::new(MemoryTableStore::new()))
//!     .blob_store(Arc::new(MemoryBlobStore::new()))
//!     .filter(LogFilter::min_severity(SeverityLevel::Warning))
//!     .build()?;
//!
//! let log = RawLog::builder().source("payments").severity_level(SeverityLevel::Error).build();
//! let receipt = logger.add_to_blob(&log, WriteOptions::default()).await?.into_result()?;
//!
//! let read = logger
//!     .get_from_blob(&receipt.container_name, &receipt.blob_name, ReadOptions::default())
//!     .await?
//!     .into_result()?;
//! assert_eq!(read.severity_level(), SeverityLevel::Error);
//! # Ok(())
//! # }
//! ```
//!
//! # Error Handling
//!
//! Operations return `Result<Response<T>>`. The outer `Err` is reserved for
//! disposal, gate timeouts, cancellation and malformed arguments. Every store
//! outcome is a [`Response`] with a [`Status`] and [`Diagnostic`]s keyed by
//! [`MessageKey`].
//!
//! # Feature Flags
//!
//! - **`failpoints`**: Enables the `retry-before-sleep` failpoint in both retry engines.

#![deny(unsafe_code)]

pub mod blob_service;
pub mod blocking;
pub mod clock;
pub mod config;
pub mod error;
pub mod filter;
pub mod logger;
pub mod metrics;
pub mod model;
pub mod options;
pub mod response;
pub mod retry;
pub mod sequence;
pub mod strategy;
pub mod table_service;

// Re-export primary types at crate root for convenience
pub use azlogger_storage::{RetryOptions, SeverityLevel};
pub use blob_service::BlobService;
pub use blocking::BlockingAzLogger;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{BackoffConfig, LoggerConfig};
pub use error::{LoggerError, Result};
pub use filter::{LogFilter, ReadPredicate, WritePredicate};
pub use logger::AzLogger;
pub use metrics::{LoggerMetrics, MetricsSnapshot};
pub use model::{BlobReceipt, RawLog, ReadOnlyLog, ReadOnlyRawLog, TableReceipt};
pub use options::{ReadOptions, WriteOptions};
pub use response::{Diagnostic, MessageKey, Response, Status};
pub use retry::{Backoff, OperationKind, RetryClassifier};
pub use sequence::{
    OperationValue, SequenceExecutionType, SequencedOperation, StoreOperation,
    StoreOperationSequence,
};
pub use strategy::{BlobNameDelegate, DelegateContainer, LabelDelegate, NameDelegate};
pub use table_service::TableService;
pub use tokio_util::sync::CancellationToken;
