//! Synchronous wrapper tests. These run on plain threads, outside any runtime.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

mod common;

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use azlogger::{
    AzLogger, BlockingAzLogger, LoggerError, MessageKey, ReadOptions, SequenceExecutionType,
    SeverityLevel, StoreOperation, StoreOperationSequence, WriteOptions,
};
use azlogger_storage::{
    ClientOptions, LogEntity, MemoryBlobStore, MemoryTableStore, StoreError, StoreResult,
    TableStore,
    testutil::{FlakyTableStore, StoreCall, transient_error},
};
use common::{Harness, fast_config, raw_log};
use tokio::net::{TcpListener, TcpStream};

/// Table store that opens a loopback connection before every table load,
/// the way a network-backed client would.
#[derive(Clone, Default)]
struct SocketTableStore {
    inner: MemoryTableStore,
}

#[async_trait]
impl TableStore for SocketTableStore {
    async fn ensure_named(
        &self,
        table: &str,
        create_if_missing: bool,
        options: &ClientOptions,
    ) -> StoreResult<()> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| StoreError::internal_with_source("bind failed", e))?;
        let addr = listener.local_addr().map_err(|e| StoreError::internal_with_source("addr", e))?;
        let (connected, accepted) = tokio::join!(TcpStream::connect(addr), listener.accept());
        connected.map_err(|e| StoreError::internal_with_source("connect failed", e))?;
        accepted.map_err(|e| StoreError::internal_with_source("accept failed", e))?;
        self.inner.ensure_named(table, create_if_missing, options).await
    }

    async fn put(&self, table: &str, entity: &LogEntity) -> StoreResult<()> {
        self.inner.put(table, entity).await
    }

    async fn get(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
    ) -> StoreResult<LogEntity> {
        self.inner.get(table, partition_key, row_key).await
    }
}

fn blocking() -> (FlakyTableStore, BlockingAzLogger) {
    let harness = Harness::new();
    (harness.table, BlockingAzLogger::new(harness.logger).unwrap())
}

#[test]
fn blob_round_trip() {
    let (_, logger) = blocking();
    let log = raw_log("sync", SeverityLevel::Warning);

    let receipt = logger.add_to_blob(&log, WriteOptions::default()).unwrap().into_result().unwrap();
    let read = logger
        .get_from_blob(&receipt.container_name, &receipt.blob_name, ReadOptions::default())
        .unwrap()
        .into_result()
        .unwrap();

    assert_eq!(read.source(), "sync");
    assert_eq!(read.message(), Some("integration test"));
}

#[test]
fn table_round_trip() {
    let (_, logger) = blocking();

    let receipt = logger
        .add_to_table(&raw_log("sync", SeverityLevel::Info), WriteOptions::default())
        .unwrap()
        .into_result()
        .unwrap();
    let read = logger
        .get_from_table(
            &receipt.table_name,
            &receipt.partition_key,
            &receipt.row_key,
            ReadOptions::default(),
        )
        .unwrap();

    assert!(read.is_success());
}

#[test]
fn backoff_blocks_the_calling_thread() {
    let (table, logger) = blocking();
    table.fail_next(StoreCall::Put, transient_error(), 2);

    let started = Instant::now();
    let response = logger
        .add_to_table(&raw_log("sync", SeverityLevel::Info), WriteOptions::default())
        .unwrap();

    assert!(response.is_success());
    assert_eq!(table.calls(StoreCall::Put), 3);
    assert!(started.elapsed() >= Duration::from_millis(3));
}

#[test]
fn configuration_through_block_on() {
    let (_, logger) = blocking();

    logger.block_on(|inner| inner.set_max_retry_attempts(Some(6))).unwrap();

    assert_eq!(logger.block_on(|inner| inner.max_retry_attempts()).unwrap(), Some(6));
}

#[test]
fn sequence_and_disposal() {
    let (_, logger) = blocking();
    let mut sequence = StoreOperationSequence::new().then(
        StoreOperation::AddToTable {
            raw_log: raw_log("sync", SeverityLevel::Info),
            options: WriteOptions::default(),
        },
        SequenceExecutionType::NextAlways,
    );
    assert!(logger.execute_sequence(&mut sequence).unwrap().is_success());

    logger.dispose();
    let err = logger
        .get_from_table("Logger202401Low", "7", "r", ReadOptions::default())
        .unwrap_err();
    assert!(matches!(err, LoggerError::Disposed));
    assert!(logger.into_inner().is_disposed());
}

#[test]
fn validation_errors_surface_synchronously() {
    let (_, logger) = blocking();

    let err = logger.get_from_blob("azlogs-202401", "", ReadOptions::default()).unwrap_err();

    assert!(matches!(err, LoggerError::Validation { key: MessageKey::BlobName, .. }));
}

#[test]
fn network_backed_store_runs_on_the_private_runtime() {
    let store = SocketTableStore::default();
    let logger = AzLogger::builder()
        .table_store(Arc::new(store.clone()))
        .blob_store(Arc::new(MemoryBlobStore::new()))
        .config(fast_config())
        .build()
        .unwrap();
    let logger = BlockingAzLogger::new(logger).unwrap();

    let response = logger
        .add_to_table(&raw_log("sync", SeverityLevel::Info), WriteOptions::default())
        .unwrap();

    assert!(response.is_success(), "{response:?}");
    assert_eq!(store.inner.table_names().len(), 1);
}

#[test]
fn blob_reads_do_not_create_missing_containers_by_default() {
    let harness = Harness::new();
    let blob = harness.blob.clone();
    let logger = BlockingAzLogger::new(harness.logger).unwrap();

    let response =
        logger.get_from_blob("azlogs-202312", "Info/7/r.json", ReadOptions::default()).unwrap();

    assert!(response.is_failure());
    assert!(response.has_message_key(MessageKey::BlobContainerName));
    assert!(blob.inner.container_names().is_empty());
}
