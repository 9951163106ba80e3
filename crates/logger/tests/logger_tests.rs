//! End-to-end tests for the `AzLogger` facade over in-memory stores.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

mod common;

use std::sync::Arc;

use azlogger::{
    LogFilter, LoggerConfig, LoggerError, MessageKey, ReadOnlyRawLog, ReadOptions, SeverityLevel,
    WriteOptions,
};
use azlogger_storage::{
    BlobStore, ClientOptions, EntityCodec, FailureReason, JsonCodec, LogEntity, MemoryBlobStore,
    MemoryTableStore, RetryOptions,
    testutil::{FlakyBlobStore, FlakyTableStore, StoreCall, transient_error},
};
use common::{Harness, fast_config, raw_log};

// ---------------------------------------------------------------------------
// Default naming
// ---------------------------------------------------------------------------

#[tokio::test]
async fn add_to_table_uses_default_table_name() {
    let harness = Harness::new();

    let receipt = harness
        .logger
        .add_to_table(&raw_log("S", SeverityLevel::Info), WriteOptions::default())
        .await
        .unwrap()
        .into_result()
        .unwrap();

    assert_eq!(receipt.table_name, "Logger202401Low");
    assert_eq!(receipt.partition_key, "7");
    assert!(receipt.row_key.starts_with("Info_S_"));
    assert_eq!(harness.table.inner.entity_count("Logger202401Low"), Some(1));
}

#[tokio::test]
async fn high_severity_goes_to_high_table() {
    let harness = Harness::new();

    let receipt = harness
        .logger
        .add_to_table(&raw_log("S", SeverityLevel::Exception), WriteOptions::default())
        .await
        .unwrap()
        .into_result()
        .unwrap();

    assert_eq!(receipt.table_name, "Logger202401High");
}

#[tokio::test]
async fn table_name_case_mismatch_stops_after_one_attempt() {
    let table = FlakyTableStore::new(MemoryTableStore::with_table("LOGGER202401LOW"));
    let harness = Harness::with_stores(table, FlakyBlobStore::default(), fast_config());

    let response = harness
        .logger
        .add_to_table(&raw_log("S", SeverityLevel::Info), WriteOptions::default())
        .await
        .unwrap();

    assert!(response.is_failure());
    assert!(response.has_message_key(MessageKey::TableName));
    assert_eq!(
        response.error().and_then(LoggerError::store_error).and_then(|e| e.reason()),
        Some(&FailureReason::ResourceNameCaseMismatch)
    );
    assert_eq!(harness.table.calls(StoreCall::Ensure), 1);
    assert_eq!(harness.table.calls(StoreCall::Put), 0);
}

#[tokio::test]
async fn get_from_blob_with_constant_names_round_trips() {
    let blob = MemoryBlobStore::with_container("constantblobcontainername");
    let mut stored = LogEntity::new("7", "Warning_svc_1", SeverityLevel::Warning, "svc");
    stored.message = Some("disk almost full".to_owned());
    stored.category = Some("storage".to_owned());
    let content = JsonCodec.encode(&stored).unwrap();
    blob.put("constantblobcontainername", "/ConstantBlobName", content, false).await.unwrap();
    let harness =
        Harness::with_stores(FlakyTableStore::default(), FlakyBlobStore::new(blob), fast_config());

    let read = harness
        .logger
        .get_from_blob("constantblobcontainername", "/ConstantBlobName", ReadOptions::default())
        .await
        .unwrap()
        .into_result()
        .unwrap();

    assert_eq!(read.entity(), &stored);
    assert_eq!(read.message(), Some("disk almost full"));
    assert_eq!(read.severity_level(), SeverityLevel::Warning);

    let missing = harness
        .logger
        .get_from_blob("constantblobcontainername", "/OtherBlobName", ReadOptions::default())
        .await
        .unwrap();
    assert!(missing.is_failure());
}

#[tokio::test]
async fn blob_write_then_read() {
    let harness = Harness::new();
    let mut log = raw_log("payments", SeverityLevel::Error);
    log.verbose.insert("tenant".to_owned(), "acme".to_owned());

    let receipt = harness
        .logger
        .add_to_blob(&log, WriteOptions::default())
        .await
        .unwrap()
        .into_result()
        .unwrap();

    assert_eq!(receipt.container_name, "azlogs-202401");
    assert!(receipt.blob_name.starts_with("Error/7/Error_payments_"));
    assert!(receipt.content.content_length > 0);

    let read = harness
        .logger
        .get_from_blob(&receipt.container_name, &receipt.blob_name, ReadOptions::default())
        .await
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(read.source(), "payments");
    assert_eq!(read.verbose().get("tenant").map(String::as_str), Some("acme"));
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

#[tokio::test]
async fn write_filter_denial_never_reaches_the_store() {
    let harness = Harness::new();
    harness
        .logger
        .set_log_filter(LogFilter::default().with_writing(|log| log.source() != "noisy"))
        .await
        .unwrap();

    let table = harness
        .logger
        .add_to_table(&raw_log("noisy", SeverityLevel::Info), WriteOptions::default())
        .await
        .unwrap();
    let blob = harness
        .logger
        .add_to_blob(&raw_log("noisy", SeverityLevel::Info), WriteOptions::default())
        .await
        .unwrap();

    assert!(table.has_message_key(MessageKey::WritingNotAllowed));
    assert!(blob.has_message_key(MessageKey::WritingNotAllowed));
    assert!(matches!(table.error(), Some(LoggerError::WritingNotAllowed)));
    assert_eq!(harness.table.total_calls(), 0);
    assert_eq!(harness.blob.total_calls(), 0);
    assert_eq!(harness.logger.metrics().snapshot().writes_denied, 2);
}

#[tokio::test]
async fn read_filter_denial_discards_the_value() {
    let harness = Harness::new();
    let receipt = harness
        .logger
        .add_to_table(&raw_log("S", SeverityLevel::Info), WriteOptions::default())
        .await
        .unwrap()
        .into_result()
        .unwrap();
    harness
        .logger
        .set_log_filter(LogFilter::min_severity(SeverityLevel::Warning))
        .await
        .unwrap();

    let response = harness
        .logger
        .get_from_table(
            &receipt.table_name,
            &receipt.partition_key,
            &receipt.row_key,
            ReadOptions::default(),
        )
        .await
        .unwrap();

    assert!(response.is_failure());
    assert!(!response.has_value());
    assert!(response.has_message_key(MessageKey::ReadingNotAllowed));
    assert_eq!(harness.table.calls(StoreCall::Get), 1);
    assert_eq!(harness.logger.metrics().snapshot().reads_denied, 1);
}

// ---------------------------------------------------------------------------
// Delegates
// ---------------------------------------------------------------------------

#[tokio::test]
async fn container_delegate_then_cleared_reverts_to_default() {
    let harness = Harness::new();
    let log = raw_log("S", SeverityLevel::Info);
    harness
        .logger
        .set_blob_container_name_delegate(Some(Arc::new(|log: &ReadOnlyRawLog| {
            format!("{}-logs", log.source().to_lowercase())
        })))
        .await
        .unwrap();

    let delegated = harness
        .logger
        .add_to_blob(&log, WriteOptions::default())
        .await
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(delegated.container_name, "s-logs");

    let overridden = harness
        .logger
        .add_to_blob(&log, WriteOptions::builder().blob_container_name("explicit").build())
        .await
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(overridden.container_name, "explicit");

    harness.logger.set_blob_container_name_delegate(None).await.unwrap();
    let defaulted = harness
        .logger
        .add_to_blob(&log, WriteOptions::default())
        .await
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(defaulted.container_name, "azlogs-202401");
}

#[tokio::test]
async fn update_delegates_replaces_every_slot() {
    let harness = Harness::new();
    harness
        .logger
        .update_delegates(
            azlogger::DelegateContainer::new()
                .with_table_name(|_| "AuditLogs".to_owned())
                .with_partition_key(|log| log.source().to_owned())
                .with_row_key(|_| "fixed-row".to_owned()),
        )
        .await
        .unwrap();

    let receipt = harness
        .logger
        .add_to_table(&raw_log("billing", SeverityLevel::Info), WriteOptions::default())
        .await
        .unwrap()
        .into_result()
        .unwrap();
    assert_eq!(receipt.table_name, "AuditLogs");
    assert_eq!(receipt.partition_key, "billing");
    assert_eq!(receipt.row_key, "fixed-row");

    assert!(harness.logger.table_name_delegate().await.unwrap().is_some());
    assert!(harness.logger.blob_name_delegate().await.unwrap().is_none());

    harness.logger.update_delegates(azlogger::DelegateContainer::new()).await.unwrap();
    assert!(harness.logger.table_name_delegate().await.unwrap().is_none());
}

#[tokio::test]
async fn empty_generated_key_fails_before_any_store_call() {
    let harness = Harness::new();
    harness
        .logger
        .set_row_key_delegate(Some(Arc::new(|_: &ReadOnlyRawLog| String::new())))
        .await
        .unwrap();

    let response = harness
        .logger
        .add_to_table(&raw_log("S", SeverityLevel::Info), WriteOptions::default())
        .await
        .unwrap();

    assert!(response.is_failure());
    assert!(response.has_message_key(MessageKey::RowKey));
    assert_eq!(harness.table.total_calls(), 0);
}

#[tokio::test]
async fn duplicate_row_key_is_permanent() {
    let harness = Harness::new();
    let options = WriteOptions::builder().row_key("same").build();
    let log = raw_log("S", SeverityLevel::Info);

    assert!(harness.logger.add_to_table(&log, options.clone()).await.unwrap().is_success());
    let second = harness.logger.add_to_table(&log, options).await.unwrap();

    assert!(second.is_failure());
    assert_eq!(harness.table.calls(StoreCall::Put), 2);
    assert_eq!(
        second.error().and_then(LoggerError::store_error).and_then(|e| e.reason()),
        Some(&FailureReason::ResourceAlreadyExists)
    );
}

// ---------------------------------------------------------------------------
// Arguments and retry settings
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_arguments_are_rejected_before_the_gate() {
    let harness = Harness::new();

    let err = harness
        .logger
        .add_to_table(&raw_log("", SeverityLevel::Info), WriteOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, LoggerError::Validation { key: MessageKey::Source, .. }));

    let err = harness
        .logger
        .get_from_table("Logs", "7", "", ReadOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, LoggerError::Validation { key: MessageKey::RowKey, .. }));

    let err = harness
        .logger
        .get_from_blob("", "blob", ReadOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, LoggerError::Validation { key: MessageKey::BlobContainerName, .. }));

    assert_eq!(harness.table.total_calls(), 0);
    assert_eq!(harness.blob.total_calls(), 0);
}

#[tokio::test]
async fn per_call_budget_and_retry_flag() {
    let harness = Harness::new();
    harness.table.fail_always(StoreCall::Put, transient_error());
    let log = raw_log("S", SeverityLevel::Info);

    let response = harness
        .logger
        .add_to_table(&log, WriteOptions::builder().max_retry_attempts(2).build())
        .await
        .unwrap();
    assert!(response.has_message_key(MessageKey::RetryAttempts));
    assert_eq!(harness.table.calls(StoreCall::Put), 2);

    harness
        .logger
        .add_to_table(&log, WriteOptions::builder().retry_on_failures(false).build())
        .await
        .unwrap();
    assert_eq!(harness.table.calls(StoreCall::Put), 3);

    harness.logger.set_max_retry_attempts(Some(4)).await.unwrap();
    harness.logger.add_to_table(&log, WriteOptions::default()).await.unwrap();
    assert_eq!(harness.table.calls(StoreCall::Put), 7);
}

#[tokio::test]
async fn reads_do_not_create_missing_tables_by_default() {
    let harness = Harness::new();

    let response = harness
        .logger
        .get_from_table("Missing", "7", "r", ReadOptions::default())
        .await
        .unwrap();

    assert!(response.is_failure());
    assert!(response.has_message_key(MessageKey::TableName));
    assert!(harness.table.inner.table_names().is_empty());
}

#[tokio::test]
async fn blob_reads_do_not_create_missing_containers_by_default() {
    let harness = Harness::new();

    let response = harness
        .logger
        .get_from_blob("azlogs-202312", "Info/7/r.json", ReadOptions::default())
        .await
        .unwrap();

    assert!(response.is_failure());
    assert!(response.has_message_key(MessageKey::BlobContainerName));
    assert_eq!(harness.blob.calls(StoreCall::Ensure), 1);
    assert_eq!(harness.blob.calls(StoreCall::Get), 0);
    assert!(harness.blob.inner.container_names().is_empty());
}

#[tokio::test]
async fn blob_reads_create_the_container_when_asked() {
    let harness = Harness::new();

    let response = harness
        .logger
        .get_from_blob(
            "azlogs-202312",
            "Info/7/r.json",
            ReadOptions::builder().create_if_not_exists(true).build(),
        )
        .await
        .unwrap();

    assert!(response.is_failure());
    assert_eq!(harness.blob.inner.container_names(), vec!["azlogs-202312".to_owned()]);
}

#[tokio::test]
async fn retry_options_change_reloads_the_table_client() {
    let harness = Harness::new();
    let log = raw_log("S", SeverityLevel::Info);

    harness.logger.add_to_table(&log, WriteOptions::default()).await.unwrap();
    harness.logger.add_to_table(&log, WriteOptions::default()).await.unwrap();
    assert_eq!(harness.table.calls(StoreCall::Ensure), 1);

    let retry = RetryOptions::builder().max_retries(7).build();
    harness.logger.set_table_retry_options(Some(retry.clone())).await.unwrap();
    harness.logger.add_to_table(&log, WriteOptions::default()).await.unwrap();

    assert_eq!(harness.table.calls(StoreCall::Ensure), 2);
    assert_eq!(
        harness.table.inner.last_client_options(),
        Some(ClientOptions { retry: Some(retry.clone()) })
    );
    assert_eq!(harness.logger.table_retry_options().await.unwrap(), Some(retry));
    assert_eq!(harness.logger.blob_retry_options().await.unwrap(), None);
}

#[tokio::test]
async fn configuration_snapshot_reflects_setters() {
    let harness = Harness::new();

    harness.logger.set_max_retry_attempts(Some(5)).await.unwrap();
    harness.logger.set_retry_on_failures(false).await.unwrap();

    let config = harness.logger.config().await.unwrap();
    assert_eq!(config.max_retry_attempts, Some(5));
    assert!(!config.retry_on_failures);
    assert_eq!(config.backoff, common::fast_backoff());
    assert!(!harness.logger.retry_on_failures().await.unwrap());

    let err = harness.logger.set_max_retry_attempts(Some(0)).await.unwrap_err();
    assert!(matches!(err, LoggerError::Config(_)));
    assert_eq!(harness.logger.max_retry_attempts().await.unwrap(), Some(5));
}

#[tokio::test]
async fn invalid_config_is_rejected_at_build() {
    let config = LoggerConfig::builder().max_retry_attempts(0).build();

    let result = azlogger::AzLogger::builder()
        .table_store(Arc::new(MemoryTableStore::new()))
        .blob_store(Arc::new(MemoryBlobStore::new()))
        .config(config)
        .build();

    assert!(matches!(result, Err(LoggerError::Config(_))));
}

// ---------------------------------------------------------------------------
// Disposal
// ---------------------------------------------------------------------------

#[tokio::test]
async fn disposed_logger_rejects_every_call() {
    let harness = Harness::new();
    harness.logger.dispose();
    harness.logger.dispose();

    assert!(harness.logger.is_disposed());
    let log = raw_log("S", SeverityLevel::Info);
    assert!(matches!(
        harness.logger.add_to_table(&log, WriteOptions::default()).await,
        Err(LoggerError::Disposed)
    ));
    assert!(matches!(
        harness.logger.get_from_blob("azlogs-202401", "b", ReadOptions::default()).await,
        Err(LoggerError::Disposed)
    ));
    assert!(matches!(harness.logger.delegates().await, Err(LoggerError::Disposed)));
    assert!(matches!(harness.logger.set_retry_on_failures(true).await, Err(LoggerError::Disposed)));
    assert_eq!(harness.table.total_calls(), 0);
}
