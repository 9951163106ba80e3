//! Store operation sequence interpreter over a live logger.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

mod common;

use azlogger::{
    LoggerError, MessageKey, OperationValue, ReadOptions, SequenceExecutionType, SeverityLevel,
    StoreOperation, StoreOperationSequence, WriteOptions,
};
use azlogger_storage::testutil::{StoreCall, permanent_error};
use common::{Harness, raw_log};
use rstest::rstest;

fn failing_get() -> StoreOperation {
    StoreOperation::GetFromTable {
        table_name: "Missing".to_owned(),
        partition_key: "7".to_owned(),
        row_key: "r".to_owned(),
        options: ReadOptions::default(),
    }
}

fn table_write(source: &str) -> StoreOperation {
    StoreOperation::AddToTable {
        raw_log: raw_log(source, SeverityLevel::Info),
        options: WriteOptions::default(),
    }
}

#[rstest]
#[case::on_complete_stops_after_failure(SequenceExecutionType::NextOnComplete, 1)]
#[case::always_runs_everything(SequenceExecutionType::NextAlways, 3)]
#[case::on_fails_continues_after_failure(SequenceExecutionType::NextOnFails, 3)]
#[case::never_stops_immediately(SequenceExecutionType::NextNever, 1)]
#[tokio::test]
async fn first_operation_failing(
    #[case] execution_type: SequenceExecutionType,
    #[case] executed: usize,
) {
    let harness = Harness::new();
    let mut sequence = StoreOperationSequence::new()
        .then(failing_get(), execution_type)
        .then(table_write("second"), SequenceExecutionType::NextAlways)
        .then(table_write("third"), SequenceExecutionType::NextAlways);

    let overall = harness.logger.execute_sequence(&mut sequence).await.unwrap();

    assert!(overall.is_success());
    assert_eq!(sequence.executed(), executed);
    assert!(sequence[0].outcome.as_ref().unwrap().is_failure());
    assert_eq!(harness.table.calls(StoreCall::Put), executed - 1);
}

#[tokio::test]
async fn next_on_fails_stops_after_success() {
    let harness = Harness::new();
    let mut sequence = StoreOperationSequence::new()
        .then(table_write("first"), SequenceExecutionType::NextOnFails)
        .then(table_write("second"), SequenceExecutionType::NextAlways);

    let overall = harness.logger.execute_sequence(&mut sequence).await.unwrap();

    assert!(overall.is_success());
    assert_eq!(sequence.executed(), 1);
    assert!(matches!(
        sequence[0].outcome.as_ref().unwrap().value(),
        Some(OperationValue::TableWrite(receipt)) if receipt.table_name == "Logger202401Low"
    ));
}

#[tokio::test]
async fn write_then_read_back_through_blob() {
    let harness = Harness::new();
    let write = StoreOperation::AddToBlob {
        raw_log: raw_log("svc", SeverityLevel::Warning),
        options: WriteOptions::builder().blob_name("fixed/entry.json").build(),
    };
    let read = StoreOperation::GetFromBlob {
        container_name: "azlogs-202401".to_owned(),
        blob_name: "fixed/entry.json".to_owned(),
        options: ReadOptions::default(),
    };
    let mut sequence = StoreOperationSequence::new()
        .then(write, SequenceExecutionType::NextOnComplete)
        .then(read, SequenceExecutionType::NextNever);

    harness.logger.execute_sequence(&mut sequence).await.unwrap();

    assert_eq!(sequence.executed(), 2);
    match sequence[1].outcome.as_ref().unwrap().value() {
        Some(OperationValue::Log(log)) => assert_eq!(log.source(), "svc"),
        other => panic!("expected a log, got {other:?}"),
    }
}

#[tokio::test]
async fn sequenced_blob_read_does_not_create_the_container() {
    let harness = Harness::new();
    let read = StoreOperation::GetFromBlob {
        container_name: "azlogs-202312".to_owned(),
        blob_name: "Info/7/r.json".to_owned(),
        options: ReadOptions::default(),
    };
    let mut sequence = StoreOperationSequence::new().then(read, SequenceExecutionType::NextAlways);

    let overall = harness.logger.execute_sequence(&mut sequence).await.unwrap();

    assert!(overall.is_success());
    assert!(sequence[0].outcome.as_ref().unwrap().is_failure());
    assert!(harness.blob.inner.container_names().is_empty());
}

#[tokio::test]
async fn empty_sequence_is_out_of_range() {
    let harness = Harness::new();
    let mut sequence = StoreOperationSequence::new();

    let err = harness.logger.execute_sequence(&mut sequence).await.unwrap_err();

    assert!(matches!(err, LoggerError::OutOfRange(_)));
}

#[tokio::test]
async fn logger_error_becomes_overall_failure() {
    let harness = Harness::new();
    let bad_read = StoreOperation::GetFromTable {
        table_name: String::new(),
        partition_key: "7".to_owned(),
        row_key: "r".to_owned(),
        options: ReadOptions::default(),
    };
    let mut sequence = StoreOperationSequence::new()
        .then(bad_read, SequenceExecutionType::NextAlways)
        .then(table_write("never"), SequenceExecutionType::NextAlways);

    let overall = harness.logger.execute_sequence(&mut sequence).await.unwrap();

    assert!(overall.is_failure());
    assert!(overall.has_message_key(MessageKey::StoreOperationSequence));
    assert!(matches!(
        overall.error(),
        Some(LoggerError::Validation { key: MessageKey::TableName, .. })
    ));
    assert_eq!(sequence.executed(), 1);
    assert_eq!(harness.table.total_calls(), 0);
}

#[tokio::test]
async fn disposed_logger_fails_the_sequence() {
    let harness = Harness::new();
    harness.logger.dispose();
    let mut sequence =
        StoreOperationSequence::new().then(table_write("s"), SequenceExecutionType::NextAlways);

    let overall = harness.logger.execute_sequence(&mut sequence).await.unwrap();

    assert!(matches!(overall.error(), Some(LoggerError::Disposed)));
}

#[tokio::test]
async fn sequence_loaded_from_json_runs() {
    let harness = Harness::new();
    harness.table.fail_next(StoreCall::Put, permanent_error(), 1);
    let json = r#"[
        {
            "execution_type": "NextOnFails",
            "operation": {
                "category": "AddToTable",
                "raw_log": { "source": "json", "severity_level": "Error" }
            }
        },
        {
            "execution_type": "NextNever",
            "operation": {
                "category": "AddToTable",
                "raw_log": { "source": "json" },
                "options": { "table_name": "RetryTable" }
            }
        }
    ]"#;
    let mut sequence = StoreOperationSequence::from_json(json).unwrap();

    let overall = harness.logger.execute_sequence(&mut sequence).await.unwrap();

    assert!(overall.is_success());
    assert_eq!(sequence.executed(), 2);
    assert_eq!(harness.table.inner.entity_count("RetryTable"), Some(1));
}

#[test]
fn unknown_category_in_json_is_unsupported() {
    let json = r#"[{ "operation": { "category": "Purge" } }]"#;

    let err = StoreOperationSequence::from_json(json).unwrap_err();

    assert!(matches!(err, LoggerError::UnsupportedCategory(ref c) if c == "Purge"));
}
