//! Blob retry engine.
//!
//! Same loop as the table engine with a two-step load: the container client
//! first, then the blob client inside it. Entities are encoded once, before
//! the loop, so an encoding failure is reported without touching the store.
//! Downloads are decoded inside the attempt; a payload that decodes to
//! nothing is [`LoggerError::EmptyPayload`], a payload that fails to decode is
//! [`LoggerError::Serialization`]. Neither is retried.

use std::{future::Future, sync::Arc};

use azlogger_storage::{
    BlobStore, ClientOptions, ContentInfo, EntityCodec, JsonCodec, LogEntity, RetryOptions,
};
use fail::fail_point;

use crate::{
    error::LoggerError,
    metrics::LoggerMetrics,
    response::{MessageKey, Response},
    retry::{AttemptBudget, Backoff, OperationKind, RetryClassifier},
};

/// Retry engine over a [`BlobStore`].
pub struct BlobService {
    store: Arc<dyn BlobStore>,
    codec: Arc<dyn EntityCodec>,
    loaded_container: Option<String>,
    loaded_blob: Option<String>,
    client_options: ClientOptions,
    backoff: Backoff,
    metrics: LoggerMetrics,
}

impl std::fmt::Debug for BlobService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobService")
            .field("loaded_container", &self.loaded_container)
            .field("loaded_blob", &self.loaded_blob)
            .field("client_options", &self.client_options)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

impl BlobService {
    /// Creates an engine using [`JsonCodec`].
    #[must_use]
    pub fn new(store: Arc<dyn BlobStore>, backoff: Backoff, metrics: LoggerMetrics) -> Self {
        Self::with_codec(store, Arc::new(JsonCodec), backoff, metrics)
    }

    /// Creates an engine with a custom entity codec.
    #[must_use]
    pub fn with_codec(
        store: Arc<dyn BlobStore>,
        codec: Arc<dyn EntityCodec>,
        backoff: Backoff,
        metrics: LoggerMetrics,
    ) -> Self {
        Self {
            store,
            codec,
            loaded_container: None,
            loaded_blob: None,
            client_options: ClientOptions::default(),
            backoff,
            metrics,
        }
    }

    /// Name of the currently loaded container, if any.
    #[must_use]
    pub fn loaded_container(&self) -> Option<&str> {
        self.loaded_container.as_deref()
    }

    /// Name of the currently loaded blob, if any.
    #[must_use]
    pub fn loaded_blob(&self) -> Option<&str> {
        self.loaded_blob.as_deref()
    }

    /// Retry options forwarded to the store client.
    #[must_use]
    pub fn retry_options(&self) -> Option<&RetryOptions> {
        self.client_options.retry.as_ref()
    }

    /// Replaces the store client retry options.
    ///
    /// A change forces the next load to reach the store.
    pub fn set_retry_options(&mut self, retry: Option<&RetryOptions>) {
        let options = ClientOptions::with_retry(retry);
        if options != self.client_options {
            self.client_options = options;
            self.loaded_container = None;
            self.loaded_blob = None;
        }
    }

    /// Replaces the backoff schedule.
    pub fn set_backoff(&mut self, backoff: Backoff) {
        self.backoff = backoff;
    }

    /// Loads a client for `container`, answering from the cache when it is already loaded.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn ensure_container(
        &mut self,
        container: &str,
        create_if_not_exists: bool,
    ) -> Response<()> {
        if self.loaded_container.as_deref() == Some(container) {
            self.metrics.record_cache_hit();
            return Response::success(());
        }
        self.metrics.record_cache_miss();
        self.loaded_container = None;
        self.loaded_blob = None;

        match self
            .store
            .ensure_container_named(container, create_if_not_exists, &self.client_options)
            .await
        {
            Ok(()) => {
                self.loaded_container = Some(container.to_owned());
                Response::success(())
            },
            Err(err) => Response::failure(MessageKey::BlobContainerName, err.into()),
        }
    }

    /// Loads a client for `blob` inside the loaded container.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn ensure_blob(&mut self, blob: &str) -> Response<()> {
        let Some(container) = self.loaded_container.clone() else {
            return Response::failure_message(MessageKey::BlobContainerName, "no container loaded");
        };
        if self.loaded_blob.as_deref() == Some(blob) {
            self.metrics.record_cache_hit();
            return Response::success(());
        }
        self.metrics.record_cache_miss();
        self.loaded_blob = None;

        match self.store.ensure_blob_named(&container, blob).await {
            Ok(()) => {
                self.loaded_blob = Some(blob.to_owned());
                Response::success(())
            },
            Err(err) => Response::failure(MessageKey::BlobName, err.into()),
        }
    }

    /// Encodes and uploads `entity` as `blob` in `container`, retrying per the budget.
    #[tracing::instrument(
        skip(self, entity),
        fields(partition_key = %entity.partition_key, row_key = %entity.row_key)
    )]
    pub async fn add(
        &mut self,
        entity: &LogEntity,
        container: &str,
        blob: &str,
        create_if_not_exists: bool,
        max_attempts: u32,
    ) -> Response<ContentInfo> {
        if let Err(err) = entity.validate_keys() {
            return Response::failure(err.into(), err.into());
        }
        let content = match self.codec.encode(entity) {
            Ok(content) => content,
            Err(err) => {
                return Response::failure(
                    MessageKey::Serialization,
                    LoggerError::Serialization(err),
                );
            },
        };

        self.run(
            OperationKind::BlobAdd,
            container,
            blob,
            create_if_not_exists,
            max_attempts,
            |store, _codec| {
                let content = content.clone();
                async move {
                    match store.put(container, blob, content, false).await {
                        Ok(info) => Response::success(info),
                        Err(err) => Response::failure(MessageKey::Entity, err.into()),
                    }
                }
            },
        )
        .await
    }

    /// Downloads and decodes `blob` from `container`, retrying per the budget.
    #[tracing::instrument(skip(self))]
    pub async fn get(
        &mut self,
        container: &str,
        blob: &str,
        create_if_not_exists: bool,
        max_attempts: u32,
    ) -> Response<LogEntity> {
        self.run(
            OperationKind::BlobGet,
            container,
            blob,
            create_if_not_exists,
            max_attempts,
            |store, codec| async move {
                let content = match store.get_stream(container, blob).await {
                    Ok(content) => content,
                    Err(err) => return Response::failure(MessageKey::Entity, err.into()),
                };
                match codec.decode(&content) {
                    Ok(Some(entity)) => Response::success(entity),
                    Ok(None) => Response::failure(
                        MessageKey::Serialization,
                        LoggerError::EmptyPayload { name: blob.to_owned() },
                    ),
                    Err(err) => Response::failure(
                        MessageKey::Serialization,
                        LoggerError::Serialization(err),
                    ),
                }
            },
        )
        .await
    }

    async fn load(
        &mut self,
        container: &str,
        blob: &str,
        create_if_not_exists: bool,
    ) -> Response<()> {
        let container_load = self.ensure_container(container, create_if_not_exists).await;
        if container_load.is_failure() {
            return container_load;
        }
        self.ensure_blob(blob).await
    }

    async fn run<T, F, Fut>(
        &mut self,
        kind: OperationKind,
        container: &str,
        blob: &str,
        create_if_not_exists: bool,
        max_attempts: u32,
        mut operation: F,
    ) -> Response<T>
    where
        F: FnMut(Arc<dyn BlobStore>, Arc<dyn EntityCodec>) -> Fut,
        Fut: Future<Output = Response<T>>,
    {
        let mut budget = AttemptBudget::new(kind, max_attempts, self.backoff, self.metrics.clone());
        let mut last_load =
            Response::failure_message(MessageKey::BlobContainerName, "container not loaded");
        let mut last_operation = None;

        while budget.has_remaining() {
            let load = self.load(container, blob, create_if_not_exists).await;
            if RetryClassifier::should_stop_load(&load) {
                return budget.stopped(load.discard_value());
            }

            if load.is_success() {
                budget.record_operation();
                let response =
                    operation(Arc::clone(&self.store), Arc::clone(&self.codec)).await;
                let stop = match kind {
                    OperationKind::BlobAdd => RetryClassifier::should_stop_add(&response),
                    _ => RetryClassifier::should_stop_get(&response),
                };
                if stop {
                    return budget.stopped(response);
                }
                last_operation = Some(response);
            }
            last_load = load;

            if let Some(delay) = budget.end_attempt() {
                fail_point!("retry-before-sleep", |_| {
                    budget.exhausted(last_operation.take(), last_load.clone())
                });
                tokio::time::sleep(delay).await;
            }
        }

        budget.exhausted(last_operation, last_load)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use azlogger_storage::{
        MemoryBlobStore, SeverityLevel,
        testutil::{FlakyBlobStore, StoreCall, permanent_error, transient_error},
    };
    use bytes::Bytes;

    use super::*;
    use crate::config::BackoffConfig;

    fn service(store: &FlakyBlobStore) -> (BlobService, LoggerMetrics) {
        let metrics = LoggerMetrics::new();
        let backoff = Backoff::new(
            BackoffConfig::builder()
                .initial_backoff(Duration::from_millis(1))
                .max_backoff(Duration::from_millis(2))
                .build()
                .unwrap(),
        );
        (BlobService::new(Arc::new(store.clone()), backoff, metrics.clone()), metrics)
    }

    fn entity() -> LogEntity {
        LogEntity::new("18", "Error_svc_1", SeverityLevel::Error, "svc")
    }

    #[tokio::test]
    async fn test_add_then_get_round_trips() {
        let store = FlakyBlobStore::default();
        let (mut service, _) = service(&store);

        let added = service.add(&entity(), "azlogs-202601", "Error/18/r.json", true, 4).await;
        assert!(added.is_success());
        assert!(added.value().is_some_and(|info| info.content_length > 0));

        let fetched = service.get("azlogs-202601", "Error/18/r.json", false, 3).await;
        assert_eq!(fetched.into_value(), Some(entity()));
        assert_eq!(store.calls(StoreCall::Ensure), 1);
        assert_eq!(store.calls(StoreCall::EnsureBlob), 1);
    }

    #[tokio::test]
    async fn test_container_cache_survives_blob_change() {
        let store = FlakyBlobStore::default();
        let (mut service, metrics) = service(&store);

        assert!(service.add(&entity(), "azlogs-202601", "a.json", true, 1).await.is_success());
        assert!(service.add(&entity(), "azlogs-202601", "b.json", true, 1).await.is_success());

        assert_eq!(store.calls(StoreCall::Ensure), 1);
        assert_eq!(store.calls(StoreCall::EnsureBlob), 2);
        assert_eq!(metrics.snapshot().cache_hits, 1);
        assert_eq!(service.loaded_blob(), Some("b.json"));
    }

    #[tokio::test]
    async fn test_transient_upload_failures_are_retried() {
        let store = FlakyBlobStore::default();
        store.fail_next(StoreCall::Put, transient_error(), 3);
        let (mut service, metrics) = service(&store);

        let response = service.add(&entity(), "azlogs-202601", "x.json", true, 4).await;

        assert!(response.is_success());
        assert_eq!(store.calls(StoreCall::Put), 4);
        assert_eq!(metrics.snapshot().retries, 3);
    }

    #[tokio::test]
    async fn test_permanent_container_failure_stops() {
        let store = FlakyBlobStore::default();
        store.fail_always(StoreCall::Ensure, permanent_error());
        let (mut service, _) = service(&store);

        let response = service.get("azlogs-202601", "x.json", false, 3).await;

        assert!(response.has_message_key(MessageKey::BlobContainerName));
        assert_eq!(store.calls(StoreCall::Ensure), 1);
        assert_eq!(store.calls(StoreCall::EnsureBlob), 0);
    }

    #[tokio::test]
    async fn test_empty_blob_is_distinct_from_malformed_blob() {
        let inner = MemoryBlobStore::with_container("azlogs-202601");
        inner.put("azlogs-202601", "empty.json", Bytes::new(), false).await.unwrap();
        inner
            .put("azlogs-202601", "broken.json", Bytes::from_static(b"{oops"), false)
            .await
            .unwrap();
        let store = FlakyBlobStore::new(inner);
        let (mut service, _) = service(&store);

        let empty = service.get("azlogs-202601", "empty.json", false, 3).await;
        assert!(matches!(empty.error(), Some(LoggerError::EmptyPayload { .. })));
        assert_eq!(store.calls(StoreCall::Get), 1);

        let broken = service.get("azlogs-202601", "broken.json", false, 3).await;
        assert!(matches!(broken.error(), Some(LoggerError::Serialization(_))));
        assert!(broken.has_message_key(MessageKey::Serialization));
        assert_eq!(store.calls(StoreCall::Get), 2);
    }

    #[tokio::test]
    async fn test_get_does_not_create_missing_container() {
        let store = FlakyBlobStore::default();
        let (mut service, _) = service(&store);

        let response = service.get("azlogs-202601", "x.json", false, 3).await;

        assert!(response.is_failure());
        assert!(store.inner.container_names().is_empty());
    }
}
