//! Table retry engine.
//!
//! Every call runs the same loop: load the table client (creating the table
//! if asked), run the operation, and on a retriable failure back off and try
//! again until the attempt budget is spent. The loaded table name is cached;
//! loading the same name again is answered without a store call until the
//! client options change.
//!
//! The engine holds no lock of its own. It lives inside the logger state and
//! is only reached while the logger gate is held.

use std::{future::Future, sync::Arc};

use azlogger_storage::{ClientOptions, LogEntity, RetryOptions, TableStore};
use fail::fail_point;

use crate::{
    metrics::LoggerMetrics,
    response::{MessageKey, Response},
    retry::{AttemptBudget, Backoff, OperationKind, RetryClassifier},
};

/// Retry engine over a [`TableStore`].
pub struct TableService {
    store: Arc<dyn TableStore>,
    loaded_table: Option<String>,
    client_options: ClientOptions,
    backoff: Backoff,
    metrics: LoggerMetrics,
}

impl std::fmt::Debug for TableService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableService")
            .field("loaded_table", &self.loaded_table)
            .field("client_options", &self.client_options)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

impl TableService {
    /// Creates an engine with no table loaded.
    #[must_use]
    pub fn new(store: Arc<dyn TableStore>, backoff: Backoff, metrics: LoggerMetrics) -> Self {
        Self {
            store,
            loaded_table: None,
            client_options: ClientOptions::default(),
            backoff,
            metrics,
        }
    }

    /// Name of the currently loaded table, if any.
    #[must_use]
    pub fn loaded_table(&self) -> Option<&str> {
        self.loaded_table.as_deref()
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
            self.loaded_table = None;
        }
    }

    /// Replaces the backoff schedule.
    pub fn set_backoff(&mut self, backoff: Backoff) {
        self.backoff = backoff;
    }

    /// Loads a client for `table`, answering from the cache when it is already loaded.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn ensure_table(&mut self, table: &str, create_if_not_exists: bool) -> Response<()> {
        if self.loaded_table.as_deref() == Some(table) {
            self.metrics.record_cache_hit();
            return Response::success(());
        }
        self.metrics.record_cache_miss();
        self.loaded_table = None;

        match self.store.ensure_named(table, create_if_not_exists, &self.client_options).await {
            Ok(()) => {
                self.loaded_table = Some(table.to_owned());
                Response::success(())
            },
            Err(err) => Response::failure(MessageKey::TableName, err.into()),
        }
    }

    /// Inserts `entity` into `table`, retrying per the budget.
    #[tracing::instrument(
        skip(self, entity),
        fields(partition_key = %entity.partition_key, row_key = %entity.row_key)
    )]
    pub async fn add(
        &mut self,
        entity: &LogEntity,
        table: &str,
        create_if_not_exists: bool,
        max_attempts: u32,
    ) -> Response<()> {
        if let Err(err) = entity.validate_keys() {
            return Response::failure(err.into(), err.into());
        }

        self.run(OperationKind::TableAdd, table, create_if_not_exists, max_attempts, |store| {
            async move {
                match store.put(table, entity).await {
                    Ok(()) => Response::success(()),
                    Err(err) => Response::failure(MessageKey::Entity, err.into()),
                }
            }
        })
        .await
    }

    /// Reads the entity at (`partition_key`, `row_key`) from `table`, retrying per the budget.
    #[tracing::instrument(skip(self))]
    pub async fn get(
        &mut self,
        table: &str,
        partition_key: &str,
        row_key: &str,
        create_if_not_exists: bool,
        max_attempts: u32,
    ) -> Response<LogEntity> {
        self.run(OperationKind::TableGet, table, create_if_not_exists, max_attempts, |store| {
            async move {
                match store.get(table, partition_key, row_key).await {
                    Ok(entity) => Response::success(entity),
                    Err(err) => Response::failure(MessageKey::Entity, err.into()),
                }
            }
        })
        .await
    }

    async fn run<T, F, Fut>(
        &mut self,
        kind: OperationKind,
        table: &str,
        create_if_not_exists: bool,
        max_attempts: u32,
        mut operation: F,
    ) -> Response<T>
    where
        F: FnMut(Arc<dyn TableStore>) -> Fut,
        Fut: Future<Output = Response<T>>,
    {
        let mut budget = AttemptBudget::new(kind, max_attempts, self.backoff, self.metrics.clone());
        let mut last_load = Response::failure_message(MessageKey::TableName, "table not loaded");
        let mut last_operation = None;

        while budget.has_remaining() {
            let load = self.ensure_table(table, create_if_not_exists).await;
            if RetryClassifier::should_stop_load(&load) {
                return budget.stopped(load.discard_value());
            }

            if load.is_success() {
                budget.record_operation();
                let response = operation(Arc::clone(&self.store)).await;
                let stop = match kind {
                    OperationKind::TableAdd => RetryClassifier::should_stop_add(&response),
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
