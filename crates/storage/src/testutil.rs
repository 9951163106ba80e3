//! Shared test utilities for store testing.
//!
//! This module provides fault-injecting wrappers around the in-memory stores
//! together with per-call counters. It is feature-gated behind `testutil` to
//! prevent leaking into production builds.
//!
//! # Usage
//!
//! In integration tests, enable the feature in `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! azlogger-storage = { path = "../storage", features = ["testutil"] }
//! ```
//!
//! Then script failures:
//!
//! ```no_run
//! // Requires the `testutil` feature to be enabled.
//! use azlogger_storage::testutil::{FlakyTableStore, StoreCall, transient_error};
//!
//! let store = FlakyTableStore::default();
//! store.fail_next(StoreCall::Put, transient_error(), 2);
//! ```

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use crate::{
    blob::BlobStore,
    error::{FailureReason, StoreError, StoreResult},
    memory::{MemoryBlobStore, MemoryTableStore},
    options::ClientOptions,
    table::TableStore,
    types::{ContentInfo, LogEntity},
};

/// Store operation a failure can be scripted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreCall {
    /// `TableStore::ensure_named` or `BlobStore::ensure_container_named`.
    Ensure,
    /// `BlobStore::ensure_blob_named`.
    EnsureBlob,
    /// `TableStore::put` or `BlobStore::put`.
    Put,
    /// `TableStore::get` or `BlobStore::get_stream`.
    Get,
}

/// A retriable service rejection.
#[must_use]
pub fn transient_error() -> StoreError {
    StoreError::rejected(FailureReason::ServerBusy, "server busy")
}

/// A non-retriable service rejection.
#[must_use]
pub fn permanent_error() -> StoreError {
    StoreError::rejected(FailureReason::AuthenticationFailed, "authentication failed")
}

/// A local failure that is not a service response.
#[must_use]
pub fn local_error() -> StoreError {
    StoreError::internal("local failure")
}

#[derive(Debug, Default)]
struct Plan {
    queued: VecDeque<StoreError>,
    sticky: Option<StoreError>,
    calls: usize,
}

/// Scripted failures and call counters shared by the flaky stores.
#[derive(Debug, Clone, Default)]
pub struct FaultInjector {
    plans: Arc<Mutex<HashMap<StoreCall, Plan>>>,
}

impl FaultInjector {
    /// Queues `error` to be returned by the next `times` calls of `call`.
    pub fn fail_next(&self, call: StoreCall, error: StoreError, times: usize) {
        let mut plans = self.plans.lock();
        let plan = plans.entry(call).or_default();
        plan.queued.extend(std::iter::repeat_n(error, times));
    }

    /// Makes every call of `call` fail with `error` once queued failures run out.
    pub fn fail_always(&self, call: StoreCall, error: StoreError) {
        self.plans.lock().entry(call).or_default().sticky = Some(error);
    }

    /// Removes every scripted failure.
    pub fn clear(&self) {
        for plan in self.plans.lock().values_mut() {
            plan.queued.clear();
            plan.sticky = None;
        }
    }

    /// Returns how many times `call` reached the store, failed or not.
    #[must_use]
    pub fn calls(&self, call: StoreCall) -> usize {
        self.plans.lock().get(&call).map_or(0, |plan| plan.calls)
    }

    /// Records a call and returns the scripted failure, if any.
    fn check(&self, call: StoreCall) -> StoreResult<()> {
        let mut plans = self.plans.lock();
        let plan = plans.entry(call).or_default();
        plan.calls += 1;
        match plan.queued.pop_front().or_else(|| plan.sticky.clone()) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// [`MemoryTableStore`] wrapper with scripted failures.
#[derive(Debug, Clone, Default)]
pub struct FlakyTableStore {
    /// The store that handles calls without a scripted failure.
    pub inner: MemoryTableStore,
    faults: FaultInjector,
}

impl FlakyTableStore {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: MemoryTableStore) -> Self {
        Self { inner, faults: FaultInjector::default() }
    }

    /// See [`FaultInjector::fail_next`].
    pub fn fail_next(&self, call: StoreCall, error: StoreError, times: usize) {
        self.faults.fail_next(call, error, times);
    }

    /// See [`FaultInjector::fail_always`].
    pub fn fail_always(&self, call: StoreCall, error: StoreError) {
        self.faults.fail_always(call, error);
    }

    /// See [`FaultInjector::calls`].
    #[must_use]
    pub fn calls(&self, call: StoreCall) -> usize {
        self.faults.calls(call)
    }

    /// Total calls across every operation.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        [StoreCall::Ensure, StoreCall::Put, StoreCall::Get].into_iter().map(|c| self.calls(c)).sum()
    }
}

#[async_trait]
impl TableStore for FlakyTableStore {
    async fn ensure_named(
        &self,
        table: &str,
        create_if_missing: bool,
        options: &ClientOptions,
    ) -> StoreResult<()> {
        self.faults.check(StoreCall::Ensure)?;
        self.inner.ensure_named(table, create_if_missing, options).await
    }

    async fn put(&self, table: &str, entity: &LogEntity) -> StoreResult<()> {
        self.faults.check(StoreCall::Put)?;
        self.inner.put(table, entity).await
    }

    async fn get(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
    ) -> StoreResult<LogEntity> {
        self.faults.check(StoreCall::Get)?;
        self.inner.get(table, partition_key, row_key).await
    }
}

/// [`MemoryBlobStore`] wrapper with scripted failures.
#[derive(Debug, Clone, Default)]
pub struct FlakyBlobStore {
    /// The store that handles calls without a scripted failure.
    pub inner: MemoryBlobStore,
    faults: FaultInjector,
}

impl FlakyBlobStore {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: MemoryBlobStore) -> Self {
        Self { inner, faults: FaultInjector::default() }
    }

    /// See [`FaultInjector::fail_next`].
    pub fn fail_next(&self, call: StoreCall, error: StoreError, times: usize) {
        self.faults.fail_next(call, error, times);
    }

    /// See [`FaultInjector::fail_always`].
    pub fn fail_always(&self, call: StoreCall, error: StoreError) {
        self.faults.fail_always(call, error);
    }

    /// See [`FaultInjector::calls`].
    #[must_use]
    pub fn calls(&self, call: StoreCall) -> usize {
        self.faults.calls(call)
    }

    /// Total calls across every operation.
    #[must_use]
    pub fn total_calls(&self) -> usize {
        [StoreCall::Ensure, StoreCall::EnsureBlob, StoreCall::Put, StoreCall::Get]
            .into_iter()
            .map(|c| self.calls(c))
            .sum()
    }
}

#[async_trait]
impl BlobStore for FlakyBlobStore {
    async fn ensure_container_named(
        &self,
        container: &str,
        create_if_missing: bool,
        options: &ClientOptions,
    ) -> StoreResult<()> {
        self.faults.check(StoreCall::Ensure)?;
        self.inner.ensure_container_named(container, create_if_missing, options).await
    }

    async fn ensure_blob_named(&self, container: &str, blob: &str) -> StoreResult<()> {
        self.faults.check(StoreCall::EnsureBlob)?;
        self.inner.ensure_blob_named(container, blob).await
    }

    async fn put(
        &self,
        container: &str,
        blob: &str,
        content: Bytes,
        overwrite: bool,
    ) -> StoreResult<ContentInfo> {
        self.faults.check(StoreCall::Put)?;
        self.inner.put(container, blob, content, overwrite).await
    }

    async fn get_stream(&self, container: &str, blob: &str) -> StoreResult<Bytes> {
        self.faults.check(StoreCall::Get)?;
        self.inner.get_stream(container, blob).await
    }
}
