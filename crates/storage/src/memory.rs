//! In-memory store implementations.
//!
//! This module provides [`MemoryTableStore`] and [`MemoryBlobStore`], in-process
//! implementations of [`TableStore`] and [`BlobStore`] suitable for testing and
//! local development.
//!
//! # Features
//!
//! - **Thread-safe**: Uses [`parking_lot::RwLock`] for concurrent access
//! - **Service-like validation**: Names are checked against the same rules the cloud services
//!   enforce, and violations surface as [`StoreError::ServiceRejected`]
//! - **Case-insensitive tables**: Ensuring a table whose name differs from an existing one only by
//!   case is rejected with [`FailureReason::ResourceNameCaseMismatch`]
//!
//! # Example
//!
//! ```
//! use azlogger_storage::{ClientOptions, LogEntity, MemoryTableStore, SeverityLevel, TableStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = MemoryTableStore::new();
//!     store.ensure_named("Logger202601Low", true, &ClientOptions::default()).await.unwrap();
//!
//!     let entity = LogEntity::new("18", "row-1", SeverityLevel::Info, "svc");
//!     store.put("Logger202601Low", &entity).await.unwrap();
//!
//!     let fetched = store.get("Logger202601Low", "18", "row-1").await.unwrap();
//!     assert_eq!(fetched, entity);
//! }
//! ```
//!
//! # Limitations
//!
//! - Data is not persisted; all data is lost when the process exits
//! - The forwarded [`ClientOptions`] are recorded but not acted on

use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::{
    blob::BlobStore,
    error::{FailureReason, StoreError, StoreResult},
    options::ClientOptions,
    table::TableStore,
    types::{ContentInfo, LogEntity},
};

/// Longest table or container name the services accept.
const MAX_RESOURCE_NAME_LEN: usize = 63;

/// Shortest table or container name the services accept.
const MIN_RESOURCE_NAME_LEN: usize = 3;

/// Longest blob name the blob service accepts.
const MAX_BLOB_NAME_LEN: usize = 1024;

/// Checks a table name: 3-63 ASCII alphanumerics starting with a letter.
pub fn validate_table_name(name: &str) -> StoreResult<()> {
    let valid = (MIN_RESOURCE_NAME_LEN..=MAX_RESOURCE_NAME_LEN).contains(&name.len())
        && name.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
        && name.chars().all(|c| c.is_ascii_alphanumeric());
    if valid {
        Ok(())
    } else {
        Err(StoreError::rejected(
            FailureReason::InvalidResourceName,
            format!("'{name}' is not a valid table name"),
        ))
    }
}

/// Checks a container name: 3-63 lowercase alphanumerics or single dashes,
/// starting and ending with an alphanumeric.
pub fn validate_container_name(name: &str) -> StoreResult<()> {
    let bytes = name.as_bytes();
    let valid = (MIN_RESOURCE_NAME_LEN..=MAX_RESOURCE_NAME_LEN).contains(&name.len())
        && bytes.iter().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
        && bytes.first().is_some_and(|b| *b != b'-')
        && bytes.last().is_some_and(|b| *b != b'-')
        && !name.contains("--");
    if valid {
        Ok(())
    } else {
        Err(StoreError::rejected(
            FailureReason::InvalidResourceName,
            format!("'{name}' is not a valid container name"),
        ))
    }
}

/// Checks a blob name: 1-1024 characters.
pub fn validate_blob_name(name: &str) -> StoreResult<()> {
    if name.is_empty() || name.len() > MAX_BLOB_NAME_LEN {
        return Err(StoreError::rejected(
            FailureReason::InvalidResourceName,
            format!("blob name must be 1..={MAX_BLOB_NAME_LEN} characters, got {}", name.len()),
        ));
    }
    Ok(())
}

#[derive(Debug, Default)]
struct MemoryTable {
    /// Name as it was created; lookups are case-insensitive.
    name: String,
    rows: BTreeMap<(String, String), LogEntity>,
}

/// In-memory [`TableStore`].
///
/// Cheaply cloneable; all clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryTableStore {
    tables: Arc<RwLock<HashMap<String, MemoryTable>>>,
    last_options: Arc<RwLock<Option<ClientOptions>>>,
}

impl MemoryTableStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already contains an empty table named `name`.
    #[must_use]
    pub fn with_table(name: impl Into<String>) -> Self {
        let name = name.into();
        let store = Self::new();
        store
            .tables
            .write()
            .insert(name.to_ascii_lowercase(), MemoryTable { name, rows: BTreeMap::new() });
        store
    }

    /// Returns the names of all existing tables, sorted.
    #[must_use]
    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().values().map(|t| t.name.clone()).collect();
        names.sort();
        names
    }

    /// Returns the number of entities in `table`, or `None` if it does not exist.
    #[must_use]
    pub fn entity_count(&self, table: &str) -> Option<usize> {
        self.tables.read().get(&table.to_ascii_lowercase()).map(|t| t.rows.len())
    }

    /// Returns the client options passed to the most recent `ensure_named` call.
    #[must_use]
    pub fn last_client_options(&self) -> Option<ClientOptions> {
        self.last_options.read().clone()
    }

    fn not_found(table: &str) -> StoreError {
        StoreError::rejected(FailureReason::ResourceNotFound, format!("table '{table}' not found"))
    }
}

#[async_trait]
impl TableStore for MemoryTableStore {
    #[tracing::instrument(level = "debug", skip(self, options))]
    async fn ensure_named(
        &self,
        table: &str,
        create_if_missing: bool,
        options: &ClientOptions,
    ) -> StoreResult<()> {
        validate_table_name(table)?;
        *self.last_options.write() = Some(options.clone());

        let mut tables = self.tables.write();
        match tables.get(&table.to_ascii_lowercase()) {
            Some(existing) if existing.name != table => Err(StoreError::rejected(
                FailureReason::ResourceNameCaseMismatch,
                format!("table '{}' already exists with different casing", existing.name),
            )),
            Some(_) => Ok(()),
            None if create_if_missing => {
                tables.insert(
                    table.to_ascii_lowercase(),
                    MemoryTable { name: table.to_owned(), rows: BTreeMap::new() },
                );
                Ok(())
            },
            None => Err(Self::not_found(table)),
        }
    }

    #[tracing::instrument(level = "debug", skip(self, entity))]
    async fn put(&self, table: &str, entity: &LogEntity) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let target = tables
            .get_mut(&table.to_ascii_lowercase())
            .filter(|t| t.name == table)
            .ok_or_else(|| Self::not_found(table))?;

        let key = (entity.partition_key.clone(), entity.row_key.clone());
        if target.rows.contains_key(&key) {
            return Err(StoreError::rejected(
                FailureReason::ResourceAlreadyExists,
                format!("entity ({}, {}) already exists", key.0, key.1),
            ));
        }
        target.rows.insert(key, entity.clone());
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn get(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
    ) -> StoreResult<LogEntity> {
        let tables = self.tables.read();
        let source = tables
            .get(&table.to_ascii_lowercase())
            .filter(|t| t.name == table)
            .ok_or_else(|| Self::not_found(table))?;

        source.rows.get(&(partition_key.to_owned(), row_key.to_owned())).cloned().ok_or_else(|| {
            StoreError::rejected(
                FailureReason::ResourceNotFound,
                format!("entity ({partition_key}, {row_key}) not found in '{table}'"),
            )
        })
    }
}

#[derive(Debug, Clone)]
struct StoredBlob {
    content: Bytes,
    etag: String,
    last_modified: DateTime<Utc>,
}

/// In-memory [`BlobStore`].
///
/// Cheaply cloneable; all clones share the same containers.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    containers: Arc<RwLock<HashMap<String, BTreeMap<String, StoredBlob>>>>,
    last_options: Arc<RwLock<Option<ClientOptions>>>,
    version: Arc<AtomicU64>,
}

impl MemoryBlobStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already contains an empty container named `name`.
    #[must_use]
    pub fn with_container(name: impl Into<String>) -> Self {
        let store = Self::new();
        store.containers.write().insert(name.into(), BTreeMap::new());
        store
    }

    /// Returns the names of all existing containers, sorted.
    #[must_use]
    pub fn container_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.containers.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the blob names in `container`, or `None` if it does not exist.
    #[must_use]
    pub fn blob_names(&self, container: &str) -> Option<Vec<String>> {
        self.containers.read().get(container).map(|blobs| blobs.keys().cloned().collect())
    }

    /// Returns the client options passed to the most recent container load.
    #[must_use]
    pub fn last_client_options(&self) -> Option<ClientOptions> {
        self.last_options.read().clone()
    }

    fn container_not_found(container: &str) -> StoreError {
        StoreError::rejected(
            FailureReason::ResourceNotFound,
            format!("container '{container}' not found"),
        )
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    #[tracing::instrument(level = "debug", skip(self, options))]
    async fn ensure_container_named(
        &self,
        container: &str,
        create_if_missing: bool,
        options: &ClientOptions,
    ) -> StoreResult<()> {
        validate_container_name(container)?;
        *self.last_options.write() = Some(options.clone());

        let mut containers = self.containers.write();
        if containers.contains_key(container) {
            return Ok(());
        }
        if !create_if_missing {
            return Err(Self::container_not_found(container));
        }
        containers.insert(container.to_owned(), BTreeMap::new());
        Ok(())
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn ensure_blob_named(&self, container: &str, blob: &str) -> StoreResult<()> {
        validate_blob_name(blob)?;
        if self.containers.read().contains_key(container) {
            Ok(())
        } else {
            Err(Self::container_not_found(container))
        }
    }

    #[tracing::instrument(level = "debug", skip(self, content), fields(len = content.len()))]
    async fn put(
        &self,
        container: &str,
        blob: &str,
        content: Bytes,
        overwrite: bool,
    ) -> StoreResult<ContentInfo> {
        let mut containers = self.containers.write();
        let blobs =
            containers.get_mut(container).ok_or_else(|| Self::container_not_found(container))?;

        if !overwrite && blobs.contains_key(blob) {
            return Err(StoreError::rejected(
                FailureReason::ResourceAlreadyExists,
                format!("blob '{blob}' already exists in '{container}'"),
            ));
        }

        let version = self.version.fetch_add(1, Ordering::Relaxed) + 1;
        let stored =
            StoredBlob { etag: format!("\"0x{version:X}\""), last_modified: Utc::now(), content };
        let info = ContentInfo {
            etag: stored.etag.clone(),
            last_modified: stored.last_modified,
            content_length: stored.content.len(),
        };
        blobs.insert(blob.to_owned(), stored);
        Ok(info)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    async fn get_stream(&self, container: &str, blob: &str) -> StoreResult<Bytes> {
        let containers = self.containers.read();
        let blobs = containers.get(container).ok_or_else(|| Self::container_not_found(container))?;
        blobs.get(blob).map(|b| b.content.clone()).ok_or_else(|| {
            StoreError::rejected(
                FailureReason::ResourceNotFound,
                format!("blob '{blob}' not found in '{container}'"),
            )
        })
    }
}
