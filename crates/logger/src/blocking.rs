//! Synchronous wrapper around [`AzLogger`].
//!
//! [`BlockingAzLogger`] drives the async logger on a private current-thread
//! runtime. Backoff sleeps and gate waits block the calling thread.
//!
//! # Panics
//!
//! Every method panics if called from within an async runtime, as
//! [`tokio::runtime::Runtime::block_on`] does. Use [`AzLogger`] directly
//! from async code.

use std::future::Future;

use tokio::runtime::{Builder, Runtime};

use crate::{
    error::{LoggerError, Result},
    logger::AzLogger,
    model::{BlobReceipt, RawLog, ReadOnlyLog, TableReceipt},
    options::{ReadOptions, WriteOptions},
    response::Response,
    sequence::StoreOperationSequence,
};

/// Blocking facade over an [`AzLogger`].
#[derive(Debug)]
pub struct BlockingAzLogger {
    logger: AzLogger,
    runtime: Runtime,
}

impl BlockingAzLogger {
    /// Wraps `logger`.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::Runtime`] if the runtime cannot be built.
    pub fn new(logger: AzLogger) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| LoggerError::Runtime { message: e.to_string() })?;
        Ok(Self { logger, runtime })
    }

    /// The wrapped async logger.
    #[must_use]
    pub fn logger(&self) -> &AzLogger {
        &self.logger
    }

    /// Unwraps the async logger, dropping the private runtime.
    #[must_use]
    pub fn into_inner(self) -> AzLogger {
        self.logger
    }

    /// Runs any async logger call to completion, e.g. a configuration setter.
    pub fn block_on<'a, F>(&'a self, call: impl FnOnce(&'a AzLogger) -> F) -> F::Output
    where
        F: Future,
    {
        self.runtime.block_on(call(&self.logger))
    }

    /// Blocking [`AzLogger::add_to_table`].
    ///
    /// # Errors
    ///
    /// As [`AzLogger::add_to_table`].
    pub fn add_to_table(
        &self,
        raw_log: &RawLog,
        options: WriteOptions,
    ) -> Result<Response<TableReceipt>> {
        self.block_on(move |logger| logger.add_to_table(raw_log, options))
    }

    /// Blocking [`AzLogger::add_to_blob`].
    ///
    /// # Errors
    ///
    /// As [`AzLogger::add_to_blob`].
    pub fn add_to_blob(
        &self,
        raw_log: &RawLog,
        options: WriteOptions,
    ) -> Result<Response<BlobReceipt>> {
        self.block_on(move |logger| logger.add_to_blob(raw_log, options))
    }

    /// Blocking [`AzLogger::get_from_table`].
    ///
    /// # Errors
    ///
    /// As [`AzLogger::get_from_table`].
    pub fn get_from_table(
        &self,
        table_name: &str,
        partition_key: &str,
        row_key: &str,
        options: ReadOptions,
    ) -> Result<Response<ReadOnlyLog>> {
        self.block_on(move |logger| {
            logger.get_from_table(table_name, partition_key, row_key, options)
        })
    }

    /// Blocking [`AzLogger::get_from_blob`].
    ///
    /// # Errors
    ///
    /// As [`AzLogger::get_from_blob`].
    pub fn get_from_blob(
        &self,
        container_name: &str,
        blob_name: &str,
        options: ReadOptions,
    ) -> Result<Response<ReadOnlyLog>> {
        self.block_on(move |logger| logger.get_from_blob(container_name, blob_name, options))
    }

    /// Blocking [`AzLogger::execute_sequence`].
    ///
    /// # Errors
    ///
    /// As [`AzLogger::execute_sequence`].
    pub fn execute_sequence(&self, sequence: &mut StoreOperationSequence) -> Result<Response<()>> {
        self.block_on(move |logger| logger.execute_sequence(sequence))
    }

    /// Disposes the wrapped logger.
    pub fn dispose(&self) {
        self.logger.dispose();
    }
}
