//! Asynchronous batch processing strategy
//!
//! This module provides a multi-threaded implementation of the ProcessingStrategy
//! trait. Transactions are read in batches and staged concurrently against one
//! shared ledger.
//!
//! # Architecture
//!
//! ```text
//! AsyncProcessingStrategy
//!     ├── BatchConfig (batch_size, max_concurrent_batches)
//!     ├── AsyncReader (batch CSV reading)
//!     └── Arc<Ledger> (shared by the staging tasks)
//! ```
//!
//! # Ordering
//!
//! Batches are staged one after another. Within a batch, the transactions are
//! split into up to `max_concurrent_batches` slices, each staged by its own
//! tokio task. Transaction ids therefore follow the order in which tasks reach
//! the staging lock, which is not necessarily file order. Settlement runs once,
//! after every batch has been staged.

use crate::core::Ledger;
use crate::io::async_reader::{read_accounts, AsyncReader};
use crate::io::csv_format::write_balances_csv;
use crate::strategy::{settle, stage_or_log, ProcessingStrategy};
use crate::types::{LedgerError, SettlementReport, Transaction};
use futures::future::join_all;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio_util::compat::TokioAsyncReadCompatExt;

/// Configuration for batch processing
///
/// Controls how transactions are batched and how many staging tasks run
/// concurrently within each batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchConfig {
    /// Number of transactions per batch
    pub batch_size: usize,
    /// Maximum number of staging tasks per batch (also the worker thread count)
    pub max_concurrent_batches: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            max_concurrent_batches: num_cpus::get(),
        }
    }
}

impl BatchConfig {
    /// Create a new BatchConfig, replacing zero values with defaults
    pub fn new(batch_size: usize, max_concurrent_batches: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            tracing::warn!(
                batch_size,
                default = default.batch_size,
                "invalid batch size, using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        let max_concurrent_batches = if max_concurrent_batches == 0 {
            tracing::warn!(
                max_concurrent_batches,
                default = default.max_concurrent_batches,
                "invalid concurrency, using default"
            );
            default.max_concurrent_batches
        } else {
            max_concurrent_batches
        };

        Self {
            batch_size,
            max_concurrent_batches,
        }
    }
}

/// Asynchronous batch processing strategy
///
/// # Configuration
///
/// The strategy accepts a BatchConfig with:
/// - `batch_size`: Number of transactions per batch (default: 1000)
/// - `max_concurrent_batches`: Number of staging tasks and worker threads (default: CPU cores)
#[derive(Debug, Clone)]
pub struct AsyncProcessingStrategy {
    config: BatchConfig,
}

impl AsyncProcessingStrategy {
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }

    /// Stage one batch across concurrent tasks and wait for all of them
    async fn stage_batch(
        &self,
        ledger: &Arc<Ledger>,
        batch: Vec<Transaction>,
    ) -> Result<(), LedgerError> {
        if batch.is_empty() {
            return Ok(());
        }

        let batch: Arc<[Transaction]> = batch.into();
        let chunk_size = batch.len().div_ceil(self.config.max_concurrent_batches);

        let tasks = (0..batch.len()).step_by(chunk_size).map(|start| {
            let ledger = Arc::clone(ledger);
            let batch = Arc::clone(&batch);
            let end = (start + chunk_size).min(batch.len());

            tokio::spawn(async move {
                for transaction in &batch[start..end] {
                    stage_or_log(&ledger, transaction);
                }
            })
        });

        for joined in join_all(tasks).await {
            joined.map_err(LedgerError::runtime)?;
        }

        Ok(())
    }
}

impl ProcessingStrategy for AsyncProcessingStrategy {
    /// Run the complete asynchronous pipeline
    ///
    /// 1. Creates a tokio multi-threaded runtime
    /// 2. Loads the accounts and builds a shared ledger
    /// 3. Reads transactions in batches using AsyncReader
    /// 4. Stages each batch concurrently, waiting for it before reading the next
    /// 5. Settles once and writes the balances using csv_format
    ///
    /// # Errors
    ///
    /// Fatal errors (file not found, I/O errors, runtime errors) are returned
    /// immediately. Individual transaction errors are logged and skipped.
    fn process(
        &self,
        accounts_path: &Path,
        transactions_path: &Path,
        output: &mut dyn Write,
    ) -> Result<SettlementReport, LedgerError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.max_concurrent_batches)
            .build()
            .map_err(|e| LedgerError::runtime(format!("failed to create tokio runtime: {}", e)))?;

        runtime.block_on(async {
            let accounts_file = tokio::fs::File::open(accounts_path)
                .await
                .map_err(|e| LedgerError::open_failed(accounts_path, e))?;
            let accounts = read_accounts(accounts_file.compat()).await?;
            let ledger = Arc::new(Ledger::new(accounts));

            let transactions_file = tokio::fs::File::open(transactions_path)
                .await
                .map_err(|e| LedgerError::open_failed(transactions_path, e))?;
            let mut reader = AsyncReader::new(transactions_file.compat());

            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                tracing::debug!(transactions = batch.len(), "staging batch");
                self.stage_batch(&ledger, batch).await?;
            }

            let report = settle(&ledger)?;
            write_balances_csv(&ledger.balances(), output)?;

            Ok(report)
        })
    }
}
