//! Asynchronous CSV readers with batch interface
//!
//! Provides an async accounts loader and batch reading of transactions for the
//! async processing strategy.
//!
//! # Design
//!
//! The AsyncReader uses:
//! - csv-async for streaming CSV parsing
//! - the csv_format `TransactionAssembler` for grouping rows into transactions
//! - Batch reading so staging tasks can be spawned per batch
//!
//! # Architecture
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of Transactions
//!                  ↓
//!           csv_format module
//!           (CsvTransferRecord, TransactionAssembler)
//! ```
//!
//! A transaction whose rows straddle a batch boundary is carried over and
//! delivered whole in a later batch.

use crate::io::csv_format::{CsvTransferRecord, TransactionAssembler};
use crate::types::{AccountBalance, LedgerError, Transaction};
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;

/// Load the provisioning list from an async `account,balance` CSV source
///
/// # Errors
///
/// Returns the first row that fails to parse.
pub async fn read_accounts<R>(reader: R) -> Result<Vec<AccountBalance>, LedgerError>
where
    R: AsyncRead + Unpin + Send,
{
    let mut deserializer = AsyncReaderBuilder::new()
        .trim(csv_async::Trim::All)
        .create_deserializer(reader);
    let mut records = deserializer.deserialize::<AccountBalance>();

    let mut accounts = Vec::new();
    while let Some(record) = records.next().await {
        accounts.push(record?);
    }

    Ok(accounts)
}

/// Asynchronous transaction reader
///
/// Provides batch reading interface over transactions.
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    assembler: TransactionAssembler,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    /// Create a new AsyncReader from an async reader
    ///
    /// # Arguments
    ///
    /// * `reader` - Async reader providing `tx,from,to,amount` CSV data
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            assembler: TransactionAssembler::new(),
        }
    }

    /// Read a batch of transactions
    ///
    /// Reads until `batch_size` complete transactions are assembled or the input
    /// ends. Unparseable rows and malformed transactions are logged and skipped;
    /// a row that cannot be decoded also fails the transaction it interrupts.
    ///
    /// # Returns
    ///
    /// The assembled transactions in file order.
    /// Returns an empty vector when the end of the file is reached.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<Transaction> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<CsvTransferRecord>();

        while batch.len() < batch_size {
            let completed = match records.next().await {
                Some(Ok(record)) => self.assembler.push_record(record),
                Some(Err(e)) => {
                    let error = LedgerError::from(e);
                    self.assembler.poison(&error);
                    tracing::warn!(error = %error, "skipping transfer row");
                    None
                }
                None => match self.assembler.finish() {
                    Some(completed) => Some(completed),
                    None => break,
                },
            };

            match completed {
                Some(Ok(transaction)) => batch.push(transaction),
                Some(Err(e)) => tracing::warn!(error = %e, "skipping transaction"),
                None => {}
            }
        }

        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Transfer;
    use futures::io::Cursor;

    #[tokio::test]
    async fn test_read_accounts() {
        let reader = Cursor::new("account,balance\n1,5\n 2 , 10 \n".as_bytes());

        let accounts = read_accounts(reader).await.unwrap();

        assert_eq!(
            accounts,
            vec![AccountBalance::new(1, 5), AccountBalance::new(2, 10)]
        );
    }

    #[tokio::test]
    async fn test_read_accounts_rejects_bad_row() {
        let reader = Cursor::new("account,balance\n1,five\n".as_bytes());

        let result = read_accounts(reader).await;

        assert!(matches!(result, Err(LedgerError::ParseError { .. })));
    }

    #[tokio::test]
    async fn test_async_reader_read_batch() {
        let csv_content = "tx,from,to,amount\n1,1,2,3\n1,3,1,2\n2,2,1,11\n3,1,3,1\n";
        let reader = Cursor::new(csv_content.as_bytes());
        let mut async_reader = AsyncReader::new(reader);

        let batch = async_reader.read_batch(2).await;
        assert_eq!(batch.len(), 2);
        assert_eq!(
            batch[0].transfers(),
            &[Transfer::new(1, 2, 3), Transfer::new(3, 1, 2)]
        );
        assert_eq!(batch[1].transfers(), &[Transfer::new(2, 1, 11)]);

        let batch = async_reader.read_batch(2).await;
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].transfers(), &[Transfer::new(1, 3, 1)]);

        assert!(async_reader.read_batch(2).await.is_empty());
    }

    #[tokio::test]
    async fn test_async_reader_carries_group_across_batches() {
        let csv_content = "tx,from,to,amount\n1,1,2,1\n2,1,2,1\n2,2,3,1\n2,3,1,1\n";
        let reader = Cursor::new(csv_content.as_bytes());
        let mut async_reader = AsyncReader::new(reader);

        let first = async_reader.read_batch(1).await;
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].len(), 1);

        let second = async_reader.read_batch(1).await;
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].len(), 3);
    }

    #[tokio::test]
    async fn test_async_reader_empty_csv() {
        let reader = Cursor::new("tx,from,to,amount\n".as_bytes());
        let mut async_reader = AsyncReader::new(reader);

        let batch = async_reader.read_batch(10).await;
        assert_eq!(batch.len(), 0);
    }

    #[tokio::test]
    async fn test_async_reader_skips_malformed_transaction() {
        let csv_content = "tx,from,to,amount\n1,1,2,oops\n2,1,2,5\nbad,1,2,3\n3,2,1,1\n";
        let reader = Cursor::new(csv_content.as_bytes());
        let mut async_reader = AsyncReader::new(reader);

        let batch = async_reader.read_batch(10).await;
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].transfers(), &[Transfer::new(2, 1, 1)]);
    }

    #[tokio::test]
    async fn test_async_reader_short_row_fails_its_group() {
        let csv_content = "tx,from,to,amount\n1,1,2,3\n1,3,1\n1,2,3,1\n";
        let reader = Cursor::new(csv_content.as_bytes());
        let mut async_reader = AsyncReader::new(reader);

        assert!(async_reader.read_batch(10).await.is_empty());
    }

    #[tokio::test]
    async fn test_async_reader_whitespace_handling() {
        let reader = Cursor::new("tx,from,to,amount\n  1 , 1 ,  2 , 7  \n".as_bytes());
        let mut async_reader = AsyncReader::new(reader);

        let batch = async_reader.read_batch(10).await;
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].transfers(), &[Transfer::new(1, 2, 7)]);
    }
}
