//! I/O module
//!
//! Handles CSV parsing and output, plus the compact scenario encoding.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (record conversion, grouping, output serialization)
//! - `sync_reader` - Synchronous readers with iterator interface
//! - `async_reader` - Asynchronous readers with batch reading interface
//! - `compact_format` - Flat integer encoding of whole scenarios and outcomes

pub mod async_reader;
pub mod compact_format;
pub mod csv_format;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use compact_format::{decode_scenario, encode_outcome, Scenario};
pub use csv_format::{
    convert_transfer_record, write_applied_csv, write_balances_csv, CsvTransferRecord,
    TransactionAssembler,
};
pub use sync_reader::{read_accounts, SyncReader};
