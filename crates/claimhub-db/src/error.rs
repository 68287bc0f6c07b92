//! Error types for the claim index store.

use crate::prefix::Prefix;

/// Errors that can occur while reading the claim index.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// RocksDB error, covering I/O failures and detected corruption.
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    /// IO error outside of RocksDB itself.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A registered column family was not present in the opened store.
    #[error("column family {0:?} is not open")]
    ColumnFamilyMissing(Prefix),

    /// A key did not match its row schema.
    #[error("malformed key under prefix {prefix:#04x}: {reason} (raw: {})", hex::encode(.raw))]
    MalformedKey {
        prefix: u8,
        raw: Vec<u8>,
        reason: &'static str,
    },

    /// A value did not match its row schema.
    #[error("malformed value under prefix {prefix:#04x}: {reason} (raw: {})", hex::encode(.raw))]
    MalformedValue {
        prefix: u8,
        raw: Vec<u8>,
        reason: &'static str,
    },

    /// The secondary instance failed to catch up with the primary.
    #[error("failed to catch up with primary: {0}")]
    CatchUpFailed(rocksdb::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
