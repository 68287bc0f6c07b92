//! Secondary-mode RocksDB adapter.
//!
//! The claim index is written by an external primary. This side opens the
//! same store as a read-only secondary replica: reads never block the writer,
//! and `try_catch_up_with_primary` advances the replica's visible state on
//! the follower's cadence. The secondary directory is a cache owned by
//! RocksDB and is safe to delete between runs.

use crate::error::{Error, Result};
use crate::iterator::{IterOptions, RowIter, TypedRowIter};
use crate::prefix::Prefix;
use crate::rows::{RowKey, RowValue};
use rocksdb::{ColumnFamily, Options, ReadOptions, DB};
use std::path::{Path, PathBuf};

/// Read-only handle on the claim index.
///
/// Column-family handles are immutable after open; the handle itself is
/// freely shareable behind an `Arc` and all reads take `&self`.
pub struct SecondaryDb {
    db: DB,
    primary_path: PathBuf,
}

impl SecondaryDb {
    /// Opens the store at `primary_path` as a secondary replica, with every
    /// registered column family.
    pub fn open(primary_path: &Path, secondary_path: &Path) -> Result<Self> {
        let mut opts = Options::default();
        // Secondary instances must keep every table file open.
        opts.set_max_open_files(-1);
        let mut cf_names = vec!["default"];
        cf_names.extend(Prefix::ALL.iter().map(|p| p.cf_name()));
        let db = DB::open_cf_as_secondary(&opts, primary_path, secondary_path, cf_names)?;

        tracing::info!(
            primary = %primary_path.display(),
            secondary = %secondary_path.display(),
            "opened claim index in secondary mode"
        );

        Ok(Self {
            db,
            primary_path: primary_path.to_path_buf(),
        })
    }

    /// The primary store this replica follows.
    pub fn primary_path(&self) -> &Path {
        &self.primary_path
    }

    /// Advances the replica to the primary's latest visible state.
    ///
    /// Safe to call concurrently with reads and idempotent within a tick.
    pub fn try_catch_up_with_primary(&self) -> Result<()> {
        self.db
            .try_catch_up_with_primary()
            .map_err(Error::CatchUpFailed)
    }

    /// The column-family handle for a prefix.
    pub fn cf(&self, prefix: Prefix) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(prefix.cf_name())
            .ok_or(Error::ColumnFamilyMissing(prefix))
    }

    /// Point lookup of a raw packed key.
    pub fn get_raw(&self, prefix: Prefix, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.db.get_cf(self.cf(prefix)?, key)?)
    }

    /// Typed point lookup. `Ok(None)` is expected absence.
    pub fn get<K, V>(&self, key: &K) -> Result<Option<V>>
    where
        K: RowKey,
        V: RowValue,
    {
        match self.get_raw(K::PREFIX, &key.pack())? {
            Some(raw) => Ok(Some(V::unpack(K::PREFIX, &raw)?)),
            None => Ok(None),
        }
    }

    /// Whether a row exists, without decoding its value.
    pub fn contains<K: RowKey>(&self, key: &K) -> Result<bool> {
        Ok(self.get_raw(K::PREFIX, &key.pack())?.is_some())
    }

    /// Raw bounded iteration over one column family.
    pub fn iter(&self, opts: IterOptions) -> Result<RowIter<'_>> {
        let mut read_opts = ReadOptions::default();
        read_opts.fill_cache(opts.fill_cache);
        let raw = self.db.raw_iterator_cf_opt(self.cf(opts.cf)?, read_opts);
        Ok(RowIter::new(raw, opts))
    }

    /// Typed bounded iteration; keys and values are decoded through the
    /// row's codec pair and a decode failure aborts the sequence.
    pub fn typed_iter<K, V>(&self, opts: IterOptions) -> Result<TypedRowIter<'_, K, V>>
    where
        K: RowKey,
        V: RowValue,
    {
        let opts = opts.with_include_key(true).with_include_value(true);
        Ok(TypedRowIter::new(self.iter(opts)?))
    }
}
