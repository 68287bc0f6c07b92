//! On-disk fixtures: a writable primary store the tests populate, plus the
//! secondary replica under test.
#![allow(dead_code)]

use claimhub_db::rows::{RowKey, RowValue};
use claimhub_db::{Prefix, SecondaryDb};
use rocksdb::{ColumnFamilyDescriptor, Options, DB};
use tempfile::TempDir;

pub struct Fixture {
    pub primary: DB,
    primary_dir: TempDir,
    secondary_dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let primary_dir = tempfile::tempdir().expect("create primary dir");
        let secondary_dir = tempfile::tempdir().expect("create secondary dir");

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        let cfs: Vec<ColumnFamilyDescriptor> = Prefix::ALL
            .iter()
            .map(|p| ColumnFamilyDescriptor::new(p.cf_name(), Options::default()))
            .collect();
        let primary =
            DB::open_cf_descriptors(&opts, primary_dir.path(), cfs).expect("open primary");

        Self {
            primary,
            primary_dir,
            secondary_dir,
        }
    }

    /// Writes one typed row through the normal write path.
    pub fn put<K: RowKey, V: RowValue>(&self, key: &K, value: &V) {
        let cf = self
            .primary
            .cf_handle(K::PREFIX.cf_name())
            .expect("column family");
        self.primary
            .put_cf(cf, key.pack(), value.pack())
            .expect("put row");
    }

    /// Writes a raw key/value pair into the column family of `prefix`.
    pub fn put_raw(&self, prefix: Prefix, key: &[u8], value: &[u8]) {
        let cf = self
            .primary
            .cf_handle(prefix.cf_name())
            .expect("column family");
        self.primary.put_cf(cf, key, value).expect("put raw row");
    }

    /// Deletes one typed row.
    pub fn delete<K: RowKey>(&self, key: &K) {
        let cf = self
            .primary
            .cf_handle(K::PREFIX.cf_name())
            .expect("column family");
        self.primary.delete_cf(cf, key.pack()).expect("delete row");
    }

    /// Flushes every column family so the secondary sees the writes.
    pub fn flush(&self) {
        for prefix in Prefix::ALL {
            let cf = self
                .primary
                .cf_handle(prefix.cf_name())
                .expect("column family");
            self.primary.flush_cf(cf).expect("flush column family");
        }
    }

    /// Opens a fresh secondary replica of the primary.
    pub fn secondary(&self) -> SecondaryDb {
        let db = SecondaryDb::open(self.primary_dir.path(), self.secondary_dir.path())
            .expect("open secondary");
        db.try_catch_up_with_primary().expect("initial catch-up");
        db
    }
}
