//! Bounded, lazy iteration over one column family.
//!
//! A sequence is described by `{prefix, start, stop}` plus inclusivity
//! flags. The underlying RocksDB raw iterator hands out borrowed buffers
//! that are invalidated by the next advance, so every yielded row owns
//! copies of the bytes it exposes. Dropping the sequence releases the raw
//! iterator and its read options.

use crate::error::Result;
use crate::prefix::Prefix;
use crate::rows::{RowKey, RowValue};
use rocksdb::DBRawIterator;
use std::marker::PhantomData;

/// Bounds and flags for one iteration.
///
/// Defaults: no explicit bounds beyond the column family's own prefix byte,
/// start included, stop excluded, keys copied, values skipped, cache not
/// polluted.
#[derive(Debug, Clone)]
pub struct IterOptions {
    pub cf: Prefix,
    pub prefix: Option<Vec<u8>>,
    pub start: Option<Vec<u8>>,
    pub stop: Option<Vec<u8>>,
    pub include_start: bool,
    pub include_stop: bool,
    pub include_key: bool,
    pub include_value: bool,
    pub fill_cache: bool,
}

impl IterOptions {
    pub fn new(cf: Prefix) -> Self {
        Self {
            cf,
            prefix: Some(vec![cf.byte()]),
            start: None,
            stop: None,
            include_start: true,
            include_stop: false,
            include_key: true,
            include_value: false,
            fill_cache: false,
        }
    }

    /// Constrains the sequence to keys beginning with `prefix`, typically a
    /// partial pack of the leading key fields.
    pub fn with_prefix(mut self, prefix: Vec<u8>) -> Self {
        self.prefix = Some(prefix);
        self
    }

    pub fn with_start(mut self, start: Vec<u8>) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_stop(mut self, stop: Vec<u8>) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn with_include_start(mut self, include_start: bool) -> Self {
        self.include_start = include_start;
        self
    }

    pub fn with_include_stop(mut self, include_stop: bool) -> Self {
        self.include_stop = include_stop;
        self
    }

    pub fn with_include_key(mut self, include_key: bool) -> Self {
        self.include_key = include_key;
        self
    }

    pub fn with_include_value(mut self, include_value: bool) -> Self {
        self.include_value = include_value;
        self
    }

    pub fn with_fill_cache(mut self, fill_cache: bool) -> Self {
        self.fill_cache = fill_cache;
        self
    }
}

/// One emitted row. Fields not selected by `include_key`/`include_value`
/// are left empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

/// Lazy sequence of raw rows; advancement happens on consumer demand.
pub struct RowIter<'db> {
    raw: DBRawIterator<'db>,
    opts: IterOptions,
    prev_key: Option<Vec<u8>>,
    pub(crate) done: bool,
}

impl<'db> RowIter<'db> {
    pub(crate) fn new(mut raw: DBRawIterator<'db>, opts: IterOptions) -> Self {
        match (&opts.start, &opts.prefix) {
            (Some(start), _) => raw.seek(start),
            (None, Some(prefix)) => raw.seek(prefix),
            (None, None) => raw.seek([opts.cf.byte()]),
        }
        if !opts.include_start && raw.valid() {
            raw.next();
        }
        Self {
            raw,
            opts,
            prev_key: None,
            done: false,
        }
    }

    /// Whether `key` lies past the sequence's bounds.
    fn stop_iteration(&self, key: &[u8]) -> bool {
        if let Some(stop) = &self.opts.stop {
            let head = &key[..stop.len().min(key.len())];
            if key.starts_with(stop) || stop.as_slice() < head {
                return true;
            }
        }
        if let Some(start) = &self.opts.start {
            let head = &key[..start.len().min(key.len())];
            if start.as_slice() > head {
                return true;
            }
        }
        if let Some(prefix) = &self.opts.prefix {
            if !key.starts_with(prefix) {
                return true;
            }
        }
        false
    }
}

impl Iterator for RowIter<'_> {
    type Item = Result<RawRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        // The previous key decides whether the sequence already ran past its
        // bounds; this is what lets `include_stop` emit the boundary row.
        if let Some(prev) = &self.prev_key {
            if self.stop_iteration(prev) {
                self.done = true;
                return None;
            }
        }

        if !self.raw.valid() {
            self.done = true;
            return match self.raw.status() {
                Ok(()) => None,
                Err(e) => Some(Err(e.into())),
            };
        }

        // Copy before any further advance; the borrowed buffer does not
        // outlive the next raw iterator call.
        let key: Vec<u8> = self.raw.key()?.to_vec();

        if !self.opts.include_stop && self.stop_iteration(&key) {
            self.done = true;
            return None;
        }

        let value = if self.opts.include_value {
            self.raw.value().map(<[u8]>::to_vec).unwrap_or_default()
        } else {
            Vec::new()
        };
        let out_key = if self.opts.include_key {
            key.clone()
        } else {
            Vec::new()
        };

        self.prev_key = Some(key);
        self.raw.next();

        Some(Ok(RawRow {
            key: out_key,
            value,
        }))
    }
}

/// Typed adapter over [`RowIter`]: decodes each row through the key/value
/// codec pair. A malformed row aborts the sequence after surfacing the
/// decode error.
pub struct TypedRowIter<'db, K, V> {
    inner: RowIter<'db>,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<'db, K, V> TypedRowIter<'db, K, V> {
    pub(crate) fn new(inner: RowIter<'db>) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }
}

impl<K, V> Iterator for TypedRowIter<'_, K, V>
where
    K: RowKey,
    V: RowValue,
{
    type Item = Result<(K, V)>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = match self.inner.next()? {
            Ok(row) => row,
            Err(e) => return Some(Err(e)),
        };
        let decoded = K::unpack(&row.key)
            .and_then(|key| V::unpack(K::PREFIX, &row.value).map(|value| (key, value)));
        match decoded {
            Ok(pair) => Some(Ok(pair)),
            Err(e) => {
                self.inner.done = true;
                Some(Err(e))
            }
        }
    }
}
