//! Per-address unspent output rows.

use crate::codec::{key_error, Cursor};
use crate::error::Result;
use crate::prefix::Prefix;
use crate::rows::{HashX, RowKey};

/// Key of the UTXO index: `(hashX, tx_num, nout)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UtxoKey {
    pub hashx: HashX,
    pub tx_num: u32,
    pub nout: u16,
}

impl RowKey for UtxoKey {
    const PREFIX: Prefix = Prefix::Utxo;
    const FIELD_COUNT: usize = 3;

    fn pack_partial(&self, n_fields: usize) -> Vec<u8> {
        let n = n_fields.min(Self::FIELD_COUNT);
        let mut key = Vec::with_capacity(18);
        key.push(Self::PREFIX.byte());
        if n >= 1 {
            key.extend_from_slice(&self.hashx);
        }
        if n >= 2 {
            key.extend_from_slice(&self.tx_num.to_be_bytes());
        }
        if n >= 3 {
            key.extend_from_slice(&self.nout.to_be_bytes());
        }
        key
    }

    fn unpack(raw: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(raw);
        let parse: Result<Self, &'static str> = (|| {
            cur.expect_prefix(Self::PREFIX)?;
            let hashx = cur.array()?;
            let tx_num = cur.u32()?;
            let nout = cur.u16()?;
            cur.finish()?;
            Ok(Self {
                hashx,
                tx_num,
                nout,
            })
        })();
        parse.map_err(|e| key_error(Self::PREFIX, raw, e))
    }
}

/// Key of the reverse UTXO marker index. Same shape as [`UtxoKey`] under its
/// own prefix; the row's presence is the information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct HashXUtxoKey {
    pub hashx: HashX,
    pub tx_num: u32,
    pub nout: u16,
}

impl RowKey for HashXUtxoKey {
    const PREFIX: Prefix = Prefix::HashXUtxo;
    const FIELD_COUNT: usize = 3;

    fn pack_partial(&self, n_fields: usize) -> Vec<u8> {
        let n = n_fields.min(Self::FIELD_COUNT);
        let mut key = Vec::with_capacity(18);
        key.push(Self::PREFIX.byte());
        if n >= 1 {
            key.extend_from_slice(&self.hashx);
        }
        if n >= 2 {
            key.extend_from_slice(&self.tx_num.to_be_bytes());
        }
        if n >= 3 {
            key.extend_from_slice(&self.nout.to_be_bytes());
        }
        key
    }

    fn unpack(raw: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(raw);
        let parse: Result<Self, &'static str> = (|| {
            cur.expect_prefix(Self::PREFIX)?;
            let hashx = cur.array()?;
            let tx_num = cur.u32()?;
            let nout = cur.u16()?;
            cur.finish()?;
            Ok(Self {
                hashx,
                tx_num,
                nout,
            })
        })();
        parse.map_err(|e| key_error(Self::PREFIX, raw, e))
    }
}
