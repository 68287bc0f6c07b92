//! The singleton DB-state row: the read side's snapshot of the writer.

use crate::codec::{key_error, value_error, Cursor};
use crate::error::Result;
use crate::prefix::Prefix;
use crate::rows::{RowKey, RowValue};

/// Key of the DB-state singleton; the prefix byte is the whole key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DbStateKey;

impl RowKey for DbStateKey {
    const PREFIX: Prefix = Prefix::DbState;
    const FIELD_COUNT: usize = 0;

    fn pack_partial(&self, _n_fields: usize) -> Vec<u8> {
        vec![Self::PREFIX.byte()]
    }

    fn unpack(raw: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(raw);
        let parse: Result<Self, &'static str> = (|| {
            cur.expect_prefix(Self::PREFIX)?;
            cur.finish()?;
            Ok(Self)
        })();
        parse.map_err(|e| key_error(Self::PREFIX, raw, e))
    }
}

/// The writer's published state. A snapshot of this value, taken after a
/// catch-up, is what readers observe through the follower.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbStateValue {
    pub genesis: [u8; 32],
    pub height: u32,
    pub tx_count: u32,
    pub tip: [u8; 32],
    pub utxo_flush_count: u32,
    pub wall_time: u32,
    pub first_sync: bool,
    pub db_version: u8,
    pub hist_flush_count: u32,
    pub comp_flush_count: i32,
    pub comp_cursor: i32,
    pub es_sync_height: u32,
}

impl RowValue for DbStateValue {
    fn pack(&self) -> Vec<u8> {
        let mut value = Vec::with_capacity(98);
        value.extend_from_slice(&self.genesis);
        value.extend_from_slice(&self.height.to_be_bytes());
        value.extend_from_slice(&self.tx_count.to_be_bytes());
        value.extend_from_slice(&self.tip);
        value.extend_from_slice(&self.utxo_flush_count.to_be_bytes());
        value.extend_from_slice(&self.wall_time.to_be_bytes());
        value.push(u8::from(self.first_sync));
        value.push(self.db_version);
        value.extend_from_slice(&self.hist_flush_count.to_be_bytes());
        value.extend_from_slice(&self.comp_flush_count.to_be_bytes());
        value.extend_from_slice(&self.comp_cursor.to_be_bytes());
        value.extend_from_slice(&self.es_sync_height.to_be_bytes());
        value
    }

    fn unpack(prefix: Prefix, raw: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(raw);
        let parse: Result<Self, &'static str> = (|| {
            let state = Self {
                genesis: cur.array()?,
                height: cur.u32()?,
                tx_count: cur.u32()?,
                tip: cur.array()?,
                utxo_flush_count: cur.u32()?,
                wall_time: cur.u32()?,
                first_sync: cur.bool()?,
                db_version: cur.u8()?,
                hist_flush_count: cur.u32()?,
                comp_flush_count: cur.i32()?,
                comp_cursor: cur.i32()?,
                es_sync_height: cur.u32()?,
            };
            cur.finish()?;
            Ok(state)
        })();
        parse.map_err(|e| value_error(prefix, raw, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DbStateValue {
        DbStateValue {
            genesis: [9; 32],
            height: 1_072_108,
            tx_count: 400_000_000,
            tip: [4; 32],
            utxo_flush_count: 12,
            wall_time: 1_650_000_000,
            first_sync: false,
            db_version: 7,
            hist_flush_count: 12,
            comp_flush_count: -1,
            comp_cursor: -1,
            es_sync_height: 1_072_108,
        }
    }

    #[test]
    fn key_is_the_prefix_byte() {
        assert_eq!(DbStateKey.pack(), vec![b's']);
        assert_eq!(DbStateKey::unpack(&[b's']).unwrap(), DbStateKey);
        assert!(DbStateKey::unpack(&[b's', 0]).is_err());
    }

    #[test]
    fn state_round_trip() {
        let state = sample();
        let raw = state.pack();
        assert_eq!(raw.len(), 98);
        assert_eq!(DbStateValue::unpack(Prefix::DbState, &raw).unwrap(), state);
    }

    #[test]
    fn state_rejects_truncation() {
        let raw = sample().pack();
        assert!(DbStateValue::unpack(Prefix::DbState, &raw[..raw.len() - 1]).is_err());
    }
}
