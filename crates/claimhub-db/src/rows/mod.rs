//! Typed row definitions for every registered prefix.
//!
//! Each key type packs to the exact bytes the upstream writer produces, with
//! the prefix byte first. Packing is total and injective over the row schema;
//! `unpack(pack(k)) == k` for every legal record. Partial packing of the
//! first `n` fields (the prefix counts as field 0) yields a strict byte
//! prefix of the full pack, which is what range scans seek to.

mod chain;
mod claim;
mod state;
mod utxo;

pub use chain::{BlockHashKey, BlockHashValue, TouchedClaimKey, TouchedClaimsValue,
    TouchedHashXKey, TouchedHashXsValue, UndoKey, UndoValue};
pub use claim::{ActivatedClaimKey, ActivatedClaimValue, ChannelToClaimKey, ClaimExpirationKey,
    ClaimShortIdKey, ClaimTakeoverKey, ClaimTakeoverValue, ClaimToChannelKey,
    ClaimToChannelValue, ClaimToTxoKey, ClaimToTxoValue, EffectiveAmountKey,
    PendingActivationKey, SupportAmountKey, TxoToClaimKey, TxoToClaimValue};
pub use state::{DbStateKey, DbStateValue};
pub use utxo::{HashXUtxoKey, UtxoKey};

use crate::error::Result;
use crate::prefix::Prefix;

/// A 20-byte claim or channel hash.
pub type ClaimHash = [u8; 20];

/// An 11-byte truncated script hash.
pub type HashX = [u8; 11];

/// A packed key under a fixed prefix.
pub trait RowKey: Sized {
    /// The prefix naming this row type and its column family.
    const PREFIX: Prefix;

    /// Number of schema fields after the prefix byte.
    const FIELD_COUNT: usize;

    /// Packs the full key.
    fn pack(&self) -> Vec<u8> {
        self.pack_partial(Self::FIELD_COUNT)
    }

    /// Packs the prefix byte plus the first `n_fields` fields. `n_fields` is
    /// clamped to `[0, FIELD_COUNT]`.
    fn pack_partial(&self, n_fields: usize) -> Vec<u8>;

    /// Unpacks a full key, failing on short input, a wrong prefix byte, or
    /// trailing garbage.
    fn unpack(raw: &[u8]) -> Result<Self>;
}

/// A packed value. Values carry no prefix byte of their own; the prefix is
/// passed in for error context only.
pub trait RowValue: Sized {
    fn pack(&self) -> Vec<u8>;

    fn unpack(prefix: Prefix, raw: &[u8]) -> Result<Self>;
}

/// Value that is exactly one claim hash; shared by the short-id,
/// effective-amount, channel-to-claim, expiration and activation rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimHashValue {
    pub claim_hash: ClaimHash,
}

impl RowValue for ClaimHashValue {
    fn pack(&self) -> Vec<u8> {
        self.claim_hash.to_vec()
    }

    fn unpack(prefix: Prefix, raw: &[u8]) -> Result<Self> {
        Self::parse(raw).map_err(|e| crate::codec::value_error(prefix, raw, e))
    }
}

impl ClaimHashValue {
    fn parse(raw: &[u8]) -> Result<Self, &'static str> {
        let mut cur = crate::codec::Cursor::new(raw);
        let claim_hash = cur.array()?;
        cur.finish()?;
        Ok(Self { claim_hash })
    }
}

/// Value that is exactly one amount; shared by the UTXO and support rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AmountValue {
    pub amount: u64,
}

impl RowValue for AmountValue {
    fn pack(&self) -> Vec<u8> {
        self.amount.to_be_bytes().to_vec()
    }

    fn unpack(prefix: Prefix, raw: &[u8]) -> Result<Self> {
        Self::parse(raw).map_err(|e| crate::codec::value_error(prefix, raw, e))
    }
}

impl AmountValue {
    fn parse(raw: &[u8]) -> Result<Self, &'static str> {
        let mut cur = crate::codec::Cursor::new(raw);
        let amount = cur.u64()?;
        cur.finish()?;
        Ok(Self { amount })
    }
}

/// Marker value for rows whose presence is the information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmptyValue;

impl RowValue for EmptyValue {
    fn pack(&self) -> Vec<u8> {
        Vec::new()
    }

    fn unpack(prefix: Prefix, raw: &[u8]) -> Result<Self> {
        if !raw.is_empty() {
            return Err(crate::codec::value_error(prefix, raw, "row has trailing bytes"));
        }
        Ok(Self)
    }
}
