//! Claim index rows: current TXO, reverse TXO, short-id, effective-amount
//! rank, channel membership, lifecycle and support rows.
//!
//! Normalized names are UTF-8. A name followed by further key fields carries
//! a big-endian `u16` length; a trailing name is packed raw to the end of the
//! row. The short-id partial is raw as well, delimited by the fixed-width
//! root TXO suffix, so that packing `(name, partial)` is a byte prefix of
//! every stored key whose partial extends it.

use crate::codec::{key_error, negate_amount, put_short_string, value_error, Cursor};
use crate::error::Result;
use crate::prefix::Prefix;
use crate::rows::{ClaimHash, RowKey, RowValue};

/// Key of the current TXO for a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimToTxoKey {
    pub claim_hash: ClaimHash,
}

impl RowKey for ClaimToTxoKey {
    const PREFIX: Prefix = Prefix::ClaimToTxo;
    const FIELD_COUNT: usize = 1;

    fn pack_partial(&self, n_fields: usize) -> Vec<u8> {
        let n = n_fields.min(Self::FIELD_COUNT);
        let mut key = Vec::with_capacity(21);
        key.push(Self::PREFIX.byte());
        if n >= 1 {
            key.extend_from_slice(&self.claim_hash);
        }
        key
    }

    fn unpack(raw: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(raw);
        let parse: Result<Self, &'static str> = (|| {
            cur.expect_prefix(Self::PREFIX)?;
            let claim_hash = cur.array()?;
            cur.finish()?;
            Ok(Self { claim_hash })
        })();
        parse.map_err(|e| key_error(Self::PREFIX, raw, e))
    }
}

/// Value of the current TXO for a claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimToTxoValue {
    pub tx_num: u32,
    pub position: u16,
    pub root_tx_num: u32,
    pub root_position: u16,
    pub amount: u64,
    pub channel_signature_is_valid: bool,
    pub name: String,
}

impl RowValue for ClaimToTxoValue {
    fn pack(&self) -> Vec<u8> {
        let mut value = Vec::with_capacity(21 + self.name.len());
        value.extend_from_slice(&self.tx_num.to_be_bytes());
        value.extend_from_slice(&self.position.to_be_bytes());
        value.extend_from_slice(&self.root_tx_num.to_be_bytes());
        value.extend_from_slice(&self.root_position.to_be_bytes());
        value.extend_from_slice(&self.amount.to_be_bytes());
        value.push(u8::from(self.channel_signature_is_valid));
        value.extend_from_slice(self.name.as_bytes());
        value
    }

    fn unpack(prefix: Prefix, raw: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(raw);
        let parse: Result<Self, &'static str> = (|| {
            Ok(Self {
                tx_num: cur.u32()?,
                position: cur.u16()?,
                root_tx_num: cur.u32()?,
                root_position: cur.u16()?,
                amount: cur.u64()?,
                channel_signature_is_valid: cur.bool()?,
                name: cur.trailing_string()?,
            })
        })();
        parse.map_err(|e| value_error(prefix, raw, e))
    }
}

/// Key of the TXO-to-claim reverse index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TxoToClaimKey {
    pub tx_num: u32,
    pub position: u16,
}

impl RowKey for TxoToClaimKey {
    const PREFIX: Prefix = Prefix::TxoToClaim;
    const FIELD_COUNT: usize = 2;

    fn pack_partial(&self, n_fields: usize) -> Vec<u8> {
        let n = n_fields.min(Self::FIELD_COUNT);
        let mut key = Vec::with_capacity(7);
        key.push(Self::PREFIX.byte());
        if n >= 1 {
            key.extend_from_slice(&self.tx_num.to_be_bytes());
        }
        if n >= 2 {
            key.extend_from_slice(&self.position.to_be_bytes());
        }
        key
    }

    fn unpack(raw: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(raw);
        let parse: Result<Self, &'static str> = (|| {
            cur.expect_prefix(Self::PREFIX)?;
            let tx_num = cur.u32()?;
            let position = cur.u16()?;
            cur.finish()?;
            Ok(Self { tx_num, position })
        })();
        parse.map_err(|e| key_error(Self::PREFIX, raw, e))
    }
}

/// Value of the TXO-to-claim reverse index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxoToClaimValue {
    pub claim_hash: ClaimHash,
    pub name: String,
}

impl RowValue for TxoToClaimValue {
    fn pack(&self) -> Vec<u8> {
        let mut value = Vec::with_capacity(20 + self.name.len());
        value.extend_from_slice(&self.claim_hash);
        value.extend_from_slice(self.name.as_bytes());
        value
    }

    fn unpack(prefix: Prefix, raw: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(raw);
        let parse: Result<Self, &'static str> = (|| {
            Ok(Self {
                claim_hash: cur.array()?,
                name: cur.trailing_string()?,
            })
        })();
        parse.map_err(|e| value_error(prefix, raw, e))
    }
}

/// Key of the shortest-unambiguous-id index.
///
/// `partial_claim_id` is a lowercase hex prefix of the claim id. It is packed
/// raw so that a seek on `(name, partial)` covers every stored extension of
/// the partial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimShortIdKey {
    pub normalized_name: String,
    pub partial_claim_id: String,
    pub root_tx_num: u32,
    pub root_position: u16,
}

impl RowKey for ClaimShortIdKey {
    const PREFIX: Prefix = Prefix::ClaimShortId;
    const FIELD_COUNT: usize = 4;

    fn pack_partial(&self, n_fields: usize) -> Vec<u8> {
        let n = n_fields.min(Self::FIELD_COUNT);
        let mut key = Vec::with_capacity(9 + self.normalized_name.len() + self.partial_claim_id.len());
        key.push(Self::PREFIX.byte());
        if n >= 1 {
            put_short_string(&mut key, &self.normalized_name);
        }
        if n >= 2 {
            key.extend_from_slice(self.partial_claim_id.as_bytes());
        }
        if n >= 3 {
            key.extend_from_slice(&self.root_tx_num.to_be_bytes());
        }
        if n >= 4 {
            key.extend_from_slice(&self.root_position.to_be_bytes());
        }
        key
    }

    fn unpack(raw: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(raw);
        let parse: Result<Self, &'static str> = (|| {
            cur.expect_prefix(Self::PREFIX)?;
            let normalized_name = cur.short_string()?;
            let partial = cur.until_suffix(6)?;
            let partial_claim_id = String::from_utf8(partial.to_vec())
                .map_err(|_| "string field is not valid UTF-8")?;
            let root_tx_num = cur.u32()?;
            let root_position = cur.u16()?;
            cur.finish()?;
            Ok(Self {
                normalized_name,
                partial_claim_id,
                root_tx_num,
                root_position,
            })
        })();
        parse.map_err(|e| key_error(Self::PREFIX, raw, e))
    }
}

/// Key of the per-name effective-amount rank.
///
/// The amount is stored negated (`u64::MAX - amount`) so that ascending byte
/// order walks claims from the highest effective amount down, ties broken by
/// `(tx_num, position)` ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveAmountKey {
    pub normalized_name: String,
    pub effective_amount: u64,
    pub tx_num: u32,
    pub position: u16,
}

impl RowKey for EffectiveAmountKey {
    const PREFIX: Prefix = Prefix::EffectiveAmount;
    const FIELD_COUNT: usize = 4;

    fn pack_partial(&self, n_fields: usize) -> Vec<u8> {
        let n = n_fields.min(Self::FIELD_COUNT);
        let mut key = Vec::with_capacity(17 + self.normalized_name.len());
        key.push(Self::PREFIX.byte());
        if n >= 1 {
            put_short_string(&mut key, &self.normalized_name);
        }
        if n >= 2 {
            key.extend_from_slice(&negate_amount(self.effective_amount).to_be_bytes());
        }
        if n >= 3 {
            key.extend_from_slice(&self.tx_num.to_be_bytes());
        }
        if n >= 4 {
            key.extend_from_slice(&self.position.to_be_bytes());
        }
        key
    }

    fn unpack(raw: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(raw);
        let parse: Result<Self, &'static str> = (|| {
            cur.expect_prefix(Self::PREFIX)?;
            let normalized_name = cur.short_string()?;
            let effective_amount = negate_amount(cur.u64()?);
            let tx_num = cur.u32()?;
            let position = cur.u16()?;
            cur.finish()?;
            Ok(Self {
                normalized_name,
                effective_amount,
                tx_num,
                position,
            })
        })();
        parse.map_err(|e| key_error(Self::PREFIX, raw, e))
    }
}

/// Key of the claim-to-channel index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimToChannelKey {
    pub claim_hash: ClaimHash,
    pub tx_num: u32,
    pub position: u16,
}

impl RowKey for ClaimToChannelKey {
    const PREFIX: Prefix = Prefix::ClaimToChannel;
    const FIELD_COUNT: usize = 3;

    fn pack_partial(&self, n_fields: usize) -> Vec<u8> {
        let n = n_fields.min(Self::FIELD_COUNT);
        let mut key = Vec::with_capacity(27);
        key.push(Self::PREFIX.byte());
        if n >= 1 {
            key.extend_from_slice(&self.claim_hash);
        }
        if n >= 2 {
            key.extend_from_slice(&self.tx_num.to_be_bytes());
        }
        if n >= 3 {
            key.extend_from_slice(&self.position.to_be_bytes());
        }
        key
    }

    fn unpack(raw: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(raw);
        let parse: Result<Self, &'static str> = (|| {
            cur.expect_prefix(Self::PREFIX)?;
            let claim_hash = cur.array()?;
            let tx_num = cur.u32()?;
            let position = cur.u16()?;
            cur.finish()?;
            Ok(Self {
                claim_hash,
                tx_num,
                position,
            })
        })();
        parse.map_err(|e| key_error(Self::PREFIX, raw, e))
    }
}

/// Value of the claim-to-channel index: the signing channel's hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimToChannelValue {
    pub channel_hash: ClaimHash,
}

impl RowValue for ClaimToChannelValue {
    fn pack(&self) -> Vec<u8> {
        self.channel_hash.to_vec()
    }

    fn unpack(prefix: Prefix, raw: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(raw);
        let parse: Result<Self, &'static str> = (|| {
            let channel_hash = cur.array()?;
            cur.finish()?;
            Ok(Self { channel_hash })
        })();
        parse.map_err(|e| value_error(prefix, raw, e))
    }
}

/// Key of the channel-to-claim membership index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelToClaimKey {
    pub channel_hash: ClaimHash,
    pub tx_num: u32,
    pub position: u16,
}

impl RowKey for ChannelToClaimKey {
    const PREFIX: Prefix = Prefix::ChannelToClaim;
    const FIELD_COUNT: usize = 3;

    fn pack_partial(&self, n_fields: usize) -> Vec<u8> {
        let n = n_fields.min(Self::FIELD_COUNT);
        let mut key = Vec::with_capacity(27);
        key.push(Self::PREFIX.byte());
        if n >= 1 {
            key.extend_from_slice(&self.channel_hash);
        }
        if n >= 2 {
            key.extend_from_slice(&self.tx_num.to_be_bytes());
        }
        if n >= 3 {
            key.extend_from_slice(&self.position.to_be_bytes());
        }
        key
    }

    fn unpack(raw: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(raw);
        let parse: Result<Self, &'static str> = (|| {
            cur.expect_prefix(Self::PREFIX)?;
            let channel_hash = cur.array()?;
            let tx_num = cur.u32()?;
            let position = cur.u16()?;
            cur.finish()?;
            Ok(Self {
                channel_hash,
                tx_num,
                position,
            })
        })();
        parse.map_err(|e| key_error(Self::PREFIX, raw, e))
    }
}

/// Key of the expiration schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimExpirationKey {
    pub height: u32,
    pub tx_num: u32,
    pub position: u16,
}

impl RowKey for ClaimExpirationKey {
    const PREFIX: Prefix = Prefix::ClaimExpiration;
    const FIELD_COUNT: usize = 3;

    fn pack_partial(&self, n_fields: usize) -> Vec<u8> {
        let n = n_fields.min(Self::FIELD_COUNT);
        let mut key = Vec::with_capacity(11);
        key.push(Self::PREFIX.byte());
        if n >= 1 {
            key.extend_from_slice(&self.height.to_be_bytes());
        }
        if n >= 2 {
            key.extend_from_slice(&self.tx_num.to_be_bytes());
        }
        if n >= 3 {
            key.extend_from_slice(&self.position.to_be_bytes());
        }
        key
    }

    fn unpack(raw: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(raw);
        let parse: Result<Self, &'static str> = (|| {
            cur.expect_prefix(Self::PREFIX)?;
            let height = cur.u32()?;
            let tx_num = cur.u32()?;
            let position = cur.u16()?;
            cur.finish()?;
            Ok(Self {
                height,
                tx_num,
                position,
            })
        })();
        parse.map_err(|e| key_error(Self::PREFIX, raw, e))
    }
}

/// Key of the takeover row: one per normalized name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimTakeoverKey {
    pub normalized_name: String,
}

impl RowKey for ClaimTakeoverKey {
    const PREFIX: Prefix = Prefix::ClaimTakeover;
    const FIELD_COUNT: usize = 1;

    fn pack_partial(&self, n_fields: usize) -> Vec<u8> {
        let n = n_fields.min(Self::FIELD_COUNT);
        let mut key = Vec::with_capacity(1 + self.normalized_name.len());
        key.push(Self::PREFIX.byte());
        if n >= 1 {
            key.extend_from_slice(self.normalized_name.as_bytes());
        }
        key
    }

    fn unpack(raw: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(raw);
        let parse: Result<Self, &'static str> = (|| {
            cur.expect_prefix(Self::PREFIX)?;
            let normalized_name = cur.trailing_string()?;
            Ok(Self { normalized_name })
        })();
        parse.map_err(|e| key_error(Self::PREFIX, raw, e))
    }
}

/// Value of the takeover row: the controlling claim and when it took over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimTakeoverValue {
    pub claim_hash: ClaimHash,
    pub height: u32,
}

impl RowValue for ClaimTakeoverValue {
    fn pack(&self) -> Vec<u8> {
        let mut value = Vec::with_capacity(24);
        value.extend_from_slice(&self.claim_hash);
        value.extend_from_slice(&self.height.to_be_bytes());
        value
    }

    fn unpack(prefix: Prefix, raw: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(raw);
        let parse: Result<Self, &'static str> = (|| {
            let claim_hash = cur.array()?;
            let height = cur.u32()?;
            cur.finish()?;
            Ok(Self { claim_hash, height })
        })();
        parse.map_err(|e| value_error(prefix, raw, e))
    }
}

/// Key of the height-ordered activation schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingActivationKey {
    pub height: u32,
    pub tx_num: u32,
    pub position: u16,
}

impl RowKey for PendingActivationKey {
    const PREFIX: Prefix = Prefix::PendingActivation;
    const FIELD_COUNT: usize = 3;

    fn pack_partial(&self, n_fields: usize) -> Vec<u8> {
        let n = n_fields.min(Self::FIELD_COUNT);
        let mut key = Vec::with_capacity(11);
        key.push(Self::PREFIX.byte());
        if n >= 1 {
            key.extend_from_slice(&self.height.to_be_bytes());
        }
        if n >= 2 {
            key.extend_from_slice(&self.tx_num.to_be_bytes());
        }
        if n >= 3 {
            key.extend_from_slice(&self.position.to_be_bytes());
        }
        key
    }

    fn unpack(raw: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(raw);
        let parse: Result<Self, &'static str> = (|| {
            cur.expect_prefix(Self::PREFIX)?;
            let height = cur.u32()?;
            let tx_num = cur.u32()?;
            let position = cur.u16()?;
            cur.finish()?;
            Ok(Self {
                height,
                tx_num,
                position,
            })
        })();
        parse.map_err(|e| key_error(Self::PREFIX, raw, e))
    }
}

/// Key of the activation-by-TXO index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivatedClaimKey {
    pub tx_num: u32,
    pub position: u16,
}

impl RowKey for ActivatedClaimKey {
    const PREFIX: Prefix = Prefix::ActivatedClaim;
    const FIELD_COUNT: usize = 2;

    fn pack_partial(&self, n_fields: usize) -> Vec<u8> {
        let n = n_fields.min(Self::FIELD_COUNT);
        let mut key = Vec::with_capacity(7);
        key.push(Self::PREFIX.byte());
        if n >= 1 {
            key.extend_from_slice(&self.tx_num.to_be_bytes());
        }
        if n >= 2 {
            key.extend_from_slice(&self.position.to_be_bytes());
        }
        key
    }

    fn unpack(raw: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(raw);
        let parse: Result<Self, &'static str> = (|| {
            cur.expect_prefix(Self::PREFIX)?;
            let tx_num = cur.u32()?;
            let position = cur.u16()?;
            cur.finish()?;
            Ok(Self { tx_num, position })
        })();
        parse.map_err(|e| key_error(Self::PREFIX, raw, e))
    }
}

/// Value of the activation-by-TXO index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivatedClaimValue {
    pub height: u32,
    pub claim_hash: ClaimHash,
}

impl RowValue for ActivatedClaimValue {
    fn pack(&self) -> Vec<u8> {
        let mut value = Vec::with_capacity(24);
        value.extend_from_slice(&self.height.to_be_bytes());
        value.extend_from_slice(&self.claim_hash);
        value
    }

    fn unpack(prefix: Prefix, raw: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(raw);
        let parse: Result<Self, &'static str> = (|| {
            let height = cur.u32()?;
            let claim_hash = cur.array()?;
            cur.finish()?;
            Ok(Self { height, claim_hash })
        })();
        parse.map_err(|e| value_error(prefix, raw, e))
    }
}

/// Key of the aggregate support-amount row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportAmountKey {
    pub claim_hash: ClaimHash,
}

impl RowKey for SupportAmountKey {
    const PREFIX: Prefix = Prefix::SupportAmount;
    const FIELD_COUNT: usize = 1;

    fn pack_partial(&self, n_fields: usize) -> Vec<u8> {
        let n = n_fields.min(Self::FIELD_COUNT);
        let mut key = Vec::with_capacity(21);
        key.push(Self::PREFIX.byte());
        if n >= 1 {
            key.extend_from_slice(&self.claim_hash);
        }
        key
    }

    fn unpack(raw: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(raw);
        let parse: Result<Self, &'static str> = (|| {
            cur.expect_prefix(Self::PREFIX)?;
            let claim_hash = cur.array()?;
            cur.finish()?;
            Ok(Self { claim_hash })
        })();
        parse.map_err(|e| key_error(Self::PREFIX, raw, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rows::ClaimHashValue;

    const HASH: ClaimHash = [0xab; 20];

    #[test]
    fn claim_to_txo_round_trip() {
        let key = ClaimToTxoKey { claim_hash: HASH };
        let packed = key.pack();
        assert_eq!(packed.len(), 21);
        assert_eq!(packed[0], b'E');
        assert_eq!(ClaimToTxoKey::unpack(&packed).unwrap(), key);

        let value = ClaimToTxoValue {
            tx_num: 7,
            position: 2,
            root_tx_num: 7,
            root_position: 2,
            amount: 5_000,
            channel_signature_is_valid: true,
            name: "hello world".to_owned(),
        };
        let raw = value.pack();
        assert_eq!(
            ClaimToTxoValue::unpack(Prefix::ClaimToTxo, &raw).unwrap(),
            value
        );
    }

    #[test]
    fn claim_to_txo_rejects_wrong_prefix() {
        let mut packed = ClaimToTxoKey { claim_hash: HASH }.pack();
        packed[0] = b'G';
        assert!(ClaimToTxoKey::unpack(&packed).is_err());
    }

    #[test]
    fn claim_to_txo_rejects_short_key() {
        let packed = ClaimToTxoKey { claim_hash: HASH }.pack();
        assert!(ClaimToTxoKey::unpack(&packed[..10]).is_err());
    }

    #[test]
    fn short_id_round_trip_and_partials() {
        let key = ClaimShortIdKey {
            normalized_name: "hello world".to_owned(),
            partial_claim_id: "deadbeef".to_owned(),
            root_tx_num: 1234,
            root_position: 5,
        };
        let packed = key.pack();
        assert_eq!(ClaimShortIdKey::unpack(&packed).unwrap(), key);

        for n in 0..=ClaimShortIdKey::FIELD_COUNT {
            assert!(packed.starts_with(&key.pack_partial(n)), "n = {n}");
        }
        // Clamped above the field count.
        assert_eq!(key.pack_partial(usize::MAX), packed);
    }

    #[test]
    fn short_id_partial_covers_extensions() {
        let stored = ClaimShortIdKey {
            normalized_name: "name".to_owned(),
            partial_claim_id: "deadbeef".to_owned(),
            root_tx_num: 9,
            root_position: 0,
        };
        let query = ClaimShortIdKey {
            normalized_name: "name".to_owned(),
            partial_claim_id: "dead".to_owned(),
            root_tx_num: 0,
            root_position: 0,
        };
        assert!(stored.pack().starts_with(&query.pack_partial(2)));
    }

    #[test]
    fn effective_amount_orders_descending() {
        let make = |amount: u64, tx_num: u32| EffectiveAmountKey {
            normalized_name: "name".to_owned(),
            effective_amount: amount,
            tx_num,
            position: 0,
        };
        let big = make(600, 5).pack();
        let small = make(300, 1).pack();
        assert!(big < small, "larger amounts must sort first");
        assert_eq!(EffectiveAmountKey::unpack(&big).unwrap().effective_amount, 600);

        // Ties break by tx_num ascending.
        let first = make(300, 1).pack();
        let second = make(300, 2).pack();
        assert!(first < second);
    }

    #[test]
    fn takeover_round_trip() {
        let key = ClaimTakeoverKey {
            normalized_name: "name".to_owned(),
        };
        assert_eq!(ClaimTakeoverKey::unpack(&key.pack()).unwrap(), key);

        let value = ClaimTakeoverValue {
            claim_hash: HASH,
            height: 1_000,
        };
        let raw = value.pack();
        assert_eq!(
            ClaimTakeoverValue::unpack(Prefix::ClaimTakeover, &raw).unwrap(),
            value
        );
    }

    #[test]
    fn claim_hash_value_rejects_trailing_bytes() {
        let mut raw = ClaimHashValue { claim_hash: HASH }.pack();
        raw.push(0);
        assert!(ClaimHashValue::unpack(Prefix::ClaimShortId, &raw).is_err());
    }
}
