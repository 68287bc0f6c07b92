//! Chain-level rows: block hashes, per-height touched sets and undo blobs.

use crate::codec::{key_error, value_error, Cursor};
use crate::error::Result;
use crate::prefix::Prefix;
use crate::rows::{ClaimHash, HashX, RowKey, RowValue};

macro_rules! height_key {
    ($(#[$doc:meta])* $name:ident, $prefix:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
        pub struct $name {
            pub height: u32,
        }

        impl RowKey for $name {
            const PREFIX: Prefix = $prefix;
            const FIELD_COUNT: usize = 1;

            fn pack_partial(&self, n_fields: usize) -> Vec<u8> {
                let n = n_fields.min(Self::FIELD_COUNT);
                let mut key = Vec::with_capacity(5);
                key.push(Self::PREFIX.byte());
                if n >= 1 {
                    key.extend_from_slice(&self.height.to_be_bytes());
                }
                key
            }

            fn unpack(raw: &[u8]) -> Result<Self> {
                let mut cur = Cursor::new(raw);
                let parse: Result<Self, &'static str> = (|| {
                    cur.expect_prefix(Self::PREFIX)?;
                    let height = cur.u32()?;
                    cur.finish()?;
                    Ok(Self { height })
                })();
                parse.map_err(|e| key_error(Self::PREFIX, raw, e))
            }
        }
    };
}

height_key!(
    /// Key of the block-hash-by-height row.
    BlockHashKey,
    Prefix::BlockHash
);
height_key!(
    /// Key of the touched-claims row for one height.
    TouchedClaimKey,
    Prefix::TouchedClaim
);
height_key!(
    /// Key of the touched-hashX row for one height.
    TouchedHashXKey,
    Prefix::TouchedHashX
);
height_key!(
    /// Key of the writer's undo blob for one height.
    UndoKey,
    Prefix::Undo
);

/// Value of the block-hash row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockHashValue {
    pub block_hash: [u8; 32],
}

impl RowValue for BlockHashValue {
    fn pack(&self) -> Vec<u8> {
        self.block_hash.to_vec()
    }

    fn unpack(prefix: Prefix, raw: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(raw);
        let parse: Result<Self, &'static str> = (|| {
            let block_hash = cur.array()?;
            cur.finish()?;
            Ok(Self { block_hash })
        })();
        parse.map_err(|e| value_error(prefix, raw, e))
    }
}

/// Claim hashes touched at a height, concatenated; the count is implied by
/// the row length.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TouchedClaimsValue {
    pub claim_hashes: Vec<ClaimHash>,
}

impl RowValue for TouchedClaimsValue {
    fn pack(&self) -> Vec<u8> {
        let mut value = Vec::with_capacity(self.claim_hashes.len() * 20);
        for hash in &self.claim_hashes {
            value.extend_from_slice(hash);
        }
        value
    }

    fn unpack(prefix: Prefix, raw: &[u8]) -> Result<Self> {
        if raw.len() % 20 != 0 {
            return Err(value_error(prefix, raw, "row length is not a multiple of the hash width"));
        }
        let claim_hashes = raw
            .chunks_exact(20)
            .map(|chunk| {
                let mut hash = [0u8; 20];
                hash.copy_from_slice(chunk);
                hash
            })
            .collect();
        Ok(Self { claim_hashes })
    }
}

/// HashX values touched at a height, concatenated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TouchedHashXsValue {
    pub hashxs: Vec<HashX>,
}

impl RowValue for TouchedHashXsValue {
    fn pack(&self) -> Vec<u8> {
        let mut value = Vec::with_capacity(self.hashxs.len() * 11);
        for hashx in &self.hashxs {
            value.extend_from_slice(hashx);
        }
        value
    }

    fn unpack(prefix: Prefix, raw: &[u8]) -> Result<Self> {
        if raw.len() % 11 != 0 {
            return Err(value_error(prefix, raw, "row length is not a multiple of the hash width"));
        }
        let hashxs = raw
            .chunks_exact(11)
            .map(|chunk| {
                let mut hashx = [0u8; 11];
                hashx.copy_from_slice(chunk);
                hashx
            })
            .collect();
        Ok(Self { hashxs })
    }
}

/// Writer-side undo blob. The follower never interprets the contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoValue {
    pub data: Vec<u8>,
}

impl RowValue for UndoValue {
    fn pack(&self) -> Vec<u8> {
        self.data.clone()
    }

    fn unpack(_prefix: Prefix, raw: &[u8]) -> Result<Self> {
        Ok(Self { data: raw.to_vec() })
    }
}
