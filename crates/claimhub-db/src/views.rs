//! Typed index views over the iteration engine.
//!
//! Each view packs the leading key fields of its index and hands back a
//! bounded, typed sequence or a single decoded row. Views never mutate
//! anything; ambiguity (several rows under a short-id partial, say) is
//! surfaced to the caller rather than resolved here.

use crate::db::SecondaryDb;
use crate::error::Result;
use crate::iterator::{IterOptions, TypedRowIter};
use crate::prefix::Prefix;
use crate::rows::{
    ActivatedClaimKey, ActivatedClaimValue, AmountValue, BlockHashKey, BlockHashValue,
    ChannelToClaimKey, ClaimExpirationKey, ClaimHash, ClaimHashValue, ClaimShortIdKey,
    ClaimTakeoverKey, ClaimTakeoverValue, ClaimToChannelKey, ClaimToChannelValue, ClaimToTxoKey,
    ClaimToTxoValue, DbStateKey, DbStateValue, EffectiveAmountKey, HashX, HashXUtxoKey,
    PendingActivationKey, RowKey, SupportAmountKey, TouchedClaimKey, TouchedClaimsValue,
    TouchedHashXKey, TouchedHashXsValue, TxoToClaimKey, TxoToClaimValue, UndoKey, UtxoKey,
};

impl SecondaryDb {
    /// Unspent outputs for one address hash, in `(tx_num, nout)` order.
    pub fn utxos_by_hashx(&self, hashx: HashX) -> Result<TypedRowIter<'_, UtxoKey, AmountValue>> {
        let seek = UtxoKey {
            hashx,
            tx_num: 0,
            nout: 0,
        }
        .pack_partial(1);
        self.typed_iter(
            IterOptions::new(Prefix::Utxo)
                .with_prefix(seek.clone())
                .with_start(seek),
        )
    }

    /// Claim hashes signed by a channel, in claim TXO order.
    pub fn claims_by_channel(
        &self,
        channel_hash: ClaimHash,
    ) -> Result<impl Iterator<Item = Result<ClaimHash>> + '_> {
        let seek = ChannelToClaimKey {
            channel_hash,
            tx_num: 0,
            position: 0,
        }
        .pack_partial(1);
        let iter = self.typed_iter::<ChannelToClaimKey, ClaimHashValue>(
            IterOptions::new(Prefix::ChannelToClaim)
                .with_prefix(seek.clone())
                .with_start(seek),
        )?;
        Ok(iter.map(|item| item.map(|(_, value)| value.claim_hash)))
    }

    /// Claims for a name ordered by effective amount, highest first, ties by
    /// `(tx_num, position)` ascending.
    pub fn effective_amount_rank(
        &self,
        normalized_name: &str,
    ) -> Result<TypedRowIter<'_, EffectiveAmountKey, ClaimHashValue>> {
        let seek = EffectiveAmountKey {
            normalized_name: normalized_name.to_owned(),
            effective_amount: 0,
            tx_num: 0,
            position: 0,
        }
        .pack_partial(1);
        self.typed_iter(
            IterOptions::new(Prefix::EffectiveAmount)
                .with_prefix(seek.clone())
                .with_start(seek),
        )
    }

    /// Every short-id row under `(name, partial_claim_id)`. More than one
    /// distinct claim hash means the partial is ambiguous; that judgement is
    /// left to the caller.
    pub fn short_id_matches(
        &self,
        normalized_name: &str,
        partial_claim_id: &str,
    ) -> Result<TypedRowIter<'_, ClaimShortIdKey, ClaimHashValue>> {
        let seek = ClaimShortIdKey {
            normalized_name: normalized_name.to_owned(),
            partial_claim_id: partial_claim_id.to_owned(),
            root_tx_num: 0,
            root_position: 0,
        }
        .pack_partial(2);
        self.typed_iter(
            IterOptions::new(Prefix::ClaimShortId)
                .with_prefix(seek.clone())
                .with_start(seek),
        )
    }

    /// First short-id hit under `(name, partial_claim_id)`, if any.
    pub fn short_id_lookup(
        &self,
        normalized_name: &str,
        partial_claim_id: &str,
    ) -> Result<Option<ClaimHash>> {
        match self.short_id_matches(normalized_name, partial_claim_id)?.next() {
            Some(item) => item.map(|(_, value)| Some(value.claim_hash)),
            None => Ok(None),
        }
    }

    /// Current TXO row for a claim.
    pub fn claim_to_txo(&self, claim_hash: ClaimHash) -> Result<Option<ClaimToTxoValue>> {
        self.get(&ClaimToTxoKey { claim_hash })
    }

    /// Claim occupying a TXO, if any.
    pub fn txo_to_claim(&self, tx_num: u32, position: u16) -> Result<Option<TxoToClaimValue>> {
        self.get(&TxoToClaimKey { tx_num, position })
    }

    /// The channel a claim TXO is signed by, if any.
    pub fn channel_for_claim(
        &self,
        claim_hash: ClaimHash,
        tx_num: u32,
        position: u16,
    ) -> Result<Option<ClaimHash>> {
        let value: Option<ClaimToChannelValue> = self.get(&ClaimToChannelKey {
            claim_hash,
            tx_num,
            position,
        })?;
        Ok(value.map(|v| v.channel_hash))
    }

    /// Aggregate support amount staked on a claim; absent rows mean zero.
    pub fn support_amount(&self, claim_hash: ClaimHash) -> Result<u64> {
        let value: Option<AmountValue> = self.get(&SupportAmountKey { claim_hash })?;
        Ok(value.map(|v| v.amount).unwrap_or(0))
    }

    /// Controlling claim and takeover height for a name.
    pub fn takeover_for_name(&self, normalized_name: &str) -> Result<Option<ClaimTakeoverValue>> {
        self.get(&ClaimTakeoverKey {
            normalized_name: normalized_name.to_owned(),
        })
    }

    /// Activation record for a claim TXO.
    pub fn activation_for_txo(
        &self,
        tx_num: u32,
        position: u16,
    ) -> Result<Option<ActivatedClaimValue>> {
        self.get(&ActivatedClaimKey { tx_num, position })
    }

    /// Claims scheduled to activate at a height.
    pub fn claims_activating_at(
        &self,
        height: u32,
    ) -> Result<TypedRowIter<'_, PendingActivationKey, ClaimHashValue>> {
        let seek = PendingActivationKey {
            height,
            tx_num: 0,
            position: 0,
        }
        .pack_partial(1);
        self.typed_iter(
            IterOptions::new(Prefix::PendingActivation)
                .with_prefix(seek.clone())
                .with_start(seek),
        )
    }

    /// Claims scheduled to expire at a height.
    pub fn claims_expiring_at(
        &self,
        height: u32,
    ) -> Result<TypedRowIter<'_, ClaimExpirationKey, ClaimHashValue>> {
        let seek = ClaimExpirationKey {
            height,
            tx_num: 0,
            position: 0,
        }
        .pack_partial(1);
        self.typed_iter(
            IterOptions::new(Prefix::ClaimExpiration)
                .with_prefix(seek.clone())
                .with_start(seek),
        )
    }

    /// Block hash at a height.
    pub fn block_hash(&self, height: u32) -> Result<Option<[u8; 32]>> {
        let value: Option<BlockHashValue> = self.get(&BlockHashKey { height })?;
        Ok(value.map(|v| v.block_hash))
    }

    /// The writer's state row, absent until the writer has initialized.
    pub fn db_state(&self) -> Result<Option<DbStateValue>> {
        self.get(&DbStateKey)
    }

    /// Claim hashes touched at a height; an absent row is an empty set.
    pub fn touched_claims_at(&self, height: u32) -> Result<Vec<ClaimHash>> {
        let value: Option<TouchedClaimsValue> = self.get(&TouchedClaimKey { height })?;
        Ok(value.map(|v| v.claim_hashes).unwrap_or_default())
    }

    /// HashX values touched at a height; an absent row is an empty set.
    pub fn touched_hashxs_at(&self, height: u32) -> Result<Vec<HashX>> {
        let value: Option<TouchedHashXsValue> = self.get(&TouchedHashXKey { height })?;
        Ok(value.map(|v| v.hashxs).unwrap_or_default())
    }

    /// Whether the reverse UTXO marker row exists.
    pub fn utxo_marker_exists(&self, hashx: HashX, tx_num: u32, nout: u16) -> Result<bool> {
        self.contains(&HashXUtxoKey {
            hashx,
            tx_num,
            nout,
        })
    }

    /// Whether the writer left an undo blob at a height.
    pub fn has_undo_at(&self, height: u32) -> Result<bool> {
        self.contains(&UndoKey { height })
    }
}
