//! Staged winner selection.
//!
//! Resolution walks the indexes in a fixed order: normalize the name, pick
//! the claim the modifier selects (short-id, sequence, amount ordinal, or
//! the controlling claim), hydrate the full record, check channel
//! membership, and finally apply the blocklist/filter sets. Storage errors
//! surface as `Unavailable`; absence is `NotFound`.

use crate::error::ResolveError;
use crate::url::{normalize_name, parse_url, Modifier, PathSegment};
use claimhub_db::rows::ClaimHash;
use claimhub_db::SecondaryDb;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

/// Moderation sets, as 20-byte channel hashes.
#[derive(Debug, Clone, Default)]
pub struct ResolverConfig {
    /// Claims in (or signed by) these channels resolve to a blocked marker.
    pub blocking_channel_hashes: Vec<ClaimHash>,
    /// Claims in (or signed by) these channels are flagged but returned.
    pub filtering_channel_hashes: Vec<ClaimHash>,
}

/// A fully hydrated claim record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedClaim {
    pub claim_hash: ClaimHash,
    /// Hex rendering of the claim hash.
    pub claim_id: String,
    pub name: String,
    pub normalized_name: String,
    pub tx_num: u32,
    pub position: u16,
    pub root_tx_num: u32,
    pub root_position: u16,
    /// The claim's own stake.
    pub amount: u64,
    /// Own stake plus aggregate support.
    pub effective_amount: u64,
    /// The signing channel, when the claim is a channel member.
    pub channel_hash: Option<ClaimHash>,
    pub channel_signature_is_valid: bool,
    pub activation_height: Option<u32>,
    /// Height at which this claim took over its name, when it is the
    /// controlling claim.
    pub takeover_height: Option<u32>,
}

/// The outcome of resolving one URL.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// A stream claim; `channel` carries the resolved channel when the URL
    /// went through `@channel/stream`.
    Stream {
        claim: ResolvedClaim,
        channel: Option<ResolvedClaim>,
        filtered: bool,
    },
    /// A channel claim resolved on its own.
    Channel {
        claim: ResolvedClaim,
        filtered: bool,
    },
    /// The winning claim is blocked; only the blocking channel is reported.
    Blocked { blocking_channel: ClaimHash },
}

/// Caller-supplied deadline, checked at every storage touch.
#[derive(Clone, Copy)]
struct Deadline(Option<Instant>);

impl Deadline {
    fn check(&self) -> Result<(), ResolveError> {
        match self.0 {
            Some(deadline) if Instant::now() >= deadline => Err(ResolveError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

/// URL resolver over a shared claim index handle.
pub struct Resolver {
    db: Arc<SecondaryDb>,
    blocking: HashSet<ClaimHash>,
    filtering: HashSet<ClaimHash>,
}

impl Resolver {
    pub fn new(db: Arc<SecondaryDb>, config: ResolverConfig) -> Self {
        Self {
            db,
            blocking: config.blocking_channel_hashes.into_iter().collect(),
            filtering: config.filtering_channel_hashes.into_iter().collect(),
        }
    }

    /// Resolves a URL with no deadline.
    pub fn resolve(&self, url: &str) -> Result<Resolution, ResolveError> {
        self.resolve_with_deadline(url, None)
    }

    /// Resolves a URL, giving up with `DeadlineExceeded` (and no partial
    /// result) once `deadline` passes.
    pub fn resolve_with_deadline(
        &self,
        url: &str,
        deadline: Option<Instant>,
    ) -> Result<Resolution, ResolveError> {
        let deadline = Deadline(deadline);
        let parsed = parse_url(url)?;

        match (parsed.channel, parsed.stream) {
            (Some(channel_seg), None) => {
                let channel = self.resolve_segment(&channel_seg, deadline)?;
                if let Some(blocking_channel) = self.blocked_by(&channel) {
                    return Ok(Resolution::Blocked { blocking_channel });
                }
                let filtered = self.filtered_by(&channel);
                Ok(Resolution::Channel {
                    claim: channel,
                    filtered,
                })
            }
            (Some(channel_seg), Some(stream_seg)) => {
                let channel = self.resolve_segment(&channel_seg, deadline)?;
                let stream = self.resolve_segment(&stream_seg, deadline)?;
                if stream.channel_hash != Some(channel.claim_hash) {
                    return Err(ResolveError::ChannelMismatch);
                }
                if let Some(blocking_channel) = self.blocked_by(&stream) {
                    return Ok(Resolution::Blocked { blocking_channel });
                }
                let filtered = self.filtered_by(&stream);
                Ok(Resolution::Stream {
                    claim: stream,
                    channel: Some(channel),
                    filtered,
                })
            }
            (None, Some(stream_seg)) => {
                let stream = self.resolve_segment(&stream_seg, deadline)?;
                if let Some(blocking_channel) = self.blocked_by(&stream) {
                    return Ok(Resolution::Blocked { blocking_channel });
                }
                let filtered = self.filtered_by(&stream);
                Ok(Resolution::Stream {
                    claim: stream,
                    channel: None,
                    filtered,
                })
            }
            (None, None) => Err(ResolveError::InvalidUrl {
                url: url.to_owned(),
                reason: "empty url",
            }),
        }
    }

    /// Hydrates a claim record straight from its hash.
    pub fn resolve_claim_by_hash(
        &self,
        claim_hash: ClaimHash,
    ) -> Result<Option<ResolvedClaim>, ResolveError> {
        self.fetch_claim(claim_hash, Deadline(None))
    }

    fn resolve_segment(
        &self,
        segment: &PathSegment,
        deadline: Deadline,
    ) -> Result<ResolvedClaim, ResolveError> {
        let name = normalize_name(&segment.name);
        if name.is_empty() {
            return Err(ResolveError::NotFound);
        }
        deadline.check()?;

        let claim_hash = match &segment.modifier {
            Some(Modifier::ClaimId(partial)) => self.select_by_short_id(&name, partial)?,
            Some(Modifier::Sequence(n)) => self.select_by_sequence(&name, *n, deadline)?,
            Some(Modifier::AmountOrder(k)) => self.select_by_amount_order(&name, *k)?,
            None => self.select_controlling(&name)?,
        };

        self.fetch_claim(claim_hash, deadline)?.ok_or_else(|| {
            tracing::debug!(claim = %hex::encode(claim_hash), "indexed claim has no TXO row");
            ResolveError::NotFound
        })
    }

    /// Short-id selection: every stored row under `(name, partial)` must
    /// agree on one claim, and the partial must be a strict hex prefix of
    /// that claim's id.
    fn select_by_short_id(
        &self,
        name: &str,
        partial: &str,
    ) -> Result<ClaimHash, ResolveError> {
        let mut winner: Option<ClaimHash> = None;
        for item in self.db.short_id_matches(name, partial)? {
            let (_, value) = item?;
            match winner {
                None => winner = Some(value.claim_hash),
                Some(hash) if hash != value.claim_hash => {
                    return Err(ResolveError::Ambiguous(partial.to_owned()));
                }
                Some(_) => {}
            }
        }
        let claim_hash = winner.ok_or(ResolveError::NotFound)?;

        let full_id = hex::encode(claim_hash);
        if partial.len() >= full_id.len() || !full_id.starts_with(partial) {
            return Err(ResolveError::NotFound);
        }
        Ok(claim_hash)
    }

    /// Sequence selection: claims for the name ordered by
    /// `(activation_height, tx_num, position)` ascending; claims with no
    /// activation row sort last.
    fn select_by_sequence(
        &self,
        name: &str,
        sequence: u32,
        deadline: Deadline,
    ) -> Result<ClaimHash, ResolveError> {
        let mut claims: Vec<(u32, u32, u16, ClaimHash)> = Vec::new();
        for item in self.db.effective_amount_rank(name)? {
            deadline.check()?;
            let (key, value) = item?;
            let activation = self
                .db
                .activation_for_txo(key.tx_num, key.position)?
                .map(|a| a.height)
                .unwrap_or(u32::MAX);
            claims.push((activation, key.tx_num, key.position, value.claim_hash));
        }
        claims.sort();
        claims
            .get(sequence as usize - 1)
            .map(|&(_, _, _, hash)| hash)
            .ok_or(ResolveError::NotFound)
    }

    /// Amount-ordinal selection: the Kth entry of the effective-amount rank.
    fn select_by_amount_order(&self, name: &str, ordinal: u32) -> Result<ClaimHash, ResolveError> {
        match self
            .db
            .effective_amount_rank(name)?
            .nth(ordinal as usize - 1)
        {
            Some(item) => Ok(item?.1.claim_hash),
            None => Err(ResolveError::NotFound),
        }
    }

    /// No modifier: the controlling claim, i.e. the top of the rank.
    fn select_controlling(&self, name: &str) -> Result<ClaimHash, ResolveError> {
        match self.db.effective_amount_rank(name)?.next() {
            Some(item) => Ok(item?.1.claim_hash),
            None => Err(ResolveError::NotFound),
        }
    }

    fn fetch_claim(
        &self,
        claim_hash: ClaimHash,
        deadline: Deadline,
    ) -> Result<Option<ResolvedClaim>, ResolveError> {
        deadline.check()?;
        let Some(txo) = self.db.claim_to_txo(claim_hash)? else {
            return Ok(None);
        };
        deadline.check()?;
        let channel_hash = self
            .db
            .channel_for_claim(claim_hash, txo.tx_num, txo.position)?;
        let support = self.db.support_amount(claim_hash)?;
        let activation = self.db.activation_for_txo(txo.tx_num, txo.position)?;
        let normalized_name = normalize_name(&txo.name);
        let takeover = self.db.takeover_for_name(&normalized_name)?;

        Ok(Some(ResolvedClaim {
            claim_hash,
            claim_id: hex::encode(claim_hash),
            name: txo.name.clone(),
            normalized_name,
            tx_num: txo.tx_num,
            position: txo.position,
            root_tx_num: txo.root_tx_num,
            root_position: txo.root_position,
            amount: txo.amount,
            effective_amount: txo.amount.saturating_add(support),
            channel_hash,
            channel_signature_is_valid: txo.channel_signature_is_valid,
            activation_height: activation.map(|a| a.height),
            takeover_height: takeover
                .filter(|t| t.claim_hash == claim_hash)
                .map(|t| t.height),
        }))
    }

    /// The blocking channel that censors this claim, if any.
    fn blocked_by(&self, claim: &ResolvedClaim) -> Option<ClaimHash> {
        if self.blocking.contains(&claim.claim_hash) {
            return Some(claim.claim_hash);
        }
        claim
            .channel_hash
            .filter(|channel| self.blocking.contains(channel))
    }

    fn filtered_by(&self, claim: &ResolvedClaim) -> bool {
        self.filtering.contains(&claim.claim_hash)
            || claim
                .channel_hash
                .is_some_and(|channel| self.filtering.contains(&channel))
    }
}
