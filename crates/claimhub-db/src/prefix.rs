//! Column-family registry.
//!
//! Every logical row type is named by a single prefix byte. The byte doubles
//! as the column-family name in the store, so the prefix enum is the single
//! source of truth for opening handles, selecting a column family during
//! iteration, and deciding which families feed the follower's changeset.

/// One-byte row prefix. Each variant maps to exactly one column family.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Prefix {
    /// Current TXO for a claim.
    ClaimToTxo = b'E',
    /// Reverse index of [`Prefix::ClaimToTxo`].
    TxoToClaim = b'G',
    /// Shortest-unambiguous-id lookup rows.
    ClaimShortId = b'F',
    /// Amount-ordered rank per normalized name.
    EffectiveAmount = b'D',
    /// Channel a claim is signed by.
    ClaimToChannel = b'I',
    /// Claims signed by a channel.
    ChannelToClaim = b'J',
    /// Expiration lifecycle scans.
    ClaimExpiration = b'O',
    /// Current controlling claim and takeover height per name.
    ClaimTakeover = b'P',
    /// Height-ordered activation schedule.
    PendingActivation = b'Q',
    /// Activation height by TXO.
    ActivatedClaim = b'R',
    /// Aggregate support amount per claim.
    SupportAmount = b'a',
    /// Per-address unspent output index.
    Utxo = b'u',
    /// Reverse marker index for [`Prefix::Utxo`].
    HashXUtxo = b'h',
    /// Block hash by height.
    BlockHash = b'C',
    /// Claim hashes touched at a height.
    TouchedClaim = b'Y',
    /// HashX values touched at a height.
    TouchedHashX = b'e',
    /// Writer-side undo blobs; the follower only probes for existence.
    Undo = b'M',
    /// Singleton snapshot of the writer's state.
    DbState = b's',
}

impl Prefix {
    /// Every registered prefix, in registry order.
    pub const ALL: [Prefix; 18] = [
        Prefix::ClaimToTxo,
        Prefix::TxoToClaim,
        Prefix::ClaimShortId,
        Prefix::EffectiveAmount,
        Prefix::ClaimToChannel,
        Prefix::ChannelToClaim,
        Prefix::ClaimExpiration,
        Prefix::ClaimTakeover,
        Prefix::PendingActivation,
        Prefix::ActivatedClaim,
        Prefix::SupportAmount,
        Prefix::Utxo,
        Prefix::HashXUtxo,
        Prefix::BlockHash,
        Prefix::TouchedClaim,
        Prefix::TouchedHashX,
        Prefix::Undo,
        Prefix::DbState,
    ];

    /// The raw prefix byte.
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// The column-family name: the prefix byte as a one-character string.
    pub const fn cf_name(self) -> &'static str {
        match self {
            Prefix::ClaimToTxo => "E",
            Prefix::TxoToClaim => "G",
            Prefix::ClaimShortId => "F",
            Prefix::EffectiveAmount => "D",
            Prefix::ClaimToChannel => "I",
            Prefix::ChannelToClaim => "J",
            Prefix::ClaimExpiration => "O",
            Prefix::ClaimTakeover => "P",
            Prefix::PendingActivation => "Q",
            Prefix::ActivatedClaim => "R",
            Prefix::SupportAmount => "a",
            Prefix::Utxo => "u",
            Prefix::HashXUtxo => "h",
            Prefix::BlockHash => "C",
            Prefix::TouchedClaim => "Y",
            Prefix::TouchedHashX => "e",
            Prefix::Undo => "M",
            Prefix::DbState => "s",
        }
    }

    /// Look a prefix up by its raw byte.
    pub fn from_byte(byte: u8) -> Option<Prefix> {
        Prefix::ALL.iter().copied().find(|p| p.byte() == byte)
    }

    /// Whether rows under this prefix describe claim state that belongs in
    /// the follower's changeset diffing.
    pub const fn is_changeset_source(self) -> bool {
        matches!(
            self,
            Prefix::ClaimToTxo
                | Prefix::TxoToClaim
                | Prefix::ClaimShortId
                | Prefix::EffectiveAmount
                | Prefix::ClaimToChannel
                | Prefix::ChannelToClaim
                | Prefix::ClaimExpiration
                | Prefix::ClaimTakeover
                | Prefix::PendingActivation
                | Prefix::ActivatedClaim
                | Prefix::SupportAmount
        )
    }
}
