//! Resolver error surface.
//!
//! `NotFound` is expected absence and is returned to the caller without
//! logging; storage failures surface as `Unavailable`.

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// No claim matches the URL.
    #[error("no claim found")]
    NotFound,

    /// A short-id partial matched more than one claim.
    #[error("short id '{0}' matches more than one claim")]
    Ambiguous(String),

    /// The resolved stream is not signed by the resolved channel.
    #[error("stream is not signed by the resolved channel")]
    ChannelMismatch,

    /// The URL does not follow the grammar.
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: &'static str },

    /// The caller-supplied deadline passed before resolution finished.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// The claim index could not be read.
    #[error("claim index unavailable: {0}")]
    Unavailable(#[from] claimhub_db::Error),
}
