//! URL resolution over the claim index.
//!
//! Turns textual URLs (`name#id`, `name:seq`, `name$ordinal`,
//! `@channel/stream`) into the current winning claim by walking the
//! short-id, effective-amount, channel and activation indexes, then applies
//! the blocklist/filter sets before handing the result back.

mod error;
mod resolve;
mod url;

pub use error::ResolveError;
pub use resolve::{Resolution, ResolvedClaim, Resolver, ResolverConfig};
pub use url::{normalize_name, parse_url, Modifier, ParsedUrl, PathSegment};
