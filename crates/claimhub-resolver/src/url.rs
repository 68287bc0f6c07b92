//! URL grammar and name normalization.
//!
//! ```text
//! url        := [ '@' channel_spec [ '/' stream_spec ] ] | stream_spec
//! channel_spec, stream_spec := name [ modifier ]
//! modifier   := '#' partial_claim_id | ':' sequence | '$' amount_ordinal
//! ```
//!
//! Names are normalized the same way the writer normalizes them at pack
//! time: lowercased, apostrophes removed, `#`, `!` and `~` turned into
//! spaces, whitespace runs collapsed, surrounding whitespace trimmed.

use crate::error::ResolveError;
use regex::Regex;
use std::sync::LazyLock;

static WEIRD_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("[#!~]").expect("static pattern compiles"));
static MULTI_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s{2,}").expect("static pattern compiles"));

/// Normalizes a claim name to its on-disk form.
pub fn normalize_name(name: &str) -> String {
    let lowered = name.to_lowercase().replace('\'', "");
    let spaced = WEIRD_CHARS.replace_all(&lowered, " ");
    let collapsed = MULTI_SPACE.replace_all(&spaced, " ");
    collapsed.trim().to_owned()
}

/// How a URL path segment narrows the claims for its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Modifier {
    /// `#xxxx`: a hex prefix of the claim id.
    ClaimId(String),
    /// `:N`: the Nth claim in activation order, 1-based.
    Sequence(u32),
    /// `$K`: the Kth claim by effective amount, 1-based.
    AmountOrder(u32),
}

/// One path segment: a name plus an optional modifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub name: String,
    pub modifier: Option<Modifier>,
}

/// A parsed URL. At least one of the two segments is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    pub channel: Option<PathSegment>,
    pub stream: Option<PathSegment>,
}

fn invalid(url: &str, reason: &'static str) -> ResolveError {
    ResolveError::InvalidUrl {
        url: url.to_owned(),
        reason,
    }
}

/// Parses a URL against the grammar. The optional `lbry://` scheme the
/// upstream clients attach is accepted and ignored.
pub fn parse_url(url: &str) -> Result<ParsedUrl, ResolveError> {
    let rest = url.trim();
    let rest = rest.strip_prefix("lbry://").unwrap_or(rest);
    if rest.is_empty() {
        return Err(invalid(url, "empty url"));
    }

    if let Some(stripped) = rest.strip_prefix('@') {
        let (channel_part, stream_part) = match stripped.split_once('/') {
            Some((channel, stream)) => (channel, Some(stream)),
            None => (stripped, None),
        };
        let channel = parse_segment(url, channel_part)?;
        let stream = stream_part.map(|s| parse_segment(url, s)).transpose()?;
        Ok(ParsedUrl {
            channel: Some(channel),
            stream,
        })
    } else {
        if rest.contains('/') {
            return Err(invalid(url, "a path is only valid after a channel"));
        }
        Ok(ParsedUrl {
            channel: None,
            stream: Some(parse_segment(url, rest)?),
        })
    }
}

fn parse_segment(url: &str, part: &str) -> Result<PathSegment, ResolveError> {
    let Some(idx) = part.find(['#', ':', '$']) else {
        if part.is_empty() {
            return Err(invalid(url, "empty name"));
        }
        return Ok(PathSegment {
            name: part.to_owned(),
            modifier: None,
        });
    };

    let name = &part[..idx];
    let value = &part[idx + 1..];
    if name.is_empty() {
        return Err(invalid(url, "empty name"));
    }
    if value.is_empty() {
        return Err(invalid(url, "empty modifier"));
    }

    let modifier = match part.as_bytes()[idx] {
        b'#' => {
            if value.len() >= 40 || !value.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(invalid(url, "claim id modifier must be a short hex prefix"));
            }
            Modifier::ClaimId(value.to_lowercase())
        }
        b':' => {
            let seq: u32 = value
                .parse()
                .map_err(|_| invalid(url, "sequence modifier must be a positive integer"))?;
            if seq == 0 {
                return Err(invalid(url, "sequence modifier is 1-based"));
            }
            Modifier::Sequence(seq)
        }
        _ => {
            let ordinal: u32 = value
                .parse()
                .map_err(|_| invalid(url, "amount ordinal must be a positive integer"))?;
            if ordinal == 0 {
                return Err(invalid(url, "amount ordinal is 1-based"));
            }
            Modifier::AmountOrder(ordinal)
        }
    };

    Ok(PathSegment {
        name: name.to_owned(),
        modifier: Some(modifier),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_matches_pack_time_rules() {
        assert_eq!(normalize_name("Hello  World"), "hello world");
        assert_eq!(normalize_name("  spaced   out  "), "spaced out");
        assert_eq!(normalize_name("it's"), "its");
        assert_eq!(normalize_name("a#b!c~d"), "a b c d");
        assert_eq!(normalize_name("#!~"), "");
        assert_eq!(normalize_name("ÜBER"), "über");
    }

    #[test]
    fn bare_name_is_a_stream() {
        let parsed = parse_url("hello world").unwrap();
        assert!(parsed.channel.is_none());
        let stream = parsed.stream.unwrap();
        assert_eq!(stream.name, "hello world");
        assert!(stream.modifier.is_none());
    }

    #[test]
    fn scheme_prefix_is_accepted() {
        let parsed = parse_url("lbry://@alice/video").unwrap();
        assert_eq!(parsed.channel.unwrap().name, "alice");
        assert_eq!(parsed.stream.unwrap().name, "video");
    }

    #[test]
    fn claim_id_modifier_lowercases_hex() {
        let parsed = parse_url("name#DEAD").unwrap();
        assert_eq!(
            parsed.stream.unwrap().modifier,
            Some(Modifier::ClaimId("dead".to_owned()))
        );
    }

    #[test]
    fn channel_and_stream_modifiers_parse_independently() {
        let parsed = parse_url("@alice#01/video#02").unwrap();
        assert_eq!(
            parsed.channel.unwrap().modifier,
            Some(Modifier::ClaimId("01".to_owned()))
        );
        assert_eq!(
            parsed.stream.unwrap().modifier,
            Some(Modifier::ClaimId("02".to_owned()))
        );
    }

    #[test]
    fn sequence_and_amount_modifiers_are_one_based() {
        assert_eq!(
            parse_url("name:2").unwrap().stream.unwrap().modifier,
            Some(Modifier::Sequence(2))
        );
        assert_eq!(
            parse_url("name$3").unwrap().stream.unwrap().modifier,
            Some(Modifier::AmountOrder(3))
        );
        assert!(parse_url("name:0").is_err());
        assert!(parse_url("name$0").is_err());
    }

    #[test]
    fn malformed_urls_are_rejected() {
        assert!(parse_url("").is_err());
        assert!(parse_url("lbry://").is_err());
        assert!(parse_url("@").is_err());
        assert!(parse_url("name/stream").is_err());
        assert!(parse_url("name#").is_err());
        assert!(parse_url("name#xyz").is_err());
        assert!(parse_url("name:two").is_err());
        assert!(parse_url("@alice/").is_err());
    }
}
