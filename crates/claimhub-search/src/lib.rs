//! Post-search reordering: per-channel fairness across paged results.
//!
//! The external full-text index returns hits in relevance order. Before
//! paging, hits are reordered so that no channel occupies more than
//! `per_channel_per_page` slots within any window of `page_size` consecutive
//! results. Hits pushed out of a page keep their relative order and compete
//! again on the next page; the pass stops once a page comes up short, so a
//! trailing page is never padded with worse replacements.

use std::collections::{HashMap, VecDeque};

/// One hit from the external index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub claim_id: String,
    /// The signing channel, when the claim has one.
    pub channel_id: Option<String>,
}

impl Hit {
    pub fn new(claim_id: impl Into<String>, channel_id: Option<&str>) -> Self {
        Self {
            claim_id: claim_id.into(),
            channel_id: channel_id.map(str::to_owned),
        }
    }
}

/// Reorders `hits` under the per-channel page cap.
///
/// A cap of zero or less disables the reordering entirely and returns the
/// input as-is; a `page_size` of zero does the same since there is no window
/// to enforce.
pub fn search_ahead(hits: Vec<Hit>, page_size: usize, per_channel_per_page: i32) -> Vec<Hit> {
    if page_size == 0 || per_channel_per_page <= 0 {
        return hits;
    }
    let cap = per_channel_per_page as usize;

    let mut input: VecDeque<Hit> = hits.into();
    let mut later: VecDeque<Hit> = VecDeque::new();
    let mut counters: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<Hit> = Vec::with_capacity(input.len());

    while !input.is_empty() || !later.is_empty() {
        if !out.is_empty() {
            if out.len() % page_size == 0 {
                counters.clear();
            } else {
                // The previous page came up short; stop rather than fill it
                // with worse replacements.
                break;
            }
        }

        // Deferred hits get first claim on the fresh page.
        for _ in 0..later.len() {
            let Some(hit) = later.pop_front() else {
                break;
            };
            match &hit.channel_id {
                Some(channel) if counters.get(channel).copied().unwrap_or(0) >= cap => {
                    later.push_back(hit);
                }
                Some(channel) => {
                    *counters.entry(channel.clone()).or_insert(0) += 1;
                    out.push(hit);
                }
                None => out.push(hit),
            }
        }

        while let Some(hit) = input.pop_front() {
            match &hit.channel_id {
                None => out.push(hit),
                Some(channel) if counters.get(channel).copied().unwrap_or(0) < cap => {
                    *counters.entry(channel.clone()).or_insert(0) += 1;
                    out.push(hit);
                    if out.len() % page_size == 0 {
                        break;
                    }
                }
                Some(_) => later.push_back(hit),
            }
        }
    }

    out
}

/// Slices one page out of a reordered hit list.
pub fn paginate(hits: &[Hit], offset: usize, page_size: usize) -> &[Hit] {
    let from = offset.min(hits.len());
    let to = from.saturating_add(page_size).min(hits.len());
    &hits[from..to]
}
