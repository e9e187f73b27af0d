//! Temporal deduplication of ranked candidates.

use crate::vector_store::SearchHit;
use serde::{Deserialize, Serialize};

/// Scope of the temporal dedup window.
///
/// Timestamps are only comparable within one source file, so the default
/// applies the window per source video; `Global` reproduces a raw
/// all-candidates comparison regardless of source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DedupScope {
    /// The window only constrains hits from the same source video.
    #[default]
    PerSource,
    /// The window constrains any two hits, regardless of source.
    Global,
}

impl std::str::FromStr for DedupScope {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "per_source" | "per-source" => Ok(DedupScope::PerSource),
            "global" => Ok(DedupScope::Global),
            _ => Err(format!("Unknown dedup scope: {}", s)),
        }
    }
}

impl std::fmt::Display for DedupScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DedupScope::PerSource => write!(f, "per_source"),
            DedupScope::Global => write!(f, "global"),
        }
    }
}

/// Greedily drop candidates that land within `window` seconds of a kept one.
///
/// Candidates must arrive best-first; the scan preserves that order. Each
/// candidate is compared against the already *kept* results only, so a
/// candidate close to an earlier rejected one can still be kept. All
/// candidates are scanned regardless of how many are already kept.
pub fn dedup_by_time(candidates: Vec<SearchHit>, window: f64, scope: DedupScope) -> Vec<SearchHit> {
    let mut kept: Vec<SearchHit> = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let conflicts = kept.iter().any(|k| {
            let same_scope = match scope {
                DedupScope::Global => true,
                DedupScope::PerSource => k.metadata.source_path == candidate.metadata.source_path,
            };
            same_scope && (k.metadata.timestamp - candidate.metadata.timestamp).abs() < window
        });

        if !conflicts {
            kept.push(candidate);
        }
    }

    kept
}
