//! Request fingerprints used as cache keys.
//!
//! Equivalent searches must land in the same slot regardless of casing,
//! protocol prefixes or stray whitespace, so every component is normalized
//! before it is hashed.

use sha2::{Digest, Sha256};

use crate::RankingType;

/// Which kind of payload a fingerprint addresses.
///
/// Each kind hashes under its own tag so keys of different kinds never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyKind {
    /// Final result list of a search.
    Request,
    /// Normalized primary batch, before truncation or enrichment.
    Primary,
    /// Detail/commentary for a single candidate URL.
    Detail,
}

impl KeyKind {
    fn tag(self) -> &'static [u8] {
        match self {
            KeyKind::Request => b"request",
            KeyKind::Primary => b"primary",
            KeyKind::Detail => b"detail",
        }
    }
}

/// Lowercase a website and strip scheme, `www.` and trailing slashes.
pub fn normalize_website(website: &str) -> String {
    let mut site = website.trim().to_lowercase();
    for prefix in ["https://", "http://"] {
        if let Some(rest) = site.strip_prefix(prefix) {
            site = rest.to_string();
            break;
        }
    }
    if let Some(rest) = site.strip_prefix("www.") {
        site = rest.to_string();
    }
    site.trim_end_matches('/').to_string()
}

/// Lowercase a query and collapse runs of whitespace.
pub fn normalize_query(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

fn digest(kind: KeyKind, parts: &[&str]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(kind.tag());
    for part in parts {
        hasher.update(b"\n");
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Fingerprint of a full search: `(website, query, ranking_type)`.
pub fn request_fingerprint(website: &str, query: &str, ranking: RankingType) -> String {
    digest(KeyKind::Request, &[&normalize_website(website), &normalize_query(query), ranking.as_str()])
}

/// Fingerprint of the primary batch for `(website, query)`, shared by all ranking types.
pub fn primary_fingerprint(website: &str, query: &str) -> String {
    digest(KeyKind::Primary, &[&normalize_website(website), &normalize_query(query)])
}

/// Fingerprint of the detail payload for a candidate URL.
pub fn detail_fingerprint(url: &str) -> String {
    digest(KeyKind::Detail, &[&normalize_website(url)])
}
