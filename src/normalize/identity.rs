//! Track id derivation
//!
//! Ids look like `0461_103additionalmemory`: a four-digit tag, an
//! underscore, then the lower-cased alphanumeric track name.

use regex::Regex;
use std::sync::LazyLock;

/// Name used when nothing alphanumeric survives normalization
pub const FALLBACK_NAME: &str = "track";

static TRACK_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]{4}_[a-z0-9]+$").unwrap());

static TAGGED_STEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<tag>[0-9]{4})_(?P<name>.+)$").unwrap());

static NON_ALNUM_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Whether `id` has the canonical `NNNN_name` shape
pub fn is_valid_track_id(id: &str) -> bool {
    TRACK_ID_RE.is_match(id)
}

/// Lower-case `name` and strip everything outside `[a-z0-9]`
pub fn normalize_name(name: &str) -> String {
    NON_ALNUM_RE
        .replace_all(&name.to_lowercase(), "")
        .into_owned()
}

/// Derive a canonical id from a source file stem
///
/// The tag is `tag` when given; otherwise a stem already shaped
/// `NNNN_name` keeps its own tag; otherwise it is a stable hash of the name.
pub fn derive_track_id(source_stem: &str, tag: Option<u16>) -> String {
    let (existing_tag, raw_name) = match TAGGED_STEM_RE.captures(source_stem) {
        Some(caps) => (
            caps.name("tag").map(|m| m.as_str().to_string()),
            caps.name("name").map_or(source_stem, |m| m.as_str()),
        ),
        None => (None, source_stem),
    };

    let normalized = normalize_name(raw_name);
    let name = if normalized.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        normalized.clone()
    };

    let tag = match (tag, existing_tag) {
        (Some(tag), _) => format!("{:04}", tag % 10_000),
        (None, Some(existing)) => existing,
        (None, None) => {
            // Non-Latin titles normalize to nothing; hash the raw stem instead
            let seed = if normalized.is_empty() {
                source_stem
            } else {
                normalized.as_str()
            };
            hash_tag(seed)
        }
    };

    format!("{}_{}", tag, name)
}

/// Stable four-digit tag from the MD5 of `seed`
fn hash_tag(seed: &str) -> String {
    let digest = md5::compute(seed.as_bytes());
    let value = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    format!("{:04}", value % 10_000)
}
