//! Derivative file naming.
//!
//! `{slug}[-{color}][-{sex}]-{size}-{8 hex}.{webp|jpg}`: the random suffix
//! keeps file names unique across runs so CDNs never serve a stale copy.

use unicode_normalization::UnicodeNormalization;

use crate::types::{ItemIdentity, OutputFormat, SizeName};

/// Lowercase, strip diacritics, collapse anything outside `[a-z0-9]` into
/// single hyphens and trim hyphens from both ends.
pub fn sanitize(input: &str) -> String {
    let folded: String = input
        .to_lowercase()
        .nfd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .collect();

    let mut out = String::with_capacity(folded.len());
    let mut pending_hyphen = false;
    for c in folded.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c);
        } else {
            pending_hyphen = true;
        }
    }
    out
}

/// Fresh 8-character lowercase hex suffix.
pub fn unique_suffix() -> String {
    format!("{:08x}", rand::random::<u32>())
}

/// Build a derivative file name from its parts.
pub fn derivative_file_name(
    identity: &ItemIdentity,
    size: SizeName,
    format: OutputFormat,
    suffix: &str,
) -> String {
    let mut parts: Vec<String> = vec![identity.slug().to_string()];
    if let Some(color) = identity.color().map(sanitize).filter(|c| !c.is_empty()) {
        parts.push(color);
    }
    if let Some(sex) = identity.sex().tag() {
        parts.push(sex.to_string());
    }
    parts.push(size.as_str().to_string());
    parts.push(suffix.to_string());

    format!("{}.{}", parts.join("-"), format.extension())
}
