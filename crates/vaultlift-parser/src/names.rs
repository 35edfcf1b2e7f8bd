//! Link target normalization
//!
//! Turns a link target as written in a note into the bare file name used for
//! image index lookups, and decides whether a target is remote.

use std::borrow::Cow;

/// Whether a target points at a remote resource instead of a local file
///
/// Covers `http://`, `https://`, any other `scheme://`, protocol-relative
/// `//host/...` and `data:` URIs.
pub fn is_external_target(target: &str) -> bool {
    let target = target.trim();
    if target.starts_with("//") {
        return true;
    }

    let lower = target.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("data:") {
        return true;
    }

    match target.find("://") {
        Some(idx) if idx > 0 => {
            let scheme = &target[..idx];
            scheme.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

/// Normalize a link target to the file name used for lookups
///
/// Percent-escapes are decoded first (`my%20cat.png` -> `my cat.png`), then
/// any directory prefix is stripped using either separator. Targets whose
/// escapes do not decode to UTF-8 are used as written.
pub fn normalize_name(target: &str) -> String {
    let target = target.trim();
    let decoded: Cow<'_, str> = urlencoding::decode(target).unwrap_or(Cow::Borrowed(target));

    decoded
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}
