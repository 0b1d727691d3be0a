//! Hash-keyed template markers.
//!
//! Every translatable unit is identified by the md5 hex digest of its source
//! string joined with its context by a colon. Templates store the digest with
//! a `_tr` suffix (or `_pl_<n>` per plural slot) where the translated value
//! belongs.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Marker for non-pluralized slots: 32 hex digits + `_tr`.
    pub static ref HASH_REGEX: Regex =
        Regex::new(r"(?i)[0-9a-f]{32}_tr").unwrap();

    /// Marker for pluralized templates: `_tr` or `_pl_<digit>`.
    pub static ref PLURAL_HASH_REGEX: Regex =
        Regex::new(r"(?i)[0-9a-f]{32}_(tr|pl_\d)").unwrap();
}

/// Computes the hash of a `(source string, context)` pair.
///
/// The stored context value `"None"` hashes as the empty string.
pub fn hash_tag(source_entity: &str, context: &str) -> String {
    let context = if context == "None" { "" } else { context };
    let joined = format!("{}:{}", source_entity, context);
    format!("{:x}", md5::compute(joined.as_bytes()))
}

/// Computes the hash of a source string against a multi-part context.
///
/// An empty part list behaves like an empty context.
pub fn hash_tag_parts(source_entity: &str, context: &[&str]) -> String {
    let mut keys = vec![source_entity.to_string()];
    if context.is_empty() {
        keys.push(String::new());
    } else {
        keys.extend(context.iter().map(|c| c.to_string()));
    }
    let joined = keys.join(":");
    format!("{:x}", md5::compute(joined.as_bytes()))
}

/// Escapes bare colons in a context value so multi-part contexts stay
/// unambiguous when joined.
pub fn escape_context(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut escaped = false;
    for c in value.chars() {
        if c == ':' && !escaped {
            out.push('\\');
        }
        escaped = c == '\\' && !escaped;
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_hex_digest() {
        let h = hash_tag("Hello", "");
        assert_eq!(h.len(), 32);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_none_context_equals_empty() {
        assert_eq!(hash_tag("Hello", "None"), hash_tag("Hello", ""));
        assert_ne!(hash_tag("Hello", ""), hash_tag("Hello", "menu"));
    }

    #[test]
    fn test_parts_join_with_colon() {
        assert_eq!(
            hash_tag_parts("Hello", &["Dialog", "greeting"]),
            hash_tag("Hello", "Dialog:greeting")
        );
        assert_eq!(hash_tag_parts("Hello", &[]), hash_tag("Hello", ""));
    }

    #[test]
    fn test_escape_context() {
        assert_eq!(escape_context("a:b"), "a\\:b");
        assert_eq!(escape_context("a\\:b"), "a\\:b");
        assert_eq!(escape_context("plain"), "plain");
    }

    #[test]
    fn test_marker_regexes() {
        let h = hash_tag("Hello", "");
        assert!(HASH_REGEX.is_match(&format!("{}_tr", h)));
        assert!(!HASH_REGEX.is_match(&format!("{}_pl_0", h)));
        assert!(PLURAL_HASH_REGEX.is_match(&format!("{}_pl_3", h)));
        assert!(PLURAL_HASH_REGEX.is_match(&format!("{}_tr", h)));
    }
}
