//! Canonical property key normalization.
//!
//! Every property key is stored and looked up in one rooted hierarchical
//! form, `//segment/segment`, regardless of the syntax it arrived in.
//! Flat dotted keys (`application.name`) and already-rooted keys
//! (`//application/name`) normalize to the same string, so the normalized
//! form can serve directly as a dictionary key.

/// Root marker of every normalized key.
pub const KEY_ROOT: &str = "//";

/// Separator between segments of a normalized key.
pub const KEY_SEPARATOR: &str = "/";

/// Separator used by the flat dotted key syntax.
pub const FLAT_SEPARATOR: &str = ".";

/// Normalize a property path to its rooted hierarchical form.
///
/// Prepends the root marker when the key is not already rooted and replaces
/// every flat separator with the hierarchical one. Normalization is
/// idempotent and the empty key normalizes to the bare root.
///
/// ```
/// use confkit::key::normalize_key;
///
/// assert_eq!(normalize_key("application.name"), "//application/name");
/// assert_eq!(normalize_key("//application/name"), "//application/name");
/// assert_eq!(normalize_key(""), "//");
/// ```
pub fn normalize_key(key: &str) -> String {
    let mut normalized = String::with_capacity(KEY_ROOT.len() + key.len());
    if !key.starts_with(KEY_ROOT) {
        normalized.push_str(KEY_ROOT);
    }
    normalized.push_str(&key.replace(FLAT_SEPARATOR, KEY_SEPARATOR));
    normalized
}

/// Render a normalized key back to flat dotted syntax.
///
/// The inverse direction used when exporting to flat `key=value` formats:
/// `//application/name` becomes `application.name`.
pub fn flatten_key(key: &str) -> String {
    key.strip_prefix(KEY_ROOT)
        .unwrap_or(key)
        .replace(KEY_SEPARATOR, FLAT_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_normalize_flat_key() {
        assert_eq!(normalize_key("application.name"), "//application/name");
        assert_eq!(normalize_key("a.b.c.d"), "//a/b/c/d");
    }

    #[test]
    fn test_normalize_rooted_key_unchanged() {
        assert_eq!(normalize_key("//application/name"), "//application/name");
    }

    #[test]
    fn test_normalize_unrooted_slash_key() {
        assert_eq!(normalize_key("application/name"), "//application/name");
    }

    #[test]
    fn test_normalize_empty_key_is_root() {
        assert_eq!(normalize_key(""), KEY_ROOT);
    }

    #[test]
    fn test_normalize_single_segment() {
        assert_eq!(normalize_key("name"), "//name");
    }

    #[test]
    fn test_flatten_key() {
        assert_eq!(flatten_key("//application/name"), "application.name");
        assert_eq!(flatten_key("//name"), "name");
        assert_eq!(flatten_key(KEY_ROOT), "");
    }

    #[test]
    fn test_flatten_normalize_round_trip() {
        let key = "//server/http/port";
        assert_eq!(normalize_key(&flatten_key(key)), key);
    }

    proptest! {
        /// Normalizing an already-normalized key returns it unchanged.
        #[test]
        fn prop_normalize_is_idempotent(key in "[a-zA-Z0-9._/-]{0,64}") {
            let once = normalize_key(&key);
            prop_assert_eq!(normalize_key(&once), once);
        }

        /// The normalized form is always rooted and never contains dots.
        #[test]
        fn prop_normalized_form_is_rooted(key in "[a-zA-Z0-9._-]{0,64}") {
            let normalized = normalize_key(&key);
            prop_assert!(normalized.starts_with(KEY_ROOT));
            prop_assert!(!normalized.contains(FLAT_SEPARATOR));
        }
    }
}
