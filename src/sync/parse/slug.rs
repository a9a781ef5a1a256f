use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9\-_]").expect("valid regex"));

/// Normalizes text into a Webflow slug. Already-normalized slugs are returned unchanged.
pub fn derive_slug(text: &str) -> String {
    let dashed = WHITESPACE.replace_all(text.trim(), "-");
    DISALLOWED.replace_all(&dashed, "").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_derive_slug() {
        assert_eq!(derive_slug("Hello   World"), "hello-world");
        assert_eq!(derive_slug("  Café & Bar: 2024!  "), "caf--bar-2024");
        assert_eq!(derive_slug("already-fine_slug"), "already-fine_slug");
        assert_eq!(derive_slug("!!!"), "");
    }

    proptest! {
        #[test]
        fn prop_derive_slug_is_idempotent(text in "\\PC*") {
            let once = derive_slug(&text);
            prop_assert_eq!(derive_slug(&once), once.clone());
            prop_assert!(once.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_'));
        }
    }
}
