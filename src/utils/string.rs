//! UTF-8 safe string helpers.
//!
//! Truncation works on chars, never byte indices, so multibyte text in
//! document abstracts or error messages cannot cause a panic.

/// Return the first `n` characters of `s` as a `String` (no ellipsis).
pub fn prefix_chars(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

/// Return a preview of `s` up to `n` characters. If `s` is longer than `n`
/// characters, the returned string will include a trailing ellipsis `...`.
pub fn preview(s: &str, n: usize) -> String {
    let mut prefix = prefix_chars(s, n);
    if s.chars().nth(n).is_some() {
        prefix.push_str("...");
    }
    prefix
}

/// Case-insensitive substring test. An empty needle matches everything.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_basic_ascii() {
        let s = "hello world";
        assert_eq!(preview(s, 5), "hello...");
        assert_eq!(preview(s, 11), "hello world");
        assert_eq!(preview(s, 20), "hello world");
    }

    #[test]
    fn preview_multibyte_characters() {
        let s = "Règlement sur l'eau potable, édition révisée";
        let p = preview(s, 10);
        assert_eq!(p, "Règlement ...");
        assert_eq!(prefix_chars(s, 3), "Règ");
    }

    #[test]
    fn contains_ignore_case_matches() {
        assert!(contains_ignore_case("Environmental Protection Agency", "protection"));
        assert!(contains_ignore_case("EPA", "epa"));
        assert!(contains_ignore_case("anything", ""));
        assert!(!contains_ignore_case("FDA", "EPA"));
    }
}
