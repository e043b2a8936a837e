//! URL slugs.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::SlugError;

static NON_SLUG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("hard-coded regular expression to be valid"));

/// Lowercases `s` and joins its ASCII letter and digit runs with `-`.
///
/// Anything else, including non-Latin scripts, is dropped:
///
/// ```rust
/// assert_eq!(carryall::create_slug("Good Morning おはようございます").unwrap(), "good-morning");
/// ```
pub fn create_slug(s: &str) -> Result<String, SlugError> {
    if s.is_empty() {
        return Err(SlugError::Empty);
    }

    let slug = NON_SLUG
        .replace_all(&s.to_lowercase(), "-")
        .trim_matches('-')
        .to_owned();

    if slug.is_empty() {
        return Err(SlugError::ZeroLength);
    }
    Ok(slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs() {
        let cases = [
            ("now is the time", "now-is-the-time"),
            (
                "Now is the time for all GOOD people! + fish & such^123",
                "now-is-the-time-for-all-good-people-fish-such-123",
            ),
            ("Good Morning おはようございます", "good-morning"),
            ("--already-slugged--", "already-slugged"),
        ];
        for (input, expected) in cases {
            assert_eq!(create_slug(input).unwrap(), expected, "{input}");
        }
    }

    #[test]
    fn empty_input() {
        assert_eq!(create_slug(""), Err(SlugError::Empty));
    }

    #[test]
    fn nothing_left_after_filtering() {
        assert_eq!(create_slug("おはようございます"), Err(SlugError::ZeroLength));
        assert_eq!(create_slug("!!! ???"), Err(SlugError::ZeroLength));
    }
}
