//! Grant-number recognition
//!
//! A token counts as a grant identifier when it carries at least five digits
//! (any Unicode decimal digit) anywhere in it; the identifier itself is the
//! first run of `[0-9A-Za-z/-]` characters.

use once_cell::sync::Lazy;
use regex::Regex;

/// Minimum number of digit characters for a grant candidate
pub const MIN_GRANT_DIGITS: usize = 5;

static DIGIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d").expect("valid digit regex"));

static GRANT_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9A-Za-z/-]+").expect("valid grant regex"));

/// Extract a normalized grant number from a single token
///
/// Trailing punctuation such as a sentence-final period is removed first.
///
/// ```
/// use pubmine_extractor::grant::extract_grant_number;
///
/// assert_eq!(extract_grant_number("R01CA123456."), Some("R01CA123456".to_string()));
/// assert_eq!(extract_grant_number("abc12"), None);
/// ```
pub fn extract_grant_number(token: &str) -> Option<String> {
    let token = strip_trailing_punctuation(token);

    let digits = DIGIT.find_iter(token).count();
    if digits < MIN_GRANT_DIGITS {
        return None;
    }

    GRANT_RUN.find(token).map(|m| m.as_str().to_string())
}

fn strip_trailing_punctuation(token: &str) -> &str {
    token.trim_end_matches(|c: char| {
        c.is_whitespace() || (c.is_ascii_punctuation() && c != '/' && c != '-')
    })
}
