//! Small text-shaping helpers shared between the tree builder and the split/verbalize passes.
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TOKEN_RE: Regex = Regex::new(r"(\S+)(\s*)").unwrap();
}

/// Splits `text` into `(word, word_with_trailing_ws)` pairs. Leading whitespace in `text` is not
/// represented in the output - callers that care about it (the tree builder, when a text event
/// begins with whitespace) handle it separately by extending the previous sibling's trailing
/// whitespace instead.
pub fn tokenize_preserving_ws(text: &str) -> Vec<(String, String)> {
    TOKEN_RE
        .captures_iter(text)
        .map(|caps| {
            let word = caps[1].to_string();
            let ws = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            (word.clone(), format!("{}{}", word, ws))
        })
        .collect()
}

/// Replaces characters that are neither alphanumeric nor whitespace with `join_str`, used after
/// verbalizing a number/date/currency (e.g. num2words' `ninety-nine` hyphen) before re-tokenizing
/// the expansion into separate Words.
pub fn normalize_non_word_chars(text: &str, join_str: &str) -> String {
    let mut out = String::new();
    for c in text.chars() {
        if c.is_alphanumeric() || c.is_whitespace() {
            out.push(c);
        } else {
            out.push_str(join_str);
        }
    }
    out
}
