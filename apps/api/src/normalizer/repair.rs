//! Text-level helpers applied to raw model output before structural parsing.
//!
//! Each step is lossy in a documented way:
//! - line breaks become spaces, so multi-line string values lose their breaks
//! - the brace region is greedy, so braces in trailing prose widen the span
//! - every single quote becomes a double quote, apostrophes included

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// First `{` through the last `}`.
    static ref OUTERMOST_BRACES: Regex = Regex::new(r"(?s)\{.*\}").unwrap();

    /// A comma followed only by whitespace before a closing brace or bracket.
    static ref TRAILING_COMMA: Regex = Regex::new(r",\s*([}\]])").unwrap();
}

/// Replaces every `\r` and `\n` with a space.
pub fn collapse_line_breaks(text: &str) -> String {
    text.chars()
        .map(|c| if c == '\r' || c == '\n' { ' ' } else { c })
        .collect()
}

/// Returns the outermost brace-delimited region, or `None` when the text has
/// no `{` followed somewhere by a `}`.
pub fn outermost_brace_region(text: &str) -> Option<&str> {
    OUTERMOST_BRACES.find(text).map(|m| m.as_str())
}

/// Best-effort repair of pseudo-JSON: single quotes to double quotes, then
/// trailing commas removed.
pub fn repair(region: &str) -> String {
    let quoted = region.replace('\'', "\"");
    TRAILING_COMMA.replace_all(&quoted, "$1").into_owned()
}
