//! Deterministic text normalization applied before chunking.

use std::sync::OnceLock;

use regex::Regex;

static INDENT_AFTER_NEWLINE: OnceLock<Regex> = OnceLock::new();
static EXCESS_NEWLINES: OnceLock<Regex> = OnceLock::new();
static SPACE_RUNS: OnceLock<Regex> = OnceLock::new();

/// Normalize raw text for chunking.
///
/// Applies, in order: HTML-entity decoding, null-byte stripping, `\r\n`/`\r`
/// to `\n`, removal of leading spaces/tabs after a newline, collapsing of 3+
/// consecutive newlines to exactly 2, collapsing of 2+ spaces/tabs (but not
/// newlines) to a single space, and a final trim.
///
/// Total over all inputs; empty input yields an empty string.
pub fn clean_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let text = html_escape::decode_html_entities(text);
    let text = text.replace('\0', "");
    let text = text.replace("\r\n", "\n").replace('\r', "\n");

    let indent = INDENT_AFTER_NEWLINE.get_or_init(|| Regex::new(r"\n[ \t]+").unwrap());
    let text = indent.replace_all(&text, "\n");

    let newlines = EXCESS_NEWLINES.get_or_init(|| Regex::new(r"\n{3,}").unwrap());
    let text = newlines.replace_all(&text, "\n\n");

    let spaces = SPACE_RUNS.get_or_init(|| Regex::new(r"[ \t]{2,}").unwrap());
    let text = spaces.replace_all(&text, " ");

    text.trim().to_string()
}
