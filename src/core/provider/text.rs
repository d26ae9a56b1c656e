//! Text preparation for speech synthesis.
//!
//! Narration text arrives as lightly-marked-up prose (the same strings the
//! UI renders), so markup is stripped before it reaches the synthesis API.
//! Overlong text is cut at a sentence boundary rather than mid-word.

use regex::Regex;

/// Strips rendering markup that would be read aloud literally.
pub struct TextNormalizer {
    link: Regex,
    heading: Regex,
    emphasis: Regex,
    whitespace: Regex,
}

impl TextNormalizer {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            link: Regex::new(r"\[([^\]]+)\]\([^)]*\)")?,
            heading: Regex::new(r"(?m)^#{1,6}\s+")?,
            emphasis: Regex::new(r"[*_]{1,3}([^*_]+)[*_]{1,3}")?,
            whitespace: Regex::new(r"\s+")?,
        })
    }

    /// Returns `text` with links flattened to their labels, emphasis and
    /// heading markers removed, and whitespace collapsed to single spaces.
    pub fn normalize(&self, text: &str) -> String {
        let text = self.link.replace_all(text, "$1");
        let text = self.heading.replace_all(&text, "");
        let text = self.emphasis.replace_all(&text, "$1");
        let text = self.whitespace.replace_all(&text, " ");
        text.trim().to_string()
    }
}

/// Cuts `text` down to at most `safe_len` characters when it exceeds
/// `max_len`, preferring the last sentence boundary at or before the cut.
///
/// Text at or under `max_len` characters passes through untouched. Overlong
/// text is scanned for the last `.`, `!` or `?` within the first `safe_len`
/// characters and cut just after it; if there is no boundary at all, the cut
/// lands hard at `safe_len`. Indices are character counts, so multi-byte
/// input never splits a code point.
pub fn truncate_to_sentence(text: &str, max_len: usize, safe_len: usize) -> &str {
    if text.chars().count() <= max_len {
        return text;
    }
    let safe_byte = text
        .char_indices()
        .nth(safe_len)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let head = &text[..safe_byte];
    match head.rfind(['.', '!', '?']) {
        // The boundary characters are single-byte, so idx + 1 stays on a
        // char boundary.
        Some(idx) => &text[..idx + 1],
        None => head,
    }
}
