// src/ingest/extract.rs
//! Markup → plain text reduction.
//!
//! A fixed sequence of regex passes, not a parser. Each pass works on whatever the
//! previous one produced, so malformed markup degrades the output instead of failing.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ExtractError;

pub const UNTITLED: &str = "Untitled";
pub const MAX_TEXT_CHARS: usize = 5000;
pub const MIN_CONTENT_CHARS: usize = 50;

/// Blocks that never carry article text.
const STRIPPED_BLOCKS: &[&str] = &[
    "script", "style", "nav", "header", "footer", "iframe", "svg",
];

static RE_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").expect("title regex"));

static RE_COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment regex"));

// The regex crate has no backreferences, so every block gets its own open/close pattern.
static RE_BLOCKS: Lazy<Vec<Regex>> = Lazy::new(|| {
    STRIPPED_BLOCKS
        .iter()
        .map(|tag| {
            Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).expect("block regex")
        })
        .collect()
});

static RE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("tag regex"));

static RE_BLANK_LINES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("blank line regex"));

static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("ws regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub title: String,
    pub text: String,
}

impl Extracted {
    pub fn text_chars(&self) -> usize {
        self.text.chars().count()
    }
}

/// Reduce markup to `{title, text}`. Never fails; `text` is capped at [`MAX_TEXT_CHARS`].
pub fn reduce_html(markup: &str) -> Extracted {
    Extracted {
        title: extract_title(markup),
        text: extract_text(markup),
    }
}

/// Like [`reduce_html`], but rejects pages with fewer than [`MIN_CONTENT_CHARS`] of text.
pub fn extract(markup: &str) -> Result<Extracted, ExtractError> {
    let out = reduce_html(markup);
    let chars = out.text_chars();
    if chars < MIN_CONTENT_CHARS {
        return Err(ExtractError::InsufficientContent {
            chars,
            min: MIN_CONTENT_CHARS,
        });
    }
    Ok(out)
}

/// First `<title>` content, trimmed with inner whitespace collapsed. Blank or absent → [`UNTITLED`].
pub fn extract_title(markup: &str) -> String {
    RE_TITLE
        .captures(markup)
        .and_then(|c| c.get(1))
        .map(|m| RE_WS.replace_all(m.as_str().trim(), " ").into_owned())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string())
}

pub fn extract_text(markup: &str) -> String {
    let mut out = RE_COMMENT.replace_all(markup, "").into_owned();
    for re in RE_BLOCKS.iter() {
        out = re.replace_all(&out, "").into_owned();
    }

    out = RE_TAG.replace_all(&out, "\n").into_owned();
    out = out.replace("&nbsp;", " ");

    out = out.replace('\t', " ");
    // A run of blank lines becomes one blank line; paragraph breaks survive.
    out = RE_BLANK_LINES.replace_all(&out, "\n\n").into_owned();
    let out = out.trim();

    truncate_chars(out, MAX_TEXT_CHARS)
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((byte_idx, _)) => s[..byte_idx].to_string(),
        None => s.to_string(),
    }
}
