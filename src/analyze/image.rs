// src/analyze/image.rs
//! Deterministic generated-image URLs for records without a supplied image.

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

pub const DEFAULT_IMAGE_GENERATOR_URL: &str = "https://image.pollinations.ai/prompt";

const IMAGE_WIDTH: u32 = 1024;
const IMAGE_HEIGHT: u32 = 576;
const PROMPT_MAX_CHARS: usize = 300;

static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("ws regex"));

/// Text prompt built from brand, title and optional keywords.
pub fn image_prompt(brand: &str, title: &str, keywords: Option<&str>) -> String {
    let mut parts = vec![brand.trim(), title.trim()];
    if let Some(k) = keywords.map(str::trim).filter(|k| !k.is_empty()) {
        parts.push(k);
    }
    parts.retain(|p| !p.is_empty());
    let subject = RE_WS.replace_all(&parts.join(", "), " ").into_owned();
    let subject: String = subject.chars().take(PROMPT_MAX_CHARS).collect();
    format!("{subject}, automotive news photo, realistic, high quality")
}

/// Seed from the first four bytes of SHA-256(prompt), so the same prompt always renders the same image.
pub fn prompt_seed(prompt: &str) -> u32 {
    let digest = Sha256::digest(prompt.as_bytes());
    u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]])
}

pub fn synthesize_image_url(
    base_url: &str,
    brand: &str,
    title: &str,
    keywords: Option<&str>,
) -> String {
    let prompt = image_prompt(brand, title, keywords);
    let seed = prompt_seed(&prompt);
    format!(
        "{}/{}?width={IMAGE_WIDTH}&height={IMAGE_HEIGHT}&seed={seed}&nologo=true",
        base_url.trim_end_matches('/'),
        urlencoding::encode(&prompt)
    )
}
