// src/config/brands.rs
//! Brand allow-list loader. The list is handed to the Analyzer and used to
//! canonicalize brand names on records.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_BRANDS_PATH: &str = "BRANDS_PATH";

/// Repo-relative locations tried, in order, when `BRANDS_PATH` is unset.
const DEFAULT_BRAND_FILES: &[&str] = &["config/brands.toml", "config/brands.json"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BrandFormat {
    /// `brands = ["BYD", ...]`
    Toml,
    /// `["BYD", ...]` or `{"brands": ["BYD", ...]}`
    Json,
}

impl BrandFormat {
    /// The extension decides; without a known one, a leading `[` or `{` means JSON.
    fn detect(path: &Path, content: &str) -> Self {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("toml") => BrandFormat::Toml,
            Some("json") => BrandFormat::Json,
            _ if content.trim_start().starts_with(['[', '{']) => BrandFormat::Json,
            _ => BrandFormat::Toml,
        }
    }
}

/// Read the brand allow-list from `path`.
pub fn load_brands_from(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading brand list from {}", path.display()))?;
    parse_brands(&content, BrandFormat::detect(path, &content))
        .with_context(|| format!("parsing brand list {}", path.display()))
}

/// `$BRANDS_PATH` if set (it must exist), else the first default file present.
/// No file at all means an empty allow-list: every brand is then free text.
pub fn load_brands_default() -> Result<Vec<String>> {
    if let Ok(p) = std::env::var(ENV_BRANDS_PATH) {
        let pb = PathBuf::from(&p);
        if !pb.exists() {
            return Err(anyhow!("{ENV_BRANDS_PATH}={p} does not exist"));
        }
        return load_brands_from(&pb);
    }
    match DEFAULT_BRAND_FILES.iter().map(Path::new).find(|p| p.exists()) {
        Some(p) => load_brands_from(p),
        None => Ok(Vec::new()),
    }
}

fn parse_brands(s: &str, format: BrandFormat) -> Result<Vec<String>> {
    #[derive(serde::Deserialize)]
    struct BrandTable {
        brands: Vec<String>,
    }
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum JsonBrands {
        List(Vec<String>),
        Table(BrandTable),
    }

    let raw = match format {
        BrandFormat::Toml => toml::from_str::<BrandTable>(s)?.brands,
        BrandFormat::Json => match serde_json::from_str::<JsonBrands>(s)? {
            JsonBrands::List(v) => v,
            JsonBrands::Table(t) => t.brands,
        },
    };
    Ok(clean_list(raw))
}

/// Trim, drop blanks, drop case-insensitive duplicates; first spelling and order win.
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if t.is_empty() || out.iter().any(|o| o.eq_ignore_ascii_case(t)) {
            continue;
        }
        out.push(t.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    #[test]
    fn both_formats_are_trimmed_and_deduplicated() {
        let toml = r#"brands = [" BYD ", "", "Tesla", "tesla"]"#;
        let json = r#"["NIO", "  XPeng  ", ""]"#;
        assert_eq!(parse_brands(toml, BrandFormat::Toml).unwrap(), vec!["BYD", "Tesla"]);
        assert_eq!(parse_brands(json, BrandFormat::Json).unwrap(), vec!["NIO", "XPeng"]);
    }

    #[test]
    fn json_table_form_is_accepted() {
        let out = parse_brands(r#"{"brands": ["Zeekr", "Aito", "BYD"]}"#, BrandFormat::Json).unwrap();
        assert_eq!(out, vec!["Zeekr", "Aito", "BYD"]);
    }

    #[test]
    fn format_follows_extension_then_content() {
        assert_eq!(BrandFormat::detect(Path::new("b.TOML"), "[x]"), BrandFormat::Toml);
        assert_eq!(BrandFormat::detect(Path::new("b.json"), "brands = []"), BrandFormat::Json);
        assert_eq!(BrandFormat::detect(Path::new("brands"), "  [\"BYD\"]"), BrandFormat::Json);
        assert_eq!(BrandFormat::detect(Path::new("brands"), "brands = []"), BrandFormat::Toml);
    }

    #[test]
    fn malformed_list_is_rejected() {
        assert!(parse_brands("brands: - x", BrandFormat::Toml).is_err());
        assert!(parse_brands("{\"makes\": []}", BrandFormat::Json).is_err());
    }

    #[serial_test::serial]
    #[test]
    fn env_path_wins_over_repo_files() {
        // Temp CWD so the repo's own config/ is not picked up.
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_BRANDS_PATH);

        assert!(load_brands_default().unwrap().is_empty());

        fs::create_dir_all("config").unwrap();
        fs::write("config/brands.json", r#"["Li Auto"]"#).unwrap();
        assert_eq!(load_brands_default().unwrap(), vec!["Li Auto"]);

        fs::write("config/brands.toml", r#"brands = ["BYD"]"#).unwrap();
        assert_eq!(load_brands_default().unwrap(), vec!["BYD"]);

        let custom = tmp.path().join("makes.list");
        fs::write(&custom, r#"["X"]"#).unwrap();
        env::set_var(ENV_BRANDS_PATH, custom.display().to_string());
        assert_eq!(load_brands_default().unwrap(), vec!["X"]);

        env::set_var(ENV_BRANDS_PATH, tmp.path().join("missing.toml").display().to_string());
        assert!(load_brands_default().is_err());
        env::remove_var(ENV_BRANDS_PATH);

        env::set_current_dir(&old).unwrap();
    }
}
