//! AI adapter: structured-extraction provider abstraction.
//!
//! Providers return an untyped [`Candidate`]; nothing here trusts its contents.
//! Coercion into a [`NewsRecord`](crate::analyze::types::NewsRecord) lives in `validate`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::analyze::types::NewsType;
use crate::config::ai::AiConfig;
use crate::error::AnalyzerError;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Raw provider output: a JSON object whose fields may be missing or of any type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidate(pub Map<String, Value>);

impl Candidate {
    /// Parse provider text; tolerates a Markdown code fence around the JSON.
    pub fn from_model_output(content: &str) -> Result<Self, AnalyzerError> {
        let body = strip_code_fence(content);
        let value: Value = serde_json::from_str(body)
            .map_err(|e| AnalyzerError::ParseShape(format!("not JSON: {e}")))?;
        match value {
            Value::Object(map) => Ok(Candidate(map)),
            other => Err(AnalyzerError::ParseShape(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// String view of a field; numbers and booleans are stringified, blanks are `None`.
    pub fn text(&self, key: &str) -> Option<String> {
        let s = match self.0.get(key)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => return None,
        };
        (!s.is_empty()).then_some(s)
    }

    /// List view: an array of scalars, or a comma-separated string.
    pub fn list(&self, key: &str) -> Vec<String> {
        match self.0.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
                .collect(),
            Some(Value::String(s)) => s
                .split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn strip_code_fence(s: &str) -> &str {
    let t = s.trim();
    let Some(rest) = t.strip_prefix("```") else {
        return t;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// External structured-extraction oracle.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, text: &str, brands: &[String]) -> Result<Candidate, AnalyzerError>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynAnalyzer = Arc<dyn Analyzer>;

/// Factory: build an analyzer from config and environment.
///
/// * `AI_TEST_MODE=mock` → [`MockAnalyzer`] regardless of config.
/// * `enabled == false` → `None`; promotion then reports the analyzer as not configured.
/// * `provider == "openai"` → [`OpenAiAnalyzer`].
pub fn build_analyzer(cfg: &AiConfig) -> Option<DynAnalyzer> {
    if std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        return Some(Arc::new(MockAnalyzer::default()));
    }
    if !cfg.enabled {
        return None;
    }
    match cfg.provider.as_str() {
        "openai" => match OpenAiAnalyzer::new(cfg) {
            Ok(a) => Some(Arc::new(a)),
            Err(e) => {
                tracing::warn!(error = %e, "openai analyzer could not be built");
                None
            }
        },
        "mock" => Some(Arc::new(MockAnalyzer::default())),
        other => {
            tracing::warn!(provider = other, "unsupported analyzer provider; analyzer disabled");
            None
        }
    }
}

pub fn system_prompt(brands: &[String]) -> String {
    let types = NewsType::ALL
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let brand_list = if brands.is_empty() {
        "(none configured)".to_string()
    } else {
        brands.join(", ")
    };
    format!(
        "You extract structured data from automotive industry news. \
         Reply with ONE JSON object and nothing else, with keys: \
         title (string), summary (string, at most 3 sentences), brand (string), \
         type (one of: {types}), date (YYYY-MM-DD), url (string or empty), \
         image_keywords (short English phrase describing a suitable picture), \
         sentiment (positive, neutral or negative), tags (array of at most 5 short strings). \
         Choose brand from this list when the article is about one of them, otherwise use \"Other\": {brand_list}."
    )
}

/// OpenAI-compatible Chat Completions provider.
pub struct OpenAiAnalyzer {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiAnalyzer {
    pub fn new(cfg: &AiConfig) -> Result<Self, AnalyzerError> {
        if cfg.api_key.trim().is_empty() {
            return Err(AnalyzerError::Auth("no API key configured".into()));
        }
        let http = reqwest::Client::builder()
            .user_agent(concat!("auto-news-ingest/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| AnalyzerError::Other(format!("http client: {e}")))?;
        Ok(Self {
            http,
            api_key: cfg.api_key.clone(),
            model: cfg
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: cfg
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

#[async_trait]
impl Analyzer for OpenAiAnalyzer {
    async fn analyze(&self, text: &str, brands: &[String]) -> Result<Candidate, AnalyzerError> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct ResponseFormat {
            #[serde(rename = "type")]
            kind: &'static str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            response_format: ResponseFormat,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            #[serde(default)]
            content: Option<String>,
        }

        let sys = system_prompt(brands);
        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: &sys,
                },
                Msg {
                    role: "user",
                    content: text,
                },
            ],
            temperature: 0.2,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| AnalyzerError::Other(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(AnalyzerError::Auth(format!("HTTP {status}")));
        }
        if !status.is_success() {
            return Err(AnalyzerError::Other(format!("provider answered HTTP {status}")));
        }

        let body: Resp = resp
            .json()
            .await
            .map_err(|e| AnalyzerError::ParseShape(format!("completion envelope: {e}")))?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AnalyzerError::ParseShape("completion has no content".into()))?;

        Candidate::from_model_output(&content)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

/// Deterministic analyzer for tests and local runs. Returns `fixed` when set,
/// otherwise echoes the first line of the text as the title.
#[derive(Clone, Default)]
pub struct MockAnalyzer {
    pub fixed: Option<Candidate>,
}

impl MockAnalyzer {
    pub fn returning(candidate: Candidate) -> Self {
        Self {
            fixed: Some(candidate),
        }
    }
}

#[async_trait]
impl Analyzer for MockAnalyzer {
    async fn analyze(&self, text: &str, brands: &[String]) -> Result<Candidate, AnalyzerError> {
        if let Some(c) = &self.fixed {
            return Ok(c.clone());
        }
        let title = text.lines().next().unwrap_or_default().trim();
        let brand = brands
            .iter()
            .find(|b| text.to_lowercase().contains(&b.to_lowercase()))
            .cloned()
            .unwrap_or_else(|| "Other".to_string());
        let mut map = Map::new();
        map.insert("title".into(), Value::String(title.to_string()));
        map.insert("brand".into(), Value::String(brand));
        map.insert("type".into(), Value::String("other".into()));
        Ok(Candidate(map))
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Analyzer that always fails with a fixed error; used to exercise error surfaces.
pub struct FailingAnalyzer {
    make: fn() -> AnalyzerError,
}

impl FailingAnalyzer {
    pub fn new(make: fn() -> AnalyzerError) -> Self {
        Self { make }
    }
}

#[async_trait]
impl Analyzer for FailingAnalyzer {
    async fn analyze(&self, _text: &str, _brands: &[String]) -> Result<Candidate, AnalyzerError> {
        Err((self.make)())
    }

    fn provider_name(&self) -> &'static str {
        "failing"
    }
}
