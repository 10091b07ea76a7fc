// src/analyze/types.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub const OTHER_BRAND: &str = "Other";

/// Closed set of article categories.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum NewsType {
    Launch,
    Policy,
    Sales,
    Personnel,
    Competitor,
    #[default]
    Other,
}

impl NewsType {
    pub const ALL: [NewsType; 6] = [
        NewsType::Launch,
        NewsType::Policy,
        NewsType::Sales,
        NewsType::Personnel,
        NewsType::Competitor,
        NewsType::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NewsType::Launch => "launch",
            NewsType::Policy => "policy",
            NewsType::Sales => "sales",
            NewsType::Personnel => "personnel",
            NewsType::Competitor => "competitor",
            NewsType::Other => "other",
        }
    }

    /// Unknown or missing values fall back to [`NewsType::Other`].
    pub fn coerce(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return NewsType::Other;
        };
        let norm = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == norm)
            .unwrap_or(NewsType::Other)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn coerce(raw: Option<&str>) -> Option<Self> {
        match raw?.trim().to_ascii_lowercase().as_str() {
            "positive" => Some(Sentiment::Positive),
            "neutral" => Some(Sentiment::Neutral),
            "negative" => Some(Sentiment::Negative),
            _ => None,
        }
    }
}

/// A finished, structured article.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewsRecord {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub brand: String,
    #[serde(rename = "type")]
    pub kind: NewsType,
    pub date: NaiveDate,
    pub url: String,
    pub source: String,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerce_is_case_and_space_insensitive() {
        assert_eq!(NewsType::coerce(Some(" Launch ")), NewsType::Launch);
        assert_eq!(NewsType::coerce(Some("SALES")), NewsType::Sales);
    }

    #[test]
    fn unknown_type_falls_back_to_other() {
        assert_eq!(NewsType::coerce(Some("recall")), NewsType::Other);
        assert_eq!(NewsType::coerce(Some("")), NewsType::Other);
        assert_eq!(NewsType::coerce(None), NewsType::Other);
    }

    #[test]
    fn record_serializes_type_field_name() {
        let r = NewsRecord {
            id: "1".into(),
            title: "t".into(),
            summary: "s".into(),
            brand: "BYD".into(),
            kind: NewsType::Policy,
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            url: "https://a.b/c".into(),
            source: "a.b".into(),
            image: "https://img".into(),
            sentiment: None,
            tags: vec![],
            created_at: Utc::now(),
        };
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["type"], "policy");
        assert_eq!(v["date"], "2024-05-01");
        assert!(v.get("sentiment").is_none());
        assert!(v.get("createdAt").is_some());
    }
}
