//! Canonical search result records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::SearchError;

/// One normalized search result.
///
/// Built by the response normalizer; the orchestrator only combines two
/// normalized records during enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ResultRecord {
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub pros: Vec<String>,
    #[serde(default)]
    pub cons: Vec<String>,
    #[serde(default)]
    pub tips: Vec<String>,
    /// What sets this result apart from the others.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_feature: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub takeaways: Vec<String>,
    /// 1-based position in the returned list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
}

impl ResultRecord {
    /// A record with only the required fields set.
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            rating: None,
            image_url: None,
            summary: None,
            pros: Vec::new(),
            cons: Vec::new(),
            tips: Vec::new(),
            unique_feature: None,
            takeaways: Vec::new(),
            rank: None,
        }
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_rank(mut self, rank: u32) -> Self {
        self.rank = Some(rank);
        self
    }

    /// Whether the record carries any commentary beyond the basic listing.
    pub fn is_enriched(&self) -> bool {
        self.summary.is_some() || !self.pros.is_empty() || !self.cons.is_empty() || !self.tips.is_empty()
    }
}

/// How a search orders its results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RankingType {
    /// Provider order, truncated to the configured maximum.
    #[default]
    Relevance,
    /// Top candidates enriched with details and sorted by rating.
    Ratings,
}

impl RankingType {
    pub fn as_str(self) -> &'static str {
        match self {
            RankingType::Relevance => "relevance",
            RankingType::Ratings => "ratings",
        }
    }
}

impl fmt::Display for RankingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RankingType {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relevance" | "" => Ok(RankingType::Relevance),
            "ratings" | "rating" => Ok(RankingType::Ratings),
            other => Err(SearchError::InvalidInput(format!("unknown ranking type: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranking_type_parse() {
        assert_eq!("relevance".parse::<RankingType>().unwrap(), RankingType::Relevance);
        assert_eq!("Ratings".parse::<RankingType>().unwrap(), RankingType::Ratings);
        assert_eq!("".parse::<RankingType>().unwrap(), RankingType::Relevance);
        assert!(matches!("popularity".parse::<RankingType>(), Err(SearchError::InvalidInput(_))));
    }

    #[test]
    fn test_record_serialization_skips_empty_optionals() {
        let record = ResultRecord::new("Best Cookies", "https://allrecipes.com/best").with_rating(4.8);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["title"], "Best Cookies");
        assert_eq!(json["rating"], 4.8);
        assert!(json.get("summary").is_none());
        assert!(json.get("takeaways").is_none());
        assert_eq!(json["pros"], serde_json::json!([]));
    }

    #[test]
    fn test_is_enriched() {
        let mut record = ResultRecord::new("Cookies", "https://example.com");
        assert!(!record.is_enriched());
        record.pros.push("chewy".into());
        assert!(record.is_enriched());
    }
}
