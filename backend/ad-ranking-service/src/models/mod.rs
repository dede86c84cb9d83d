use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Fixed set of ad categories. Declaration order is the enumeration order
/// used for tie-breaking in preference output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdCategory {
    Technology,
    Fashion,
    Food,
    Travel,
    Gaming,
    Fitness,
    Entertainment,
    Education,
}

impl AdCategory {
    pub const ALL: [AdCategory; 8] = [
        AdCategory::Technology,
        AdCategory::Fashion,
        AdCategory::Food,
        AdCategory::Travel,
        AdCategory::Gaming,
        AdCategory::Fitness,
        AdCategory::Entertainment,
        AdCategory::Education,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AdCategory::Technology => "technology",
            AdCategory::Fashion => "fashion",
            AdCategory::Food => "food",
            AdCategory::Travel => "travel",
            AdCategory::Gaming => "gaming",
            AdCategory::Fitness => "fitness",
            AdCategory::Entertainment => "entertainment",
            AdCategory::Education => "education",
        }
    }

    /// Position in [`AdCategory::ALL`]
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for AdCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown ad category: {0}")]
pub struct ParseCategoryError(pub String);

impl FromStr for AdCategory {
    type Err = ParseCategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AdCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseCategoryError(s.to_string()))
    }
}

/// Catalog entry. Never mutated after the catalog is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ad {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub category: AdCategory,
    pub tags: Vec<String>,
    pub target_audience: Vec<String>,
    pub click_url: String,
    /// 1-10, higher = more important
    pub priority: u8,
}

fn default_view_duration() -> f64 {
    1.0
}

/// An ad was displayed. `category` is a snapshot of the ad's category at
/// recording time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewEvent {
    pub ad_id: String,
    pub category: AdCategory,
    /// Epoch milliseconds
    pub timestamp: i64,
    /// Seconds on screen
    #[serde(default = "default_view_duration")]
    pub duration: f64,
}

/// An ad was activated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickEvent {
    pub ad_id: String,
    pub category: AdCategory,
    /// Epoch milliseconds
    pub timestamp: i64,
}

/// Append-only view and click log for one viewer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InteractionHistory {
    #[serde(default)]
    pub views: Vec<ViewEvent>,
    #[serde(default)]
    pub clicks: Vec<ClickEvent>,
}

impl InteractionHistory {
    pub fn is_empty(&self) -> bool {
        self.views.is_empty() && self.clicks.is_empty()
    }

    pub fn interaction_count(&self) -> usize {
        self.views.len() + self.clicks.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPreference {
    pub category: AdCategory,
    /// 0-100
    pub score: u8,
}

/// Ranking output for a single ad. Reasons are in evidence order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdScore {
    pub ad: Ad,
    pub score: u8,
    pub reasons: Vec<String>,
}

impl AdScore {
    /// First `n` reasons, for compact display
    pub fn top_reasons(&self, n: usize) -> &[String] {
        &self.reasons[..self.reasons.len().min(n)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip_through_str() {
        for category in AdCategory::ALL {
            assert_eq!(category.as_str().parse::<AdCategory>(), Ok(category));
        }
        assert!("sports".parse::<AdCategory>().is_err());
    }

    #[test]
    fn test_category_index_matches_enumeration_order() {
        for (i, category) in AdCategory::ALL.iter().enumerate() {
            assert_eq!(category.index(), i);
        }
    }

    #[test]
    fn test_history_deserializes_stored_document() {
        // Stale `preferences` arrays from older documents are ignored
        let raw = r#"{
            "views": [{"adId": "ad-1", "category": "technology", "timestamp": 1000}],
            "clicks": [{"adId": "ad-2", "category": "fashion", "timestamp": 2000}],
            "preferences": []
        }"#;

        let history: InteractionHistory = serde_json::from_str(raw).unwrap();
        assert_eq!(history.views.len(), 1);
        assert_eq!(history.views[0].duration, 1.0);
        assert_eq!(history.clicks[0].category, AdCategory::Fashion);
        assert_eq!(history.interaction_count(), 2);
    }

    #[test]
    fn test_top_reasons_is_bounded() {
        let score = AdScore {
            ad: Ad {
                id: "ad-1".to_string(),
                title: String::new(),
                description: String::new(),
                image_url: String::new(),
                category: AdCategory::Food,
                tags: vec![],
                target_audience: vec![],
                click_url: "#".to_string(),
                priority: 5,
            },
            score: 10,
            reasons: vec!["a".into(), "b".into(), "c".into()],
        };

        assert_eq!(score.top_reasons(2), &["a".to_string(), "b".to_string()]);
        assert_eq!(score.top_reasons(10).len(), 3);
    }
}
