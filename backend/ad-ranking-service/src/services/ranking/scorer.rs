// ============================================
// Ad Scorer
// ============================================
//
// Additive scoring over independent signals, evaluated in a fixed order:
// 1. Category match    (pref / 100) * 50, reason when > 25
// 2. Priority          (priority / 10) * 20
// 3. Engagement        clicked -10 | viewed > 2 -5 | unseen +15
// 4. Tag affinity      +3 per tag shared with previously viewed ads
// 5. Recency           -10 per view of this ad in the last 24h
// Result is clamped to [0,100] and rounded.

use crate::catalog::AdCatalog;
use crate::models::{Ad, AdScore, CategoryPreference, InteractionHistory};
use crate::utils::age_in_hours;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct ScoringWeights {
    pub category_match_max: f64,
    /// Category contribution above which a reason is emitted
    pub category_reason_threshold: f64,
    pub priority_max: f64,
    pub clicked_penalty: f64,
    pub repeat_view_penalty: f64,
    /// Views (exclusive) after which the repeat penalty applies
    pub repeat_view_threshold: usize,
    pub freshness_bonus: f64,
    pub tag_match_points: f64,
    /// Overlapping tags named in the reason
    pub tag_reason_limit: usize,
    pub recent_view_penalty: f64,
    pub recent_window_hours: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            category_match_max: 50.0,
            category_reason_threshold: 25.0,
            priority_max: 20.0,
            clicked_penalty: 10.0,
            repeat_view_penalty: 5.0,
            repeat_view_threshold: 2,
            freshness_bonus: 15.0,
            tag_match_points: 3.0,
            tag_reason_limit: 2,
            recent_view_penalty: 10.0,
            recent_window_hours: 24.0,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AdExposure {
    pub views: usize,
    pub clicks: usize,
    /// Views younger than the recency window
    pub recent_views: usize,
}

/// Per-ad exposure counts and the viewed-tag set, indexed once per ranking
/// call and shared by every ad scored in it.
#[derive(Debug, Default)]
pub struct HistorySignals<'a> {
    exposure: HashMap<&'a str, AdExposure>,
    viewed_tags: HashSet<&'a str>,
}

impl<'a> HistorySignals<'a> {
    pub fn build(
        history: &'a InteractionHistory,
        catalog: &'a AdCatalog,
        now: DateTime<Utc>,
        recent_window_hours: f64,
    ) -> Self {
        let mut signals = Self::default();

        for view in &history.views {
            let entry = signals.exposure.entry(view.ad_id.as_str()).or_default();
            entry.views += 1;
            if age_in_hours(now, view.timestamp) < recent_window_hours {
                entry.recent_views += 1;
            }

            // Ads gone from the catalog contribute no tags
            if let Some(ad) = catalog.get(&view.ad_id) {
                signals
                    .viewed_tags
                    .extend(ad.tags.iter().map(String::as_str));
            }
        }

        for click in &history.clicks {
            signals
                .exposure
                .entry(click.ad_id.as_str())
                .or_default()
                .clicks += 1;
        }

        signals
    }

    pub fn exposure(&self, ad_id: &str) -> AdExposure {
        self.exposure.get(ad_id).copied().unwrap_or_default()
    }

    pub fn has_viewed_tag(&self, tag: &str) -> bool {
        self.viewed_tags.contains(tag)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AdScorer {
    weights: ScoringWeights,
}

impl AdScorer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score one ad against the viewer's history
    pub fn score_ad(
        &self,
        ad: &Ad,
        preferences: &[CategoryPreference],
        history: &InteractionHistory,
        catalog: &AdCatalog,
        now: DateTime<Utc>,
    ) -> AdScore {
        let signals =
            HistorySignals::build(history, catalog, now, self.weights.recent_window_hours);
        self.score_with_signals(ad, preferences, &signals)
    }

    pub fn score_with_signals(
        &self,
        ad: &Ad,
        preferences: &[CategoryPreference],
        signals: &HistorySignals<'_>,
    ) -> AdScore {
        let w = &self.weights;
        let mut score = 0.0;
        let mut reasons = Vec::new();

        // 1. Category match
        if let Some(preference) = preferences.iter().find(|p| p.category == ad.category) {
            let category_score = (f64::from(preference.score) / 100.0) * w.category_match_max;
            score += category_score;
            if category_score > w.category_reason_threshold {
                reasons.push(format!("High interest in {}", ad.category));
            }
        }

        // 2. Priority
        score += (f64::from(ad.priority) / 10.0) * w.priority_max;

        // 3. Engagement with this ad; one and two views are neutral
        let exposure = signals.exposure(&ad.id);
        if exposure.clicks > 0 {
            score -= w.clicked_penalty;
            reasons.push("Previously clicked".to_string());
        } else if exposure.views > w.repeat_view_threshold {
            score -= w.repeat_view_penalty;
            reasons.push("Previously viewed".to_string());
        } else if exposure.views == 0 {
            score += w.freshness_bonus;
            reasons.push("New to you".to_string());
        }

        // 4. Tag affinity
        let matching_tags: Vec<&str> = ad
            .tags
            .iter()
            .map(String::as_str)
            .filter(|tag| signals.has_viewed_tag(tag))
            .collect();
        if !matching_tags.is_empty() {
            score += matching_tags.len() as f64 * w.tag_match_points;
            let named: Vec<&str> = matching_tags
                .iter()
                .take(w.tag_reason_limit)
                .copied()
                .collect();
            reasons.push(format!("Matches interests: {}", named.join(", ")));
        }

        // 5. Recency suppression
        if exposure.recent_views > 0 {
            score -= exposure.recent_views as f64 * w.recent_view_penalty;
            reasons.push("Shown recently".to_string());
        }

        AdScore {
            ad: ad.clone(),
            score: score.clamp(0.0, 100.0).round() as u8,
            reasons,
        }
    }
}
