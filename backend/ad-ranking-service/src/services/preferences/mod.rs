// ============================================
// Preference Aggregator
// ============================================
//
// Derives a per-category preference score in [0,100] from raw view/click
// history.
//
// running(category) =
//     SUM(view.duration / 5)            engagement volume
//   + SUM(click) * 5
//   + SUM(exp(-age_days / 7)) * 0.5     time-weighted views
//   + SUM(exp(-age_days / 7)) * 2       time-weighted clicks
//
// score = round(running / max(running..., 1) * 100)
//
// The volume and time-weighted halves are summed, not substituted.

use crate::models::{AdCategory, CategoryPreference, InteractionHistory};
use crate::utils::{age_in_days, exponential_decay};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Weights for the preference formula
#[derive(Debug, Clone)]
pub struct PreferenceWeights {
    /// Points per view, scaled by dwell time
    pub view_weight: f64,
    /// Dwell seconds that earn one full `view_weight`
    pub view_duration_unit: f64,
    pub click_weight: f64,
    /// Time constant of the decay, in days
    pub decay_days: f64,
    pub view_decay_weight: f64,
    pub click_decay_weight: f64,
    /// Lower bound of the normalization divisor
    pub normalization_floor: f64,
}

impl Default for PreferenceWeights {
    fn default() -> Self {
        Self {
            view_weight: 1.0,
            view_duration_unit: 5.0,
            click_weight: 5.0,
            decay_days: 7.0,
            view_decay_weight: 0.5,
            click_decay_weight: 2.0,
            normalization_floor: 1.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PreferenceAggregator {
    weights: PreferenceWeights,
}

impl PreferenceAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_weights(weights: PreferenceWeights) -> Self {
        Self { weights }
    }

    /// One preference per category, sorted by score descending. Equal
    /// scores keep enumeration order.
    pub fn compute_preferences(
        &self,
        history: &InteractionHistory,
        now: DateTime<Utc>,
    ) -> Vec<CategoryPreference> {
        let running = self.running_scores(history, now);

        let max_score = running
            .iter()
            .copied()
            .fold(self.weights.normalization_floor, f64::max);

        let mut preferences: Vec<CategoryPreference> = AdCategory::ALL
            .iter()
            .map(|&category| CategoryPreference {
                category,
                score: ((running[category.index()] / max_score) * 100.0)
                    .round()
                    .clamp(0.0, 100.0) as u8,
            })
            .collect();

        // Stable sort keeps enumeration order among ties
        preferences.sort_by(|a, b| b.score.cmp(&a.score));

        debug!(
            views = history.views.len(),
            clicks = history.clicks.len(),
            max_score = max_score,
            top_category = %preferences[0].category,
            "Computed category preferences"
        );

        preferences
    }

    fn running_scores(
        &self,
        history: &InteractionHistory,
        now: DateTime<Utc>,
    ) -> [f64; AdCategory::ALL.len()] {
        let w = &self.weights;
        let mut running = [0.0; AdCategory::ALL.len()];

        for view in &history.views {
            running[view.category.index()] +=
                w.view_weight * (view.duration / w.view_duration_unit);
        }
        for click in &history.clicks {
            running[click.category.index()] += w.click_weight;
        }

        for view in &history.views {
            let decay = exponential_decay(age_in_days(now, view.timestamp), w.decay_days);
            running[view.category.index()] += decay * w.view_decay_weight;
        }
        for click in &history.clicks {
            let decay = exponential_decay(age_in_days(now, click.timestamp), w.decay_days);
            running[click.category.index()] += decay * w.click_decay_weight;
        }

        running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClickEvent, ViewEvent};
    use crate::utils::MILLIS_PER_DAY;

    const NOW_MS: i64 = 1_700_000_000_000;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(NOW_MS).unwrap()
    }

    fn view(category: AdCategory, age_ms: i64, duration: f64) -> ViewEvent {
        ViewEvent {
            ad_id: "ad-x".to_string(),
            category,
            timestamp: NOW_MS - age_ms,
            duration,
        }
    }

    fn click(category: AdCategory, age_ms: i64) -> ClickEvent {
        ClickEvent {
            ad_id: "ad-x".to_string(),
            category,
            timestamp: NOW_MS - age_ms,
        }
    }

    fn score_of(preferences: &[CategoryPreference], category: AdCategory) -> u8 {
        preferences
            .iter()
            .find(|p| p.category == category)
            .map(|p| p.score)
            .unwrap()
    }

    #[test]
    fn test_empty_history_yields_all_zero_in_enumeration_order() {
        let preferences =
            PreferenceAggregator::new().compute_preferences(&InteractionHistory::default(), now());

        assert_eq!(preferences.len(), AdCategory::ALL.len());
        assert!(preferences.iter().all(|p| p.score == 0));
        let order: Vec<_> = preferences.iter().map(|p| p.category).collect();
        assert_eq!(order, AdCategory::ALL.to_vec());
    }

    #[test]
    fn test_single_click_is_maximum() {
        let history = InteractionHistory {
            views: vec![],
            clicks: vec![click(AdCategory::Gaming, 60_000)],
        };

        let preferences = PreferenceAggregator::new().compute_preferences(&history, now());

        assert_eq!(preferences[0].category, AdCategory::Gaming);
        assert_eq!(preferences[0].score, 100);
        assert!(preferences[1..].iter().all(|p| p.score == 0));
    }

    #[test]
    fn test_click_outweighs_short_view() {
        // Fresh 5s view: 1 + 0.5 = 1.5; fresh click: 5 + 2 = 7
        let history = InteractionHistory {
            views: vec![view(AdCategory::Food, 0, 5.0)],
            clicks: vec![click(AdCategory::Travel, 0)],
        };

        let preferences = PreferenceAggregator::new().compute_preferences(&history, now());

        assert_eq!(score_of(&preferences, AdCategory::Travel), 100);
        assert_eq!(score_of(&preferences, AdCategory::Food), 21); // 1.5 / 7
        assert_eq!(preferences[0].category, AdCategory::Travel);
        assert_eq!(preferences[1].category, AdCategory::Food);
    }

    #[test]
    fn test_small_totals_are_normalized_against_floor() {
        // One 1s view long ago: 0.2 + ~0 < 1, so the floor divides
        let history = InteractionHistory {
            views: vec![view(AdCategory::Education, 365 * MILLIS_PER_DAY as i64, 1.0)],
            clicks: vec![],
        };

        let preferences = PreferenceAggregator::new().compute_preferences(&history, now());

        assert_eq!(score_of(&preferences, AdCategory::Education), 20);
    }

    #[test]
    fn test_older_events_weigh_less() {
        let history = InteractionHistory {
            views: vec![],
            clicks: vec![
                click(AdCategory::Fashion, 0),
                click(AdCategory::Fitness, 14 * MILLIS_PER_DAY as i64),
            ],
        };

        let preferences = PreferenceAggregator::new().compute_preferences(&history, now());

        // Fitness: (5 + 2e^-2) / 7 = 0.753
        assert_eq!(score_of(&preferences, AdCategory::Fashion), 100);
        assert_eq!(score_of(&preferences, AdCategory::Fitness), 75);
    }

    #[test]
    fn test_ties_keep_enumeration_order() {
        let history = InteractionHistory {
            views: vec![],
            clicks: vec![click(AdCategory::Education, 0), click(AdCategory::Food, 0)],
        };

        let preferences = PreferenceAggregator::new().compute_preferences(&history, now());

        assert_eq!(preferences[0].category, AdCategory::Food);
        assert_eq!(preferences[1].category, AdCategory::Education);
        assert_eq!(preferences[2].category, AdCategory::Technology);
    }
}
