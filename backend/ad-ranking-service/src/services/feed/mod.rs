use crate::catalog::AdCatalog;
use crate::models::{AdScore, CategoryPreference, InteractionHistory};
use crate::services::cold_start::ColdStartSelector;
use crate::services::preferences::PreferenceAggregator;
use crate::services::ranking::RankingEngine;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivitySummary {
    pub views: usize,
    pub clicks: usize,
    pub total_interactions: usize,
    pub preferences: Vec<CategoryPreference>,
}

/// Feed Service - picks the cold start or personalized path per request
#[derive(Debug, Clone, Default)]
pub struct FeedService {
    aggregator: PreferenceAggregator,
    engine: RankingEngine,
    cold_start: ColdStartSelector,
}

impl FeedService {
    pub fn new(
        aggregator: PreferenceAggregator,
        engine: RankingEngine,
        cold_start: ColdStartSelector,
    ) -> Self {
        Self {
            aggregator,
            engine,
            cold_start,
        }
    }

    pub fn personalized_feed(
        &self,
        catalog: &AdCatalog,
        history: &InteractionHistory,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Vec<AdScore> {
        if history.is_empty() {
            info!(limit = limit, "No interaction history, serving cold start feed");
            return self.cold_start.cold_start_scores(catalog, limit);
        }

        let preferences = self.aggregator.compute_preferences(history, now);
        let feed = self
            .engine
            .rank(catalog, &preferences, history, limit, now);

        info!(
            views = history.views.len(),
            clicks = history.clicks.len(),
            limit = limit,
            returned = feed.len(),
            "Served personalized feed"
        );

        feed
    }

    pub fn activity_summary(
        &self,
        history: &InteractionHistory,
        now: DateTime<Utc>,
    ) -> ActivitySummary {
        ActivitySummary {
            views: history.views.len(),
            clicks: history.clicks.len(),
            total_interactions: history.interaction_count(),
            preferences: self.aggregator.compute_preferences(history, now),
        }
    }

    pub fn cold_start(&self) -> &ColdStartSelector {
        &self.cold_start
    }
}
