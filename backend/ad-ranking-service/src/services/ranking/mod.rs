/// Ranking Module
///
/// Scores every catalog ad against the viewer's preferences and history,
/// then hands the sorted list to the diversity layer.
///
/// # Workflow
/// 1. Index per-ad exposure and viewed tags from history (once per call)
/// 2. Score each ad with [`AdScorer`]
/// 3. Stable sort by score, catalog order among ties
/// 4. Category cap + backfill via [`CategoryDiversityFilter`]
pub mod scorer;

pub use scorer::{AdExposure, AdScorer, HistorySignals, ScoringWeights};

use crate::catalog::AdCatalog;
use crate::models::{AdScore, CategoryPreference, InteractionHistory};
use crate::services::diversity::CategoryDiversityFilter;
use chrono::{DateTime, Utc};
use tracing::debug;

/// Ranking Engine - personalized top-N with category diversity
#[derive(Debug, Clone, Default)]
pub struct RankingEngine {
    scorer: AdScorer,
    diversity: CategoryDiversityFilter,
}

impl RankingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scorer(mut self, scorer: AdScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_diversity(mut self, diversity: CategoryDiversityFilter) -> Self {
        self.diversity = diversity;
        self
    }

    pub fn scorer(&self) -> &AdScorer {
        &self.scorer
    }

    /// Score all ads, sorted by score descending. Equal scores keep
    /// catalog order.
    pub fn score_catalog(
        &self,
        catalog: &AdCatalog,
        preferences: &[CategoryPreference],
        history: &InteractionHistory,
        now: DateTime<Utc>,
    ) -> Vec<AdScore> {
        let signals = HistorySignals::build(
            history,
            catalog,
            now,
            self.scorer.weights().recent_window_hours,
        );

        let mut scored: Vec<AdScore> = catalog
            .iter()
            .map(|ad| self.scorer.score_with_signals(ad, preferences, &signals))
            .collect();

        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored
    }

    /// Personalized, category-diversified top `limit` ads
    pub fn rank(
        &self,
        catalog: &AdCatalog,
        preferences: &[CategoryPreference],
        history: &InteractionHistory,
        limit: usize,
        now: DateTime<Utc>,
    ) -> Vec<AdScore> {
        let scored = self.score_catalog(catalog, preferences, history, now);
        let ranked = self.diversity.apply(scored, limit);

        debug!(
            catalog_size = catalog.len(),
            limit = limit,
            returned = ranked.len(),
            top_score = ?ranked.first().map(|s| s.score),
            "Ranked ads"
        );

        ranked
    }
}
