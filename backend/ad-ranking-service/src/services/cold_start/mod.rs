// ============================================
// Cold Start Selector
// ============================================
//
// Non-personalized fallback for viewers without any history:
// 1. Sort catalog by priority (descending, catalog order among ties)
// 2. Prefer one ad per unseen category until over half the slots are
//    filled, then accept repeats
// 3. Fill any remaining slots in priority order
// 4. Return the selection in priority order
//
// Scores are synthetic: priority * 10.

use crate::catalog::AdCatalog;
use crate::models::{Ad, AdCategory, AdScore};
use tracing::debug;

pub const COLD_START_REASONS: [&str; 2] = ["Trending", "Popular choice"];

#[derive(Debug, Clone, Default)]
pub struct ColdStartSelector;

impl ColdStartSelector {
    pub fn new() -> Self {
        Self
    }

    pub fn cold_start_ads(&self, catalog: &AdCatalog, limit: usize) -> Vec<Ad> {
        let sorted = by_priority(catalog.iter());
        let mut taken = vec![false; sorted.len()];
        let mut seen_categories = [false; AdCategory::ALL.len()];
        let mut selected: Vec<usize> = Vec::with_capacity(limit.min(sorted.len()));

        for (i, ad) in sorted.iter().enumerate() {
            if selected.len() >= limit {
                break;
            }
            let seen = &mut seen_categories[ad.category.index()];
            if !*seen || selected.len() * 2 > limit {
                *seen = true;
                taken[i] = true;
                selected.push(i);
            }
        }

        let diverse = selected.len();
        for i in 0..sorted.len() {
            if selected.len() >= limit {
                break;
            }
            if !taken[i] {
                taken[i] = true;
                selected.push(i);
            }
        }

        // Stable: within a priority, diverse picks stay ahead of fill
        selected.sort_by(|&a, &b| sorted[b].priority.cmp(&sorted[a].priority));

        debug!(
            catalog_size = catalog.len(),
            limit = limit,
            diverse = diverse,
            filled = selected.len() - diverse,
            "Selected cold start ads"
        );

        selected.into_iter().map(|i| sorted[i].clone()).collect()
    }

    pub fn cold_start_scores(&self, catalog: &AdCatalog, limit: usize) -> Vec<AdScore> {
        self.cold_start_ads(catalog, limit)
            .into_iter()
            .map(|ad| AdScore {
                score: ad.priority.saturating_mul(10).min(100),
                reasons: COLD_START_REASONS.iter().map(|r| r.to_string()).collect(),
                ad,
            })
            .collect()
    }

    /// Highest-priority ads, no diversity applied
    pub fn trending_ads(&self, catalog: &AdCatalog, limit: usize) -> Vec<Ad> {
        by_priority(catalog.iter())
            .into_iter()
            .take(limit)
            .cloned()
            .collect()
    }

    pub fn ads_by_category(&self, catalog: &AdCatalog, category: AdCategory) -> Vec<Ad> {
        catalog
            .iter()
            .filter(|ad| ad.category == category)
            .cloned()
            .collect()
    }
}

fn by_priority<'a>(ads: impl Iterator<Item = &'a Ad>) -> Vec<&'a Ad> {
    let mut sorted: Vec<&Ad> = ads.collect();
    sorted.sort_by(|a, b| b.priority.cmp(&a.priority));
    sorted
}
