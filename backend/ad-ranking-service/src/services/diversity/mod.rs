use crate::models::{AdCategory, AdScore};
use std::collections::HashSet;
use tracing::debug;

/// Diversity Layer - category cap with backfill
///
/// Walks a score-sorted list and admits an ad only while its category is
/// under `ceil(limit / share_divisor)`. If the cap leaves the result short
/// of `limit`, a second walk fills the gap in the same order, ignoring the
/// cap.
#[derive(Debug, Clone)]
pub struct CategoryDiversityFilter {
    share_divisor: usize,
}

impl Default for CategoryDiversityFilter {
    fn default() -> Self {
        Self::new(3)
    }
}

impl CategoryDiversityFilter {
    /// `share_divisor = 3` caps each category at roughly a third of the
    /// result
    pub fn new(share_divisor: usize) -> Self {
        Self {
            share_divisor: share_divisor.max(1),
        }
    }

    pub fn max_per_category(&self, limit: usize) -> usize {
        limit.div_ceil(self.share_divisor)
    }

    pub fn apply(&self, scored: Vec<AdScore>, limit: usize) -> Vec<AdScore> {
        let max_per_category = self.max_per_category(limit);
        let mut category_count = [0usize; AdCategory::ALL.len()];
        let mut admitted = vec![false; scored.len()];
        let mut admitted_count = 0;

        for (i, candidate) in scored.iter().enumerate() {
            if admitted_count >= limit {
                break;
            }
            let count = &mut category_count[candidate.ad.category.index()];
            if *count < max_per_category {
                *count += 1;
                admitted[i] = true;
                admitted_count += 1;
            }
        }

        let capped = admitted_count;
        let mut order: Vec<usize> = (0..scored.len()).filter(|&i| admitted[i]).collect();

        // Backfill ignores the cap; ids guard against catalog duplicates
        if order.len() < limit {
            let mut seen: HashSet<&str> = order.iter().map(|&i| scored[i].ad.id.as_str()).collect();
            for (i, candidate) in scored.iter().enumerate() {
                if order.len() >= limit {
                    break;
                }
                if !admitted[i] && seen.insert(candidate.ad.id.as_str()) {
                    order.push(i);
                }
            }
        }

        debug!(
            limit = limit,
            max_per_category = max_per_category,
            capped = capped,
            backfilled = order.len() - capped,
            "Applied category diversity"
        );

        let mut slots: Vec<Option<AdScore>> = scored.into_iter().map(Some).collect();
        order
            .into_iter()
            .filter_map(|i| slots[i].take())
            .collect()
    }
}
