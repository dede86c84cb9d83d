pub mod cold_start;
pub mod diversity;
pub mod feed;
pub mod preferences;
pub mod ranking;
pub mod tracking;

pub use cold_start::ColdStartSelector;
pub use diversity::CategoryDiversityFilter;
pub use feed::{ActivitySummary, FeedService};
pub use preferences::{PreferenceAggregator, PreferenceWeights};
pub use ranking::{AdScorer, RankingEngine, ScoringWeights};
pub use tracking::{BehaviorTracker, HistoryStore, TrackingError, ViewerSessions};
