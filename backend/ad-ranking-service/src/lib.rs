pub mod catalog;
pub mod config;
pub mod models;
pub mod services;
pub mod utils;

pub use catalog::AdCatalog;
pub use config::Config;
pub use models::{AdCategory, AdScore, CategoryPreference, InteractionHistory};
pub use services::{
    BehaviorTracker, CategoryDiversityFilter, ColdStartSelector, FeedService,
    PreferenceAggregator, RankingEngine, ViewerSessions,
};
