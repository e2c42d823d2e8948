pub mod config;
pub mod db;
pub mod error;
pub mod metrics;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use db::{RecommendationStore, Snapshot, SnapshotStore};
pub use error::{RecommendationError, Result};
pub use services::{CategoryRecommendations, RecommendationEngine};
