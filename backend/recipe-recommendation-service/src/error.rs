use std::fmt;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RecommendationError>;

/// Behavioral / catalog data sources read from the storage collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataSource {
    Favorites,
    Feedback,
    ViewHistory,
    PeerActivity,
    CandidateRecipes,
    PopularRecipes,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Favorites => "favorites",
            DataSource::Feedback => "feedback",
            DataSource::ViewHistory => "view_history",
            DataSource::PeerActivity => "peer_activity",
            DataSource::CandidateRecipes => "candidate_recipes",
            DataSource::PopularRecipes => "popular_recipes",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by a `RecommendationStore` implementation
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store read timed out after {0:?}")]
    Timeout(Duration),

    #[error("Database error: {0}")]
    Database(String),
}

#[derive(Debug, Error)]
pub enum RecommendationError {
    #[error("Input data unavailable ({source_name}): {reason}")]
    InputDataUnavailable {
        source_name: DataSource,
        reason: String,
    },

    #[error("No candidate recipes available")]
    NoCandidateItems,

    #[error("Insufficient behavioral data for user {0}")]
    InsufficientUserData(String),

    #[error("Malformed attribute '{attribute}' on recipe {recipe_id}: {reason}")]
    MalformedItemAttribute {
        recipe_id: String,
        attribute: &'static str,
        reason: String,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RecommendationError {
    pub fn unavailable(source_name: DataSource, err: impl fmt::Display) -> Self {
        RecommendationError::InputDataUnavailable {
            source_name,
            reason: err.to_string(),
        }
    }

    /// Whether the engine recovers from this error locally instead of surfacing it
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, RecommendationError::InvalidRequest(_))
    }
}
