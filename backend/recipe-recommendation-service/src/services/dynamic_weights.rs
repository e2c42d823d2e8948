// Content/collaborative blend chosen from the volume and quality of the
// user's own behavioral data.

use crate::models::BlendWeights;

pub const MIN_WEIGHT: f64 = 0.2;
pub const MAX_WEIGHT: f64 = 0.8;

const BASE_CONTENT: f64 = 0.6;
const BASE_COLLABORATIVE: f64 = 0.4;
/// Below this many favorites peer overlap is too thin to trust
const FEW_FAVORITES: usize = 3;
const MANY_FAVORITES: usize = 10;
const SATISFIED_FEEDBACK_COUNT: usize = 5;
const SATISFIED_MEAN_RATING: f64 = 4.0;
const SATISFIED_SHIFT: f64 = 0.1;
const DATA_QUALITY_SATURATION: f64 = 20.0;

/// Counts of the user's behavioral records
#[derive(Debug, Clone, Default)]
pub struct BehaviorSummary {
    pub favorites: usize,
    pub views: usize,
    /// Valid explicit ratings
    pub ratings: Vec<u8>,
}

impl BehaviorSummary {
    pub fn feedback_count(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.favorites == 0 && self.views == 0 && self.ratings.is_empty()
    }

    pub fn mean_rating(&self) -> Option<f64> {
        if self.ratings.is_empty() {
            return None;
        }
        let sum: u32 = self.ratings.iter().map(|r| *r as u32).sum();
        Some(sum as f64 / self.ratings.len() as f64)
    }

    pub fn data_quality(&self) -> f64 {
        let volume = 0.4 * self.favorites as f64
            + 0.3 * self.views as f64
            + 0.3 * self.feedback_count() as f64;
        (volume / DATA_QUALITY_SATURATION).min(1.0)
    }
}

/// Pick the blend weights for a user
///
/// Each weight is clamped to [0.2, 0.8] on its own; the pair is not
/// renormalized afterwards.
pub fn calculate_weights(summary: &BehaviorSummary) -> BlendWeights {
    let (mut content, mut collaborative) = if summary.favorites < FEW_FAVORITES {
        (0.8, 0.2)
    } else if summary.favorites > MANY_FAVORITES {
        (0.4, 0.6)
    } else {
        (BASE_CONTENT, BASE_COLLABORATIVE)
    };

    if summary.feedback_count() > SATISFIED_FEEDBACK_COUNT
        && summary
            .mean_rating()
            .map_or(false, |mean| mean > SATISFIED_MEAN_RATING)
    {
        content -= SATISFIED_SHIFT;
        collaborative += SATISFIED_SHIFT;
    }

    BlendWeights {
        content: content.clamp(MIN_WEIGHT, MAX_WEIGHT),
        collaborative: collaborative.clamp(MIN_WEIGHT, MAX_WEIGHT),
        data_quality: summary.data_quality(),
    }
}
