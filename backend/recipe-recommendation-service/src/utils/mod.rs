// Utility functions for recipe-recommendation-service

use crate::error::{RecommendationError, Result};
use crate::models::{CookingTime, Recipe};
use once_cell::sync::Lazy;
use regex::Regex;

static HOURS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*(?:giờ|gio|tiếng|tieng|hours?|hrs?|h)(?:\b|\d)")
        .expect("Failed to compile hours pattern")
});

static MINUTES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:phút|phut|minutes?|mins?|m)\b")
        .expect("Failed to compile minutes pattern")
});

// "1h30" style: the number right after the hour marker is minutes
static COMPACT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\d+\s*h\s*(\d+)\b").expect("Failed to compile compact duration pattern")
});

static INTEGER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+").expect("Failed to compile integer pattern"));

/// Parse a localized duration string into minutes
///
/// Recognizes hour tokens ("giờ", "h", "hour") and minute tokens ("phút", "minute", "m");
/// without any unit token the first integer is taken as minutes.
pub fn parse_duration_minutes(text: &str) -> Option<f64> {
    let mut minutes = 0.0;
    let mut matched_unit = false;

    if let Some(caps) = HOURS_RE.captures(text) {
        if let Ok(hours) = caps[1].replace(',', ".").parse::<f64>() {
            minutes += hours * 60.0;
            matched_unit = true;
        }
    }

    if let Some(caps) = MINUTES_RE.captures(text) {
        if let Ok(value) = caps[1].parse::<f64>() {
            minutes += value;
            matched_unit = true;
        }
    } else if let Some(caps) = COMPACT_RE.captures(text) {
        if let Ok(value) = caps[1].parse::<f64>() {
            minutes += value;
        }
    }

    if matched_unit {
        return Some(minutes);
    }

    INTEGER_RE
        .find(text)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Cooking time of a recipe in minutes
///
/// Missing values, text without any integer and zero durations are reported as
/// `MalformedItemAttribute` so callers can drop just this signal.
pub fn cooking_minutes(recipe: &Recipe) -> Result<f64> {
    let malformed = |reason: &str| RecommendationError::MalformedItemAttribute {
        recipe_id: recipe.id.clone(),
        attribute: "cookingTime",
        reason: reason.to_string(),
    };

    let minutes = match &recipe.cooking_time {
        None => return Err(malformed("missing")),
        Some(CookingTime::Minutes(m)) => *m as f64,
        Some(CookingTime::Text(text)) => {
            parse_duration_minutes(text).ok_or_else(|| malformed("no duration found"))?
        }
    };

    if minutes <= 0.0 {
        return Err(malformed("zero duration"));
    }

    Ok(minutes)
}

/// Closeness of two durations with exponential decay, relative to the longer one
///
/// Identical = 1.0, double the time ≈ 0.37; zero when either side is unknown.
pub fn duration_similarity(candidate_minutes: f64, reference_minutes: f64) -> f64 {
    if candidate_minutes <= 0.0 || reference_minutes <= 0.0 {
        return 0.0;
    }

    let diff = (candidate_minutes - reference_minutes).abs();
    let scale = candidate_minutes.max(reference_minutes) * 0.5;
    (-diff / scale).exp()
}

/// Convert a [0, 1] score into a whole percentage capped at 100
pub fn to_percentage(score: f64) -> u8 {
    if !score.is_finite() || score <= 0.0 {
        return 0;
    }
    (score * 100.0).round().min(100.0) as u8
}

/// Anonymized short label for a user without a display name
pub fn short_user_label(user_id: &str) -> String {
    let tail: String = user_id
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("#{}", tail)
}
