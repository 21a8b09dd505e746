//! Reputation Records, Score Aggregates, and Ejection Math
//!
//! Peer ratings accumulate into weighted positive/negative totals per user.
//! The negative aggregate only counts records after the user's amnesty
//! baseline; historical records are never deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::SystemSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingPolarity {
    Positive,
    Negative,
}

impl RatingPolarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            RatingPolarity::Positive => "positive",
            RatingPolarity::Negative => "negative",
        }
    }

    pub fn parse(s: &str) -> Option<RatingPolarity> {
        match s {
            "positive" => Some(RatingPolarity::Positive),
            "negative" => Some(RatingPolarity::Negative),
            _ => None,
        }
    }
}

/// One peer rating. Immutable; amnesty moves the counting baseline instead
/// of touching records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReputationRecord {
    pub id: Uuid,
    pub rater_id: i64,
    pub target_id: i64,
    pub polarity: RatingPolarity,
    pub reason: Option<String>,
    /// Invariant: weight > 0.
    pub weight: u32,
    pub rated_at: DateTime<Utc>,
}

/// Weighted aggregate for one user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReputationScore {
    pub user_id: i64,
    pub positive: i64,
    pub negative: i64,
}

impl ReputationScore {
    pub fn net(&self) -> i64 {
        self.positive - self.negative
    }
}

/// Negative aggregate at which a user is ejected:
/// max(ceil(eligible * threshold% / 100), 1), mirroring the participation
/// bound in the vote resolver.
pub fn ejection_bar(eligible_voters: u32, settings: &SystemSettings) -> i64 {
    let bar = (eligible_voters as u64 * settings.negative_ratings_threshold_percent as u64)
        .div_ceil(100) as i64;
    bar.max(1)
}

pub fn ejection_due(negative: i64, eligible_voters: u32, settings: &SystemSettings) -> bool {
    negative >= ejection_bar(eligible_voters, settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(threshold_percent: u32) -> SystemSettings {
        SystemSettings {
            negative_ratings_threshold_percent: threshold_percent,
            ..SystemSettings::default()
        }
    }

    #[test]
    fn test_net_score() {
        let score = ReputationScore {
            user_id: 5,
            positive: 7,
            negative: 3,
        };
        assert_eq!(score.net(), 4);
    }

    #[test]
    fn test_ejection_bar_scales_with_community() {
        // 30% of 10 eligible voters, ceiling.
        assert_eq!(ejection_bar(10, &settings(30)), 3);
        assert_eq!(ejection_bar(11, &settings(30)), 4);
        // Never below one negative rating.
        assert_eq!(ejection_bar(0, &settings(30)), 1);
        assert_eq!(ejection_bar(2, &settings(10)), 1);
    }

    #[test]
    fn test_ejection_due_at_bar() {
        let s = settings(30);
        assert!(!ejection_due(2, 10, &s));
        assert!(ejection_due(3, 10, &s));
        assert!(ejection_due(4, 10, &s));
    }
}
