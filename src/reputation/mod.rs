//! Reputation Engine
//!
//! Weighted peer ratings accumulate into per-user positive/negative
//! aggregates. Crossing the negative threshold triggers a single ejection
//! sequence (roster removal + demotion); amnesty resets the negative
//! aggregate by moving a baseline timestamp, preserving history for audit.

pub mod engine;
pub mod score;

pub use engine::{RatingReceipt, ReputationEngine};
pub use score::{ejection_bar, ejection_due, RatingPolarity, ReputationRecord, ReputationScore};
