use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AnnotatorError, Result};

/// Inclusive score range of a rating form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingScale {
    pub min: u32,
    pub max: u32,
}

impl RatingScale {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    pub fn parse(&self, input: &str) -> Result<f64> {
        let invalid = || AnnotatorError::InvalidRatingInput {
            input: input.to_string(),
            min: self.min,
            max: self.max,
        };

        let score: f64 = input.trim().parse().map_err(|_| invalid())?;
        if !score.is_finite() || score < f64::from(self.min) || score > f64::from(self.max) {
            return Err(invalid());
        }
        Ok(score)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSubmission {
    pub record_id: String,
    pub score: f64,
    pub scale: RatingScale,
    pub submitted_at: DateTime<Utc>,
}

/// Accepted ratings of one screen, in submission order.
#[derive(Debug, Clone, Default)]
pub struct RatingLedger {
    submissions: Vec<RatingSubmission>,
}

impl RatingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `input` and records it. Invalid input leaves the ledger
    /// untouched.
    pub fn submit(&mut self, record_id: &str, input: &str, scale: RatingScale) -> Result<&RatingSubmission> {
        let score = scale.parse(input)?;
        self.submissions.push(RatingSubmission {
            record_id: record_id.to_string(),
            score,
            scale,
            submitted_at: Utc::now(),
        });
        info!(record_id, score, "recorded rating");
        Ok(&self.submissions[self.submissions.len() - 1])
    }

    pub fn submissions(&self) -> &[RatingSubmission] {
        &self.submissions
    }

    pub fn latest_for(&self, record_id: &str) -> Option<&RatingSubmission> {
        self.submissions
            .iter()
            .rev()
            .find(|submission| submission.record_id == record_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIVE: RatingScale = RatingScale::new(1, 5);
    const TEN: RatingScale = RatingScale::new(1, 10);

    #[test]
    fn accepts_values_inside_the_range() {
        assert_eq!(FIVE.parse("1").unwrap(), 1.0);
        assert_eq!(FIVE.parse(" 4.5 ").unwrap(), 4.5);
        assert_eq!(TEN.parse("10").unwrap(), 10.0);
    }

    #[test]
    fn rejects_out_of_range_and_non_numeric_input() {
        for input in ["6", "0", "-1", "abc", "", "NaN", "inf"] {
            let err = FIVE.parse(input).unwrap_err();
            assert!(
                matches!(err, AnnotatorError::InvalidRatingInput { min: 1, max: 5, .. }),
                "{input} should be rejected"
            );
        }
        assert!(TEN.parse("6").is_ok());
    }

    #[test]
    fn invalid_submission_records_nothing() {
        let mut ledger = RatingLedger::new();
        assert!(ledger.submit("1", "6", FIVE).is_err());
        assert!(ledger.submissions().is_empty());

        ledger.submit("1", "4", FIVE).unwrap();
        ledger.submit("1", "5", FIVE).unwrap();
        assert_eq!(ledger.submissions().len(), 2);
        assert_eq!(ledger.latest_for("1").map(|s| s.score), Some(5.0));
        assert!(ledger.latest_for("2").is_none());
    }
}
