//! User ratings attached to applications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Errors constructing a [`Rating`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RatingError {
    #[error("rating score must be between 1 and 5 (got {0})")]
    OutOfRange(u8),
}

/// A single user's rating of an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub user_id: String,
    pub score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Rating {
    /// Lowest accepted score.
    pub const MIN: u8 = 1;
    /// Highest accepted score.
    pub const MAX: u8 = 5;

    /// Create a rating stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`RatingError::OutOfRange`] if `score` is not in `1..=5`.
    pub fn new(
        user_id: impl Into<String>,
        score: u8,
        comment: Option<String>,
    ) -> Result<Self, RatingError> {
        if !(Self::MIN..=Self::MAX).contains(&score) {
            return Err(RatingError::OutOfRange(score));
        }
        Ok(Self {
            user_id: user_id.into(),
            score,
            comment,
            created_at: Utc::now(),
        })
    }
}

/// Mean score across `ratings`, or `None` when there are none.
#[must_use]
pub fn average_rating(ratings: &[Rating]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let total: u32 = ratings.iter().map(|r| u32::from(r.score)).sum();
    #[allow(clippy::cast_precision_loss)] // rating counts never approach 2^52
    let count = ratings.len() as f64;
    Some(f64::from(total) / count)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_out_of_range() {
        assert_eq!(
            Rating::new("u1", 0, None),
            Err(RatingError::OutOfRange(0))
        );
        assert!(Rating::new("u1", 6, None).is_err());
        assert!(Rating::new("u1", 5, Some("great".into())).is_ok());
    }

    #[test]
    fn test_average_rating() {
        assert_eq!(average_rating(&[]), None);
        let ratings = vec![
            Rating::new("a", 4, None).unwrap(),
            Rating::new("b", 5, None).unwrap(),
            Rating::new("c", 3, None).unwrap(),
        ];
        let avg = average_rating(&ratings).unwrap();
        assert!((avg - 4.0).abs() < f64::EPSILON);
    }
}
