use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::review::{MAX_RATING, MIN_RATING};

/// Per-star counts for one spot, computed fresh from its reviews.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingDistribution {
    /// Always holds every star value from 1 to 5, zero-filled.
    pub buckets: BTreeMap<i16, i64>,
    pub total: i64,
    pub average: f64,
}

impl Default for RatingDistribution {
    fn default() -> Self {
        Self::from_counts(std::iter::empty())
    }
}

impl RatingDistribution {
    /// Builds a distribution from `(rating, count)` rows. Ratings outside 1-5
    /// are ignored.
    pub fn from_counts<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (i16, i64)>,
    {
        let mut buckets: BTreeMap<i16, i64> = (MIN_RATING as i16..=MAX_RATING as i16)
            .map(|star| (star, 0))
            .collect();

        for (rating, count) in rows {
            if let Some(bucket) = buckets.get_mut(&rating) {
                *bucket += count.max(0);
            }
        }

        let total: i64 = buckets.values().sum();
        let sum: i64 = buckets.iter().map(|(star, n)| *star as i64 * n).sum();
        let average = if total == 0 {
            0.0
        } else {
            round_one_decimal(sum as f64 / total as f64)
        };

        Self {
            buckets,
            total,
            average,
        }
    }

    pub fn count(&self, star: i16) -> i64 {
        self.buckets.get(&star).copied().unwrap_or(0)
    }
}

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
