use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::errors::AppError;

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;
pub const MAX_COMMENT_CHARS: usize = 2000;

/// Named sub-scores attached to a review, e.g. `{"quiet": 4, "view": 5}`.
pub type RatingAspects = BTreeMap<String, i16>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Uuid,
    pub spot_id: String,
    pub user_id: String,
    pub rating: i16,
    pub comment: Option<String>,
    #[sqlx(json)]
    pub rating_aspects: RatingAspects,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A review as listed on an author's page, joined with the spot it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserReview {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub review: Review,
    pub spot_name: String,
}

/// Caller-supplied review fields, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReviewInput {
    #[serde(default)]
    pub spot_id: String,
    /// Taken as a JSON number so non-integral values fail validation, not decoding.
    pub rating: f64,
    pub comment: Option<String>,
    pub rating_aspects: Option<RatingAspects>,
}

/// A validated review ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub id: Uuid,
    pub spot_id: String,
    pub user_id: String,
    pub rating: i16,
    pub comment: Option<String>,
    pub rating_aspects: RatingAspects,
}

impl NewReview {
    pub fn from_input(user_id: &str, input: CreateReviewInput) -> Result<Self, AppError> {
        let spot_id = input.spot_id.trim();
        if spot_id.is_empty() {
            return Err(AppError::InvalidInput("Spot ID is required".into()));
        }

        let rating = validate_rating(input.rating)?;

        let comment = match input.comment {
            Some(c) => {
                let trimmed = c.trim();
                if trimmed.chars().count() > MAX_COMMENT_CHARS {
                    return Err(AppError::InvalidInput(format!(
                        "Comment must be at most {MAX_COMMENT_CHARS} characters"
                    )));
                }
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            None => None,
        };

        let mut rating_aspects = RatingAspects::new();
        for (name, value) in input.rating_aspects.unwrap_or_default() {
            let name = name.trim();
            if name.is_empty() {
                return Err(AppError::InvalidInput(
                    "Rating aspect names must not be empty".into(),
                ));
            }
            if !(MIN_RATING..=MAX_RATING).contains(&(value as i32)) {
                return Err(AppError::InvalidInput(format!(
                    "Rating aspect '{name}' must be between {MIN_RATING} and {MAX_RATING}, got {value}"
                )));
            }
            if rating_aspects.insert(name.to_string(), value).is_some() {
                return Err(AppError::InvalidInput(format!(
                    "Rating aspect '{name}' is given more than once"
                )));
            }
        }

        Ok(Self {
            id: Uuid::new_v4(),
            spot_id: spot_id.to_string(),
            user_id: user_id.to_string(),
            rating,
            comment,
            rating_aspects,
        })
    }
}

pub fn validate_rating(rating: f64) -> Result<i16, AppError> {
    if !rating.is_finite() || rating.fract() != 0.0 {
        return Err(AppError::InvalidInput(format!(
            "Rating must be a whole number, got {rating}"
        )));
    }
    if !(MIN_RATING as f64..=MAX_RATING as f64).contains(&rating) {
        return Err(AppError::InvalidInput(format!(
            "Rating must be between {MIN_RATING} and {MAX_RATING}, got {rating}"
        )));
    }
    Ok(rating as i16)
}
