use std::{cmp::Ordering, collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{ReviewStore, SpotStore};
use crate::{
    errors::AppError,
    geo::RadiusFilter,
    models::{
        pagination::Page,
        review::{NewReview, Review, UserReview},
        spot::{Spot, SpotFilter, SpotHit, SpotTextQuery},
    },
};

/// In-process store with the same rules as the Postgres schema: one review per
/// `(user, spot)` and reviews only for existing spots.
#[derive(Clone, Default)]
pub struct MemoryStore {
    reviews: Arc<Mutex<Vec<Review>>>,
    spots: Arc<Mutex<HashMap<String, Spot>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_spot(&self, spot: Spot) {
        self.spots.lock().await.insert(spot.id.clone(), spot);
    }

    pub async fn review_count(&self) -> usize {
        self.reviews.lock().await.len()
    }
}

fn paginate<T>(items: Vec<T>, page: Page) -> (Vec<T>, i64) {
    let total = items.len() as i64;
    let page_items = items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect();
    (page_items, total)
}

fn newest_first(a: &Review, b: &Review) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}

fn by_rating(a: &Spot, b: &Spot) -> Ordering {
    b.average_rating
        .total_cmp(&a.average_rating)
        .then_with(|| b.review_count.cmp(&a.review_count))
        .then_with(|| a.id.cmp(&b.id))
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn create_review(&self, new_review: &NewReview) -> Result<(), AppError> {
        if !self.spots.lock().await.contains_key(&new_review.spot_id) {
            return Err(AppError::InvalidInput(format!(
                "Spot {} does not exist",
                new_review.spot_id
            )));
        }

        let mut reviews = self.reviews.lock().await;
        if reviews
            .iter()
            .any(|r| r.user_id == new_review.user_id && r.spot_id == new_review.spot_id)
        {
            return Err(AppError::AlreadyExists(format!(
                "User {} has already reviewed spot {}",
                new_review.user_id, new_review.spot_id
            )));
        }

        let now = Utc::now();
        reviews.push(Review {
            id: new_review.id,
            spot_id: new_review.spot_id.clone(),
            user_id: new_review.user_id.clone(),
            rating: new_review.rating,
            comment: new_review.comment.clone(),
            rating_aspects: new_review.rating_aspects.clone(),
            created_at: now,
            updated_at: now,
        });

        Ok(())
    }

    async fn get_review(&self, id: Uuid) -> Result<Option<Review>, AppError> {
        Ok(self
            .reviews
            .lock()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn review_exists(&self, user_id: &str, spot_id: &str) -> Result<bool, AppError> {
        Ok(self
            .reviews
            .lock()
            .await
            .iter()
            .any(|r| r.user_id == user_id && r.spot_id == spot_id))
    }

    async fn spot_reviews(
        &self,
        spot_id: &str,
        page: Page,
    ) -> Result<(Vec<Review>, i64), AppError> {
        let mut matching: Vec<Review> = self
            .reviews
            .lock()
            .await
            .iter()
            .filter(|r| r.spot_id == spot_id)
            .cloned()
            .collect();
        matching.sort_by(newest_first);

        Ok(paginate(matching, page))
    }

    async fn user_reviews(
        &self,
        user_id: &str,
        page: Page,
    ) -> Result<(Vec<UserReview>, i64), AppError> {
        let mut matching: Vec<Review> = self
            .reviews
            .lock()
            .await
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        matching.sort_by(newest_first);

        let spots = self.spots.lock().await;
        let joined = matching
            .into_iter()
            .filter_map(|review| {
                let spot_name = spots.get(&review.spot_id)?.name.clone();
                Some(UserReview { review, spot_name })
            })
            .collect();

        Ok(paginate(joined, page))
    }

    async fn rating_counts(&self, spot_id: &str) -> Result<Vec<(i16, i64)>, AppError> {
        let mut counts: HashMap<i16, i64> = HashMap::new();
        for review in self.reviews.lock().await.iter() {
            if review.spot_id == spot_id {
                *counts.entry(review.rating).or_default() += 1;
            }
        }

        Ok(counts.into_iter().collect())
    }
}

#[async_trait]
impl SpotStore for MemoryStore {
    async fn get_spot(&self, id: &str) -> Result<Option<Spot>, AppError> {
        Ok(self.spots.lock().await.get(id).cloned())
    }

    async fn list_spots(
        &self,
        filter: &SpotFilter,
        page: Page,
    ) -> Result<(Vec<Spot>, i64), AppError> {
        let mut matching: Vec<Spot> = self
            .spots
            .lock()
            .await
            .values()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        matching.sort_by(by_rating);

        Ok(paginate(matching, page))
    }

    async fn search_by_radius(
        &self,
        radius: &RadiusFilter,
        page: Page,
    ) -> Result<(Vec<SpotHit>, i64), AppError> {
        let bbox = radius.bounding_box();
        let mut hits: Vec<SpotHit> = self
            .spots
            .lock()
            .await
            .values()
            .filter(|s| bbox.contains(&s.coordinates()))
            .filter_map(|s| {
                let distance = radius.center.distance_km(&s.coordinates());
                radius.includes_distance(distance).then(|| SpotHit {
                    spot: s.clone(),
                    distance_km: Some(distance),
                })
            })
            .collect();
        hits.sort_by(|a, b| {
            let da = a.distance_km.unwrap_or_default();
            let db = b.distance_km.unwrap_or_default();
            da.total_cmp(&db).then_with(|| a.spot.id.cmp(&b.spot.id))
        });

        Ok(paginate(hits, page))
    }

    async fn search_text(
        &self,
        query: &SpotTextQuery,
        page: Page,
    ) -> Result<(Vec<SpotHit>, i64), AppError> {
        let mut hits: Vec<SpotHit> = Vec::new();
        for spot in self.spots.lock().await.values() {
            if !query.matches(spot) || !query.filter.matches(spot) {
                continue;
            }
            let distance_km = match &query.radius {
                Some(radius) => {
                    let coordinates = spot.coordinates();
                    if !radius.bounding_box().contains(&coordinates) {
                        continue;
                    }
                    let distance = radius.center.distance_km(&coordinates);
                    if !radius.includes_distance(distance) {
                        continue;
                    }
                    Some(distance)
                }
                None => None,
            };
            hits.push(SpotHit {
                spot: spot.clone(),
                distance_km,
            });
        }
        hits.sort_by(|a, b| {
            query
                .name_match(&a.spot)
                .cmp(&query.name_match(&b.spot))
                .then_with(|| by_rating(&a.spot, &b.spot))
        });

        Ok(paginate(hits, page))
    }

    async fn update_rating_stats(
        &self,
        spot_id: &str,
        average_rating: f64,
        review_count: i64,
    ) -> Result<(), AppError> {
        let mut spots = self.spots.lock().await;
        let spot = spots
            .get_mut(spot_id)
            .ok_or_else(|| AppError::NotFound(format!("Spot {} not found", spot_id)))?;
        spot.average_rating = average_rating;
        spot.review_count = review_count;
        spot.updated_at = Utc::now();

        Ok(())
    }
}
