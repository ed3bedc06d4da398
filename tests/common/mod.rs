#![allow(dead_code)]

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;
use spot_reviews_be::{
    db::{MemoryStore, ReviewStore, SpotStore},
    errors::AppError,
    geo::RadiusFilter,
    models::{
        CreateReviewInput, NewReview, Page, Review, Spot, SpotFilter, SpotHit, SpotTextQuery,
        UserReview, spot::LocalizedText,
    },
    services::{FailureSink, RefreshEvent},
};

pub fn spot(id: &str, name: &str, lat: f64, lng: f64) -> Spot {
    let now = Utc::now();
    Spot {
        id: id.into(),
        name: name.into(),
        name_i18n: LocalizedText::new(),
        latitude: lat,
        longitude: lng,
        category: "park".into(),
        address: format!("{name} street"),
        address_i18n: LocalizedText::new(),
        country_code: "JP".into(),
        average_rating: 0.0,
        review_count: 0,
        created_at: now,
        updated_at: now,
    }
}

pub async fn store_with_spots(spots: Vec<Spot>) -> MemoryStore {
    let store = MemoryStore::new();
    for s in spots {
        store.add_spot(s).await;
    }
    store
}

/// Inserts reviews directly, one author per rating.
pub async fn seed_reviews(store: &MemoryStore, spot_id: &str, ratings: &[i32]) {
    for (i, rating) in ratings.iter().enumerate() {
        let review = NewReview::from_input(
            &format!("seed-user-{i}"),
            CreateReviewInput {
                spot_id: spot_id.into(),
                rating: f64::from(*rating),
                ..Default::default()
            },
        )
        .unwrap();
        store.create_review(&review).await.unwrap();
    }
}

pub fn review_input(spot_id: &str, rating: i32) -> CreateReviewInput {
    CreateReviewInput {
        spot_id: spot_id.into(),
        rating: f64::from(rating),
        ..Default::default()
    }
}

/// Collects refresh events; optionally reacts to each one.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<RefreshEvent>>,
    hook: Option<Box<dyn Fn(&RefreshEvent) + Send + Sync>>,
}

impl RecordingSink {
    pub fn with_hook<F>(hook: F) -> Self
    where
        F: Fn(&RefreshEvent) + Send + Sync + 'static,
    {
        Self {
            events: Mutex::new(Vec::new()),
            hook: Some(Box::new(hook)),
        }
    }

    pub fn events(&self) -> Vec<RefreshEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn retry_delays(&self) -> Vec<Duration> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                RefreshEvent::AttemptFailed { retry_in, .. } => retry_in,
                _ => None,
            })
            .collect()
    }
}

impl FailureSink for RecordingSink {
    fn report(&self, event: RefreshEvent) {
        if let Some(hook) = &self.hook {
            hook(&event);
        }
        self.events.lock().unwrap().push(event);
    }
}

pub enum UpdateFault {
    Error,
    Hang,
}

/// Wraps a `MemoryStore` and fails the first `failures` rating updates.
pub struct FlakySpotStore {
    inner: MemoryStore,
    failures_left: AtomicU32,
    fault: UpdateFault,
    update_calls: AtomicU32,
}

impl FlakySpotStore {
    pub fn new(inner: MemoryStore, failures: u32) -> Self {
        Self::with_fault(inner, failures, UpdateFault::Error)
    }

    pub fn with_fault(inner: MemoryStore, failures: u32, fault: UpdateFault) -> Self {
        Self {
            inner,
            failures_left: AtomicU32::new(failures),
            fault,
            update_calls: AtomicU32::new(0),
        }
    }

    pub fn update_calls(&self) -> u32 {
        self.update_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpotStore for FlakySpotStore {
    async fn get_spot(&self, id: &str) -> Result<Option<Spot>, AppError> {
        self.inner.get_spot(id).await
    }

    async fn list_spots(
        &self,
        filter: &SpotFilter,
        page: Page,
    ) -> Result<(Vec<Spot>, i64), AppError> {
        self.inner.list_spots(filter, page).await
    }

    async fn search_by_radius(
        &self,
        radius: &RadiusFilter,
        page: Page,
    ) -> Result<(Vec<SpotHit>, i64), AppError> {
        self.inner.search_by_radius(radius, page).await
    }

    async fn search_text(
        &self,
        query: &SpotTextQuery,
        page: Page,
    ) -> Result<(Vec<SpotHit>, i64), AppError> {
        self.inner.search_text(query, page).await
    }

    async fn update_rating_stats(
        &self,
        spot_id: &str,
        average_rating: f64,
        review_count: i64,
    ) -> Result<(), AppError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            match self.fault {
                UpdateFault::Error => {
                    return Err(AppError::DatabaseError("connection reset".into()));
                }
                UpdateFault::Hang => std::future::pending::<()>().await,
            }
        }

        self.inner
            .update_rating_stats(spot_id, average_rating, review_count)
            .await
    }
}

/// Wraps a `MemoryStore` review side. `blind_existence_check` makes
/// `review_exists` always answer `false` so the insert's own uniqueness rule is
/// what rejects a duplicate; `fail_reads` breaks `get_review`.
pub struct ScriptedReviewStore {
    inner: MemoryStore,
    pub blind_existence_check: bool,
    pub fail_reads: bool,
}

impl ScriptedReviewStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            blind_existence_check: false,
            fail_reads: false,
        }
    }
}

#[async_trait]
impl ReviewStore for ScriptedReviewStore {
    async fn create_review(&self, review: &NewReview) -> Result<(), AppError> {
        self.inner.create_review(review).await
    }

    async fn get_review(&self, id: Uuid) -> Result<Option<Review>, AppError> {
        if self.fail_reads {
            return Err(AppError::DatabaseError("read replica unavailable".into()));
        }
        self.inner.get_review(id).await
    }

    async fn review_exists(&self, user_id: &str, spot_id: &str) -> Result<bool, AppError> {
        if self.blind_existence_check {
            return Ok(false);
        }
        self.inner.review_exists(user_id, spot_id).await
    }

    async fn spot_reviews(
        &self,
        spot_id: &str,
        page: Page,
    ) -> Result<(Vec<Review>, i64), AppError> {
        self.inner.spot_reviews(spot_id, page).await
    }

    async fn user_reviews(
        &self,
        user_id: &str,
        page: Page,
    ) -> Result<(Vec<UserReview>, i64), AppError> {
        self.inner.user_reviews(user_id, page).await
    }

    async fn rating_counts(&self, spot_id: &str) -> Result<Vec<(i16, i64)>, AppError> {
        self.inner.rating_counts(spot_id).await
    }
}

pub fn as_review_store(store: &MemoryStore) -> Arc<dyn ReviewStore> {
    Arc::new(store.clone())
}

pub fn as_spot_store(store: &MemoryStore) -> Arc<dyn SpotStore> {
    Arc::new(store.clone())
}
