mod common;

use std::{sync::Arc, time::Duration};

use spot_reviews_be::{
    db::{MemoryStore, ReviewStore, SpotStore},
    errors::AppError,
    models::{Page, RatingAspects},
    services::{
        RatingAggregator, RatingRefresher, RetryPolicy, ReviewIngestionService,
        ReviewQueryService,
    },
};
use tokio_util::sync::CancellationToken;

use common::{
    RecordingSink, ScriptedReviewStore, as_review_store, as_spot_store, review_input,
    seed_reviews, spot, store_with_spots,
};

struct Services {
    store: MemoryStore,
    ingestion: ReviewIngestionService,
    queries: ReviewQueryService,
    sink: Arc<RecordingSink>,
}

async fn services() -> Services {
    let store = store_with_spots(vec![
        spot("ueno", "Ueno Park", 35.7148, 139.7734),
        spot("yoyogi", "Yoyogi Park", 35.6717, 139.6949),
        spot("shinjuku", "Shinjuku Gyoen", 35.6852, 139.7100),
    ])
    .await;
    let aggregator = RatingAggregator::new(as_review_store(&store), as_spot_store(&store));
    let sink = Arc::new(RecordingSink::default());
    let refresher = RatingRefresher::new(aggregator.clone(), RetryPolicy::default(), sink.clone());

    Services {
        ingestion: ReviewIngestionService::new(as_review_store(&store), refresher),
        queries: ReviewQueryService::new(as_review_store(&store), aggregator),
        store,
        sink,
    }
}

async fn wait_for_review_count(store: &MemoryStore, spot_id: &str, expected: i64) {
    for _ in 0..200 {
        let spot = store.get_spot(spot_id).await.unwrap().unwrap();
        if spot.review_count == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("spot {spot_id} never reached {expected} reviews");
}

#[tokio::test]
async fn test_create_review_returns_persisted_row() {
    let s = services().await;
    let mut aspects = RatingAspects::new();
    aspects.insert("quiet".into(), 4);
    let mut input = review_input("ueno", 5);
    input.comment = Some(" Great cherry blossoms ".into());
    input.rating_aspects = Some(aspects);

    let review = s
        .ingestion
        .create_review("user-1", input, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(review.spot_id, "ueno");
    assert_eq!(review.user_id, "user-1");
    assert_eq!(review.rating, 5);
    assert_eq!(review.comment.as_deref(), Some("Great cherry blossoms"));
    assert_eq!(review.rating_aspects.get("quiet"), Some(&4));
    assert_eq!(review.created_at, review.updated_at);
    assert_eq!(s.store.review_count().await, 1);
}

#[tokio::test]
async fn test_missing_aspects_stored_as_empty_map() {
    let s = services().await;

    let review = s
        .ingestion
        .create_review("user-1", review_input("ueno", 3), &CancellationToken::new())
        .await
        .unwrap();

    assert!(review.rating_aspects.is_empty());
    let json = serde_json::to_value(&review).unwrap();
    assert_eq!(json["ratingAspects"], serde_json::json!({}));
}

#[tokio::test]
async fn test_valid_ratings_accepted_and_out_of_range_rejected() {
    let s = services().await;
    let token = CancellationToken::new();

    for rating in 1..=5 {
        let author = format!("user-{rating}");
        assert!(
            s.ingestion
                .create_review(&author, review_input("ueno", rating), &token)
                .await
                .is_ok()
        );
    }
    for rating in [0, 6, -1, 100] {
        let result = s
            .ingestion
            .create_review("user-x", review_input("yoyogi", rating), &token)
            .await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))), "rating {rating}");
    }

    assert_eq!(s.store.review_count().await, 5);
}

#[tokio::test]
async fn test_second_review_by_same_author_is_already_exists() {
    let s = services().await;
    let token = CancellationToken::new();

    s.ingestion
        .create_review("user-1", review_input("ueno", 4), &token)
        .await
        .unwrap();
    let second = s
        .ingestion
        .create_review("user-1", review_input("ueno", 2), &token)
        .await;

    assert!(matches!(second, Err(AppError::AlreadyExists(_))));
    assert_eq!(s.store.review_count().await, 1);

    // A different spot is fine.
    assert!(
        s.ingestion
            .create_review("user-1", review_input("yoyogi", 2), &token)
            .await
            .is_ok()
    );
}

fn ingestion_over(store: &MemoryStore, reviews: Arc<dyn ReviewStore>) -> ReviewIngestionService {
    let aggregator = RatingAggregator::new(as_review_store(store), as_spot_store(store));
    let refresher = RatingRefresher::new(
        aggregator,
        RetryPolicy::default(),
        Arc::new(RecordingSink::default()),
    );
    ReviewIngestionService::new(reviews, refresher)
}

#[tokio::test]
async fn test_store_uniqueness_rejects_duplicate_missed_by_check() {
    let s = services().await;
    let mut scripted = ScriptedReviewStore::new(s.store.clone());
    scripted.blind_existence_check = true;
    let ingestion = ingestion_over(&s.store, Arc::new(scripted));
    let token = CancellationToken::new();

    ingestion
        .create_review("user-1", review_input("ueno", 4), &token)
        .await
        .unwrap();
    let second = ingestion
        .create_review("user-1", review_input("ueno", 2), &token)
        .await;

    assert!(matches!(second, Err(AppError::AlreadyExists(_))));
    assert_eq!(s.store.review_count().await, 1);
}

#[tokio::test]
async fn test_concurrent_duplicates_store_one_row() {
    let s = services().await;
    let mut scripted = ScriptedReviewStore::new(s.store.clone());
    scripted.blind_existence_check = true;
    let ingestion = ingestion_over(&s.store, Arc::new(scripted));
    let token = CancellationToken::new();

    let (first, second) = tokio::join!(
        ingestion.create_review("user-1", review_input("ueno", 4), &token),
        ingestion.create_review("user-1", review_input("ueno", 5), &token),
    );

    let results = [first, second];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(AppError::AlreadyExists(_))))
            .count(),
        1
    );
    assert_eq!(s.store.review_count().await, 1);
}

#[tokio::test]
async fn test_failed_read_back_is_internal_but_row_is_kept() {
    let s = services().await;
    let mut scripted = ScriptedReviewStore::new(s.store.clone());
    scripted.fail_reads = true;
    let ingestion = ingestion_over(&s.store, Arc::new(scripted));
    let token = CancellationToken::new();

    let result = ingestion
        .create_review("user-1", review_input("ueno", 4), &token)
        .await;

    assert!(matches!(result, Err(AppError::InternalError)));
    assert_eq!(s.store.review_count().await, 1);

    let retry = s
        .ingestion
        .create_review("user-1", review_input("ueno", 4), &token)
        .await;
    assert!(matches!(retry, Err(AppError::AlreadyExists(_))));
}

#[tokio::test]
async fn test_missing_author_is_unauthorized() {
    let s = services().await;

    let result = s
        .ingestion
        .create_review("", review_input("ueno", 4), &CancellationToken::new())
        .await;

    assert!(matches!(result, Err(AppError::Unauthorized(_))));
    assert_eq!(s.store.review_count().await, 0);
}

#[tokio::test]
async fn test_empty_or_unknown_spot_is_invalid_input() {
    let s = services().await;
    let token = CancellationToken::new();

    let empty = s
        .ingestion
        .create_review("user-1", review_input("", 4), &token)
        .await;
    assert!(matches!(empty, Err(AppError::InvalidInput(_))));

    let unknown = s
        .ingestion
        .create_review("user-1", review_input("atlantis", 4), &token)
        .await;
    assert!(matches!(unknown, Err(AppError::InvalidInput(_))));

    assert_eq!(s.store.review_count().await, 0);
}

#[tokio::test]
async fn test_background_refresh_converges_spot_stats() {
    let s = services().await;
    let token = CancellationToken::new();

    for (i, rating) in [5, 5, 5, 4, 3].into_iter().enumerate() {
        s.ingestion
            .create_review(&format!("user-{i}"), review_input("ueno", rating), &token)
            .await
            .unwrap();
    }

    wait_for_review_count(&s.store, "ueno", 5).await;
    let spot = s.store.get_spot("ueno").await.unwrap().unwrap();
    assert_eq!(spot.average_rating, 4.4);
    assert!(s.sink.events().is_empty());
}

#[tokio::test]
async fn test_spot_reviews_page_and_distribution() {
    let s = services().await;
    seed_reviews(&s.store, "ueno", &[5, 5, 5, 4, 3]).await;

    let result = s.queries.spot_reviews("ueno", Page::default()).await.unwrap();

    assert_eq!(result.reviews.items.len(), 5);
    assert_eq!(result.reviews.total_count, 5);
    assert_eq!(result.reviews.total_pages, 1);
    let dist = result.rating_distribution;
    assert_eq!(dist.count(5), 3);
    assert_eq!(dist.count(4), 1);
    assert_eq!(dist.count(3), 1);
    assert_eq!(dist.count(2), 0);
    assert_eq!(dist.count(1), 0);
    assert_eq!(dist.total, 5);
    assert_eq!(dist.average, 4.4);
}

#[tokio::test]
async fn test_distribution_is_fresh_not_denormalized() {
    let s = services().await;
    seed_reviews(&s.store, "ueno", &[2, 4]).await;

    // No aggregation has run, so the spot still says zero reviews.
    let spot = s.store.get_spot("ueno").await.unwrap().unwrap();
    assert_eq!(spot.review_count, 0);

    let result = s.queries.spot_reviews("ueno", Page::default()).await.unwrap();
    assert_eq!(result.rating_distribution.total, 2);
    assert_eq!(result.rating_distribution.average, 3.0);
}

#[tokio::test]
async fn test_pagination_over_45_reviews() {
    let s = services().await;
    let ratings: Vec<i32> = (0..45).map(|i| (i % 5) + 1).collect();
    seed_reviews(&s.store, "ueno", &ratings).await;

    let page_one = s
        .queries
        .spot_reviews("ueno", Page::new(Some(1), Some(20)))
        .await
        .unwrap();
    let page_three = s
        .queries
        .spot_reviews("ueno", Page::new(Some(3), Some(20)))
        .await
        .unwrap();

    assert_eq!(page_one.reviews.items.len(), 20);
    assert_eq!(page_three.reviews.items.len(), 5);
    assert_eq!(page_three.reviews.total_count, 45);
    assert_eq!(page_three.reviews.total_pages, 3);
    assert!(
        page_three
            .reviews
            .items
            .iter()
            .all(|r| !page_one.reviews.items.iter().any(|p| p.id == r.id))
    );

    let everything = s
        .queries
        .spot_reviews("ueno", Page::new(Some(1), Some(45)))
        .await
        .unwrap();
    let all_ids: Vec<_> = everything.reviews.items.iter().map(|r| r.id).collect();
    let page_three_ids: Vec<_> = page_three.reviews.items.iter().map(|r| r.id).collect();
    assert_eq!(all_ids.len(), 45);
    assert_eq!(page_three_ids, all_ids[40..].to_vec());
    assert!(
        page_three
            .reviews
            .items
            .windows(2)
            .all(|w| (w[0].created_at, w[0].id) >= (w[1].created_at, w[1].id))
    );

    let past_end = s
        .queries
        .spot_reviews("ueno", Page::new(Some(10), Some(20)))
        .await
        .unwrap();
    assert!(past_end.reviews.items.is_empty());
    assert_eq!(past_end.reviews.total_count, 45);
    assert_eq!(past_end.rating_distribution.total, 45);
}

#[tokio::test]
async fn test_pages_cover_every_review_once() {
    let s = services().await;
    let ratings: Vec<i32> = (0..45).map(|i| (i % 5) + 1).collect();
    seed_reviews(&s.store, "ueno", &ratings).await;

    let mut seen = Vec::new();
    for page in 1..=3 {
        let result = s
            .queries
            .spot_reviews("ueno", Page::new(Some(page), Some(20)))
            .await
            .unwrap();
        seen.extend(result.reviews.items.into_iter().map(|r| r.id));
    }
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 45);
}

#[tokio::test]
async fn test_default_paging_for_non_positive_values() {
    let s = services().await;
    seed_reviews(&s.store, "ueno", &[4; 25]).await;

    let result = s
        .queries
        .spot_reviews("ueno", Page::new(Some(0), Some(-5)))
        .await
        .unwrap();

    assert_eq!(result.reviews.page, 1);
    assert_eq!(result.reviews.page_size, 20);
    assert_eq!(result.reviews.items.len(), 20);
    assert_eq!(result.reviews.total_pages, 2);
}

#[tokio::test]
async fn test_spot_reviews_requires_spot() {
    let s = services().await;

    let result = s.queries.spot_reviews("  ", Page::default()).await;

    assert!(matches!(result, Err(AppError::InvalidInput(_))));
}

#[tokio::test]
async fn test_user_reviews_carry_spot_names() {
    let s = services().await;
    let token = CancellationToken::new();
    for spot_id in ["ueno", "yoyogi", "shinjuku"] {
        s.ingestion
            .create_review("user-7", review_input(spot_id, 4), &token)
            .await
            .unwrap();
    }
    s.ingestion
        .create_review("someone-else", review_input("ueno", 1), &token)
        .await
        .unwrap();

    let result = s
        .queries
        .user_reviews("user-7", Page::new(Some(1), Some(2)))
        .await
        .unwrap();

    assert_eq!(result.total_count, 3);
    assert_eq!(result.total_pages, 2);
    assert_eq!(result.items.len(), 2);
    assert!(result.items.iter().all(|r| r.review.user_id == "user-7"));
    for item in &result.items {
        let expected = match item.review.spot_id.as_str() {
            "ueno" => "Ueno Park",
            "yoyogi" => "Yoyogi Park",
            "shinjuku" => "Shinjuku Gyoen",
            other => panic!("unexpected spot {other}"),
        };
        assert_eq!(item.spot_name, expected);
    }

    let json = serde_json::to_value(&result.items[0]).unwrap();
    assert!(json.get("spotName").is_some());
    assert!(json.get("rating").is_some());
}

#[tokio::test]
async fn test_user_reviews_requires_author() {
    let s = services().await;

    let result = s.queries.user_reviews("", Page::default()).await;

    assert!(matches!(result, Err(AppError::InvalidInput(_))));
}
