//! Seed fixture contract: deterministic load, envelope clamping, and a
//! working end-to-end lookup against the demo catalog.

use sqlx::Row;
use tia_core::catalog::QuoteRequest;
use tia_db::{connect_memory, migrations, CatalogStore, DbPool, SeedCatalog};

async fn seeded_pool() -> DbPool {
    let pool = connect_memory().await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrate");
    SeedCatalog::load(&pool).await.expect("seed");
    pool
}

#[tokio::test]
async fn seed_loads_expected_shape() {
    let pool = seeded_pool().await;
    let summary = SeedCatalog::load(&pool).await.expect("reseed");

    assert_eq!(summary.insurers, 4);
    assert_eq!(summary.plans, 8);
    assert!(summary.premium_bands > 0);
}

#[tokio::test]
async fn reseeding_is_idempotent() {
    let pool = seeded_pool().await;
    let first = SeedCatalog::load(&pool).await.expect("reseed once");
    let second = SeedCatalog::load(&pool).await.expect("reseed twice");
    assert_eq!(first, second);

    let count = sqlx::query("SELECT COUNT(*) AS count FROM insurers")
        .fetch_one(&pool)
        .await
        .expect("count insurers")
        .get::<i64, _>("count");
    assert_eq!(count, 4);
}

#[tokio::test]
async fn every_band_lies_inside_its_plan_envelope() {
    let pool = seeded_pool().await;

    let violations = sqlx::query(
        "SELECT COUNT(*) AS count \
         FROM premiums p JOIN term_plans t ON p.plan_id = t.plan_id \
         WHERE p.age_min < t.min_age OR p.age_max > t.max_age \
            OR p.term_min < t.min_term OR p.term_max > t.max_term \
            OR p.coverage_min < t.min_cover OR p.coverage_max > t.max_cover",
    )
    .fetch_one(&pool)
    .await
    .expect("check clamping")
    .get::<i64, _>("count");

    assert_eq!(violations, 0, "seeded bands must be clamped to plan envelopes");
}

#[tokio::test]
async fn seeded_catalog_answers_a_realistic_lookup() {
    let pool = seeded_pool().await;
    let store = CatalogStore::new(pool);

    let request = QuoteRequest::new(32, 11, 1_500_000, 600_000).expect("request");
    let rows = store.lookup_premiums(&request).await.expect("lookup");

    assert!(!rows.is_empty(), "demo catalog should cover a mainstream request");
    assert!(rows.iter().any(|row| row.insurer_name == "Axis Max Life"));
    // One row per plan at most for a point request, since bands partition
    // the space.
    let mut plans: Vec<&str> = rows.iter().map(|row| row.plan_name.as_str()).collect();
    plans.sort_unstable();
    plans.dedup();
    assert_eq!(plans.len(), rows.len());
}

#[tokio::test]
async fn seeded_lookup_is_idempotent() {
    let pool = seeded_pool().await;
    let store = CatalogStore::new(pool);
    let request = QuoteRequest::new(40, 14, 4_500_000, 2_000_000).expect("request");

    let first = store.lookup_premiums(&request).await.expect("lookup");
    let second = store.lookup_premiums(&request).await.expect("lookup");
    assert_eq!(first, second);
}
