//! Contract tests for the catalog store against a small hand-built catalog,
//! including the half-open boundary rules, income monotonicity, ranking
//! orders, and the tiered name lookups.

use tia_core::catalog::QuoteRequest;
use tia_core::ranking::{parse_factors, PriorityFactor};
use tia_core::CatalogError;
use tia_db::{connect_memory, migrations, CatalogStore, DbPool, StoreError};

async fn setup() -> (DbPool, CatalogStore) {
    let pool = connect_memory().await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrate");
    insert_fixture(&pool).await;
    (pool.clone(), CatalogStore::new(pool))
}

/// Three insurers, one plan each. The Axis Max Life band is the exact
/// scenario from the product requirements; the other two give the ranking
/// tests contrast on every metric.
async fn insert_fixture(pool: &DbPool) {
    let statements = [
        "INSERT INTO insurers VALUES (1, 'Axis Max Life', 99.5, 95.5, 7.3)",
        "INSERT INTO insurers VALUES (2, 'HDFC Life', 99.2, 87.3, 2.0)",
        "INSERT INTO insurers VALUES (3, 'ICICI Prudential', 97.5, 92.1, 14.3)",
        "INSERT INTO term_plans VALUES (1, 1, 'Smart Secure Plus', 500000, 150000000, 5, 50, 18, 70, \
         '', 'Critical Illness, Accidental Death', 'https://www.axismaxlife.com/smartsecureplus')",
        "INSERT INTO term_plans VALUES (2, 2, 'Click 2 Protect Life', 500000, 150000000, 5, 50, 18, 70, \
         'Critical Illness', 'Accidental Death', 'https://www.hdfclife.com/click2protectlife')",
        "INSERT INTO term_plans VALUES (3, 3, 'iProtect Smart', 500000, 150000000, 5, 50, 18, 70, \
         '', 'Accidental Death', 'https://www.icicipru.com/insurance/term-insurance/iProtect-Smart')",
        // age [30,35) term [10,13) coverage [1000000,2000000)
        "INSERT INTO premiums VALUES (1, 1, 30, 35, 10, 13, 1000000, 2000000, 100000, 25000)",
        "INSERT INTO premiums VALUES (2, 2, 30, 35, 10, 13, 1000000, 2000000, 100000, 22000)",
        "INSERT INTO premiums VALUES (3, 3, 30, 35, 10, 13, 1000000, 2000000, 100000, 19000)",
    ];
    for statement in statements {
        sqlx::query(statement).execute(pool).await.expect("insert fixture row");
    }
}

fn request(age: i64, term: i64, coverage: i64, income: i64) -> QuoteRequest {
    QuoteRequest::new(age, term, coverage, income).expect("valid request")
}

#[tokio::test]
async fn scenario_request_returns_the_expected_row() {
    let (_pool, store) = setup().await;

    let rows = store.lookup_premiums(&request(32, 11, 1_500_000, 600_000)).await.expect("lookup");
    let axis = rows
        .iter()
        .find(|row| row.insurer_name == "Axis Max Life")
        .expect("Axis Max Life row present");
    assert_eq!(axis.plan_name, "Smart Secure Plus");
    assert_eq!(axis.annual_premium, 25_000);
    assert_eq!(axis.paid_riders, "Critical Illness, Accidental Death");
}

#[tokio::test]
async fn age_upper_bound_is_exclusive_and_lower_bound_inclusive() {
    let (_pool, store) = setup().await;

    let at_max = store.lookup_premiums(&request(35, 11, 1_500_000, 600_000)).await.expect("lookup");
    assert!(at_max.is_empty(), "age == age_max must not be eligible");

    let at_min = store.lookup_premiums(&request(30, 11, 1_500_000, 600_000)).await.expect("lookup");
    assert_eq!(at_min.len(), 3, "age == age_min must be eligible");
}

#[tokio::test]
async fn income_below_band_floor_excludes_the_band() {
    let (_pool, store) = setup().await;

    let rows = store.lookup_premiums(&request(32, 11, 1_500_000, 50_000)).await.expect("lookup");
    assert!(rows.is_empty());

    // Monotonic in income: once eligible, a richer customer stays eligible.
    for income in [100_000, 600_000, 10_000_000] {
        let rows =
            store.lookup_premiums(&request(32, 11, 1_500_000, income)).await.expect("lookup");
        assert_eq!(rows.len(), 3, "income {income} should stay eligible");
    }
}

#[tokio::test]
async fn plan_envelope_is_enforced_even_when_band_is_wider() {
    let (pool, store) = setup().await;

    // A defective loader left a band wider than its plan envelope: the band
    // accepts ages up to 80 but the plan stops at 70.
    sqlx::query(
        "INSERT INTO premiums VALUES (99, 1, 60, 80, 10, 13, 1000000, 2000000, 100000, 90000)",
    )
    .execute(&pool)
    .await
    .expect("insert rogue band");

    let rows = store.lookup_premiums(&request(72, 11, 1_500_000, 600_000)).await.expect("lookup");
    assert!(rows.is_empty(), "plan envelope check must reject the rogue band");

    let inside = store.lookup_premiums(&request(65, 11, 1_500_000, 600_000)).await.expect("lookup");
    assert_eq!(inside.len(), 1, "the band is still usable where the plan allows it");
}

#[tokio::test]
async fn lookup_is_idempotent_including_row_order() {
    let (_pool, store) = setup().await;

    let first = store.lookup_premiums(&request(32, 11, 1_500_000, 600_000)).await.expect("lookup");
    let second = store.lookup_premiums(&request(32, 11, 1_500_000, 600_000)).await.expect("lookup");
    assert_eq!(first, second);
}

#[tokio::test]
async fn ranking_by_premium_is_non_decreasing_with_dense_ranks() {
    let (_pool, store) = setup().await;

    let ranked = store
        .recommend_plans(&request(32, 11, 1_500_000, 600_000), &[PriorityFactor::Premium], 2)
        .await
        .expect("recommend");

    assert_eq!(ranked.len(), 2, "output length is min(eligible, limit)");
    assert_eq!(ranked[0].rank, 1);
    assert_eq!(ranked[1].rank, 2);
    assert!(ranked[0].annual_premium <= ranked[1].annual_premium);
    assert_eq!(ranked[0].insurer_name, "ICICI Prudential");
}

#[tokio::test]
async fn ranking_by_csr_is_non_increasing() {
    let (_pool, store) = setup().await;

    let ranked = store
        .recommend_plans(&request(32, 11, 1_500_000, 600_000), &[PriorityFactor::Csr], 3)
        .await
        .expect("recommend");

    assert!(ranked
        .windows(2)
        .all(|pair| pair[0].claim_settlement_ratio >= pair[1].claim_settlement_ratio));
    assert_eq!(ranked[0].insurer_name, "Axis Max Life");
}

#[tokio::test]
async fn tied_complaints_break_by_ascending_premium() {
    let (pool, store) = setup().await;

    // Flatten complaints so the first factor ties across all insurers.
    sqlx::query("UPDATE insurers SET complaints_volume = 5.0")
        .execute(&pool)
        .await
        .expect("update metrics");

    let factors = parse_factors(&["complaints", "premium"]);
    let ranked = store
        .recommend_plans(&request(32, 11, 1_500_000, 600_000), &factors, 3)
        .await
        .expect("recommend");

    let premiums: Vec<i64> = ranked.iter().map(|row| row.annual_premium).collect();
    assert_eq!(premiums, vec![19_000, 22_000, 25_000]);
}

#[tokio::test]
async fn ranking_with_no_eligible_rows_is_empty_not_an_error() {
    let (_pool, store) = setup().await;

    let ranked = store
        .recommend_plans(&request(55, 11, 1_500_000, 600_000), &[PriorityFactor::Premium], 2)
        .await
        .expect("recommend");
    assert!(ranked.is_empty());
}

#[tokio::test]
async fn find_insurer_resolves_substring_and_reports_misses() {
    let (_pool, store) = setup().await;

    let metrics = store.find_insurer("hdfc").await.expect("substring match");
    assert_eq!(metrics.name, "HDFC Life");
    assert_eq!(metrics.claim_settlement_ratio, 99.2);

    let error = store.find_insurer("NoSuchInsurer").await.expect_err("miss");
    match error {
        StoreError::Domain(CatalogError::NotFound { query }) => {
            assert_eq!(query, "NoSuchInsurer");
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn find_plan_returns_detail_with_link() {
    let (_pool, store) = setup().await;

    let detail = store.find_plan("smart secure").await.expect("prefix-ish match");
    assert_eq!(detail.plan_name, "Smart Secure Plus");
    assert_eq!(detail.insurer_name, "Axis Max Life");
    assert!(detail.plan_link.contains("axismaxlife"));
}

#[tokio::test]
async fn list_insurer_metrics_returns_all_rows_in_id_order() {
    let (_pool, store) = setup().await;

    let metrics = store.list_insurer_metrics().await.expect("list");
    let names: Vec<&str> = metrics.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Axis Max Life", "HDFC Life", "ICICI Prudential"]);
}
