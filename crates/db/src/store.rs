use sqlx::sqlite::{Sqlite, SqliteRow};
use sqlx::query::Query;
use sqlx::Row;
use thiserror::Error;
use tracing::debug;

use tia_core::catalog::{CandidateRow, InsurerMetrics, PlanDetail, PremiumRow, QuoteRequest};
use tia_core::matching::{best_match, NameEntry};
use tia_core::ranking::{rank_candidates, PriorityFactor, RankedRow};
use tia_core::CatalogError;

use crate::DbPool;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] CatalogError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// The one eligibility predicate: band ranges contain the request, the income
/// floor is met, and the owning plan's envelope independently contains the
/// request. The plan-envelope clause is redundant when bands were clamped
/// correctly at load time, but it is kept to guard against loader defects.
///
/// Placeholder order matches [`bind_request`]:
/// age x2, term x2, coverage x2, income, age x2, term x2, coverage x2.
const ELIGIBILITY_PREDICATE: &str = "\
    p.age_min <= ? AND p.age_max > ? \
    AND p.term_min <= ? AND p.term_max > ? \
    AND p.coverage_min <= ? AND p.coverage_max > ? \
    AND p.required_min_income <= ? \
    AND t.min_age <= ? AND t.max_age > ? \
    AND t.min_term <= ? AND t.max_term > ? \
    AND t.min_cover <= ? AND t.max_cover > ?";

fn bind_request<'q>(
    query: Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    request: &QuoteRequest,
) -> Query<'q, Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    query
        .bind(request.age)
        .bind(request.age)
        .bind(request.term)
        .bind(request.term)
        .bind(request.coverage_amount)
        .bind(request.coverage_amount)
        .bind(request.income)
        .bind(request.age)
        .bind(request.age)
        .bind(request.term)
        .bind(request.term)
        .bind(request.coverage_amount)
        .bind(request.coverage_amount)
}

/// Read-side access to the insurance catalog. Stateless apart from the pool;
/// every call borrows a pooled connection for its own duration and nothing is
/// held across caller code.
#[derive(Clone)]
pub struct CatalogStore {
    pool: DbPool,
}

impl CatalogStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Premium lookup: one row per eligible premium band. An empty vec is a
    /// valid business outcome, not an error.
    pub async fn lookup_premiums(
        &self,
        request: &QuoteRequest,
    ) -> Result<Vec<PremiumRow>, StoreError> {
        let sql = format!(
            "SELECT i.name AS insurer_name, t.plan_name, p.annual_premium, \
                    t.free_riders, t.paid_riders \
             FROM premiums p \
             JOIN term_plans t ON p.plan_id = t.plan_id \
             JOIN insurers i ON t.insurer_id = i.insurer_id \
             WHERE {ELIGIBILITY_PREDICATE} \
             ORDER BY p.premium_id"
        );

        let rows = bind_request(sqlx::query(&sql), request).fetch_all(&self.pool).await?;
        debug!(matches = rows.len(), age = request.age, term = request.term, "premium lookup");

        Ok(rows
            .into_iter()
            .map(|row| PremiumRow {
                insurer_name: row.get("insurer_name"),
                plan_name: row.get("plan_name"),
                annual_premium: row.get("annual_premium"),
                free_riders: row.get("free_riders"),
                paid_riders: row.get("paid_riders"),
            })
            .collect())
    }

    /// The ranking engine's input: the same eligibility filter joined with
    /// insurer metrics, in stable `premium_id` order so ranking output is
    /// reproducible.
    pub async fn eligible_candidates(
        &self,
        request: &QuoteRequest,
    ) -> Result<Vec<CandidateRow>, StoreError> {
        let sql = format!(
            "SELECT i.name AS insurer_name, t.plan_name, p.annual_premium, \
                    i.claim_settlement_ratio, i.amount_settlement_ratio, i.complaints_volume, \
                    t.free_riders, t.paid_riders \
             FROM premiums p \
             JOIN term_plans t ON p.plan_id = t.plan_id \
             JOIN insurers i ON t.insurer_id = i.insurer_id \
             WHERE {ELIGIBILITY_PREDICATE} \
             ORDER BY p.premium_id"
        );

        let rows = bind_request(sqlx::query(&sql), request).fetch_all(&self.pool).await?;

        Ok(rows.into_iter().map(candidate_from_row).collect())
    }

    /// Eligibility filter plus the priority-factor ranking, truncated to
    /// `limit` rows with dense ranks from 1.
    pub async fn recommend_plans(
        &self,
        request: &QuoteRequest,
        factors: &[PriorityFactor],
        limit: usize,
    ) -> Result<Vec<RankedRow>, StoreError> {
        let candidates = self.eligible_candidates(request).await?;
        Ok(rank_candidates(candidates, factors, limit))
    }

    pub async fn list_insurer_metrics(&self) -> Result<Vec<InsurerMetrics>, StoreError> {
        let rows = sqlx::query(
            "SELECT name, claim_settlement_ratio, amount_settlement_ratio, complaints_volume \
             FROM insurers ORDER BY insurer_id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(metrics_from_row).collect())
    }

    /// Tiered fuzzy lookup of a single insurer. Misses surface as
    /// `CatalogError::NotFound` carrying the query text.
    pub async fn find_insurer(&self, name: &str) -> Result<InsurerMetrics, StoreError> {
        let entries = self.insurer_names().await?;
        let matched = best_match(name, &entries)
            .ok_or_else(|| CatalogError::not_found(name))?;

        let row = sqlx::query(
            "SELECT name, claim_settlement_ratio, amount_settlement_ratio, complaints_volume \
             FROM insurers WHERE insurer_id = ?",
        )
        .bind(matched.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(metrics_from_row(row))
    }

    /// Tiered fuzzy lookup of a single plan, joined with the owning insurer's
    /// metrics and the external purchase link.
    pub async fn find_plan(&self, name: &str) -> Result<PlanDetail, StoreError> {
        let entries = self.plan_names().await?;
        let matched = best_match(name, &entries)
            .ok_or_else(|| CatalogError::not_found(name))?;

        let row = sqlx::query(
            "SELECT t.plan_name, i.name AS insurer_name, \
                    i.claim_settlement_ratio, i.amount_settlement_ratio, i.complaints_volume, \
                    t.free_riders, t.paid_riders, t.plan_link \
             FROM term_plans t \
             JOIN insurers i ON t.insurer_id = i.insurer_id \
             WHERE t.plan_id = ?",
        )
        .bind(matched.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(PlanDetail {
            plan_name: row.get("plan_name"),
            insurer_name: row.get("insurer_name"),
            claim_settlement_ratio: row.get("claim_settlement_ratio"),
            amount_settlement_ratio: row.get("amount_settlement_ratio"),
            complaints_volume: row.get("complaints_volume"),
            free_riders: row.get("free_riders"),
            paid_riders: row.get("paid_riders"),
            plan_link: row.get("plan_link"),
        })
    }

    async fn insurer_names(&self) -> Result<Vec<NameEntry>, StoreError> {
        let rows = sqlx::query("SELECT insurer_id, name FROM insurers ORDER BY insurer_id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                NameEntry::new(row.get::<i64, _>("insurer_id"), row.get::<String, _>("name"))
            })
            .collect())
    }

    async fn plan_names(&self) -> Result<Vec<NameEntry>, StoreError> {
        let rows = sqlx::query("SELECT plan_id, plan_name FROM term_plans ORDER BY plan_id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                NameEntry::new(row.get::<i64, _>("plan_id"), row.get::<String, _>("plan_name"))
            })
            .collect())
    }
}

fn candidate_from_row(row: SqliteRow) -> CandidateRow {
    CandidateRow {
        insurer_name: row.get("insurer_name"),
        plan_name: row.get("plan_name"),
        annual_premium: row.get("annual_premium"),
        claim_settlement_ratio: row.get("claim_settlement_ratio"),
        amount_settlement_ratio: row.get("amount_settlement_ratio"),
        complaints_volume: row.get("complaints_volume"),
        free_riders: row.get("free_riders"),
        paid_riders: row.get("paid_riders"),
    }
}

fn metrics_from_row(row: SqliteRow) -> InsurerMetrics {
    InsurerMetrics {
        name: row.get("name"),
        claim_settlement_ratio: row.get("claim_settlement_ratio"),
        amount_settlement_ratio: row.get("amount_settlement_ratio"),
        complaints_volume: row.get("complaints_volume"),
    }
}
