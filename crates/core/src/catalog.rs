use serde::{Deserialize, Serialize};

use crate::errors::CatalogError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InsurerId(pub i64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlanId(pub i64);

/// Reference data about one insurer. The three metrics feed the ranking
/// engine: settlement ratios are percentages where higher is better,
/// complaints volume is a rate where lower is better.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Insurer {
    pub id: InsurerId,
    pub name: String,
    pub claim_settlement_ratio: f64,
    pub amount_settlement_ratio: f64,
    pub complaints_volume: f64,
}

/// A term plan with its global eligibility envelope. Premium bands belonging
/// to the plan are clamped to this envelope at load time, but the envelope is
/// still re-checked at query time in case the loader got it wrong.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TermPlan {
    pub id: PlanId,
    pub insurer_id: InsurerId,
    pub plan_name: String,
    pub min_cover: i64,
    pub max_cover: i64,
    pub min_term: i64,
    pub max_term: i64,
    pub min_age: i64,
    pub max_age: i64,
    pub free_riders: String,
    pub paid_riders: String,
    pub plan_link: String,
}

impl TermPlan {
    /// `[min, max)` containment across all three envelope dimensions.
    pub fn envelope_contains(&self, request: &QuoteRequest) -> bool {
        self.min_age <= request.age
            && request.age < self.max_age
            && self.min_term <= request.term
            && request.term < self.max_term
            && self.min_cover <= request.coverage_amount
            && request.coverage_amount < self.max_cover
    }
}

/// One bucket of the (age x term x coverage) price matrix. Minimums are
/// inclusive, maximums exclusive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumBand {
    pub id: i64,
    pub plan_id: PlanId,
    pub age_min: i64,
    pub age_max: i64,
    pub term_min: i64,
    pub term_max: i64,
    pub coverage_min: i64,
    pub coverage_max: i64,
    pub required_min_income: i64,
    pub annual_premium: i64,
}

impl PremiumBand {
    /// The band-level half of the eligibility predicate. The plan envelope
    /// check is applied separately by the caller.
    pub fn matches(&self, request: &QuoteRequest) -> bool {
        self.age_min <= request.age
            && request.age < self.age_max
            && self.term_min <= request.term
            && request.term < self.term_max
            && self.coverage_min <= request.coverage_amount
            && request.coverage_amount < self.coverage_max
            && self.required_min_income <= request.income
    }
}

/// The customer request tuple every retrieval operation takes. Construct via
/// [`QuoteRequest::new`] so invalid inputs are rejected before any query runs
/// instead of silently matching zero rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub age: i64,
    pub term: i64,
    pub coverage_amount: i64,
    pub income: i64,
}

impl QuoteRequest {
    pub fn new(
        age: i64,
        term: i64,
        coverage_amount: i64,
        income: i64,
    ) -> Result<Self, CatalogError> {
        if age <= 0 {
            return Err(CatalogError::invalid(format!("age must be positive, got {age}")));
        }
        if term <= 0 {
            return Err(CatalogError::invalid(format!("term must be positive, got {term}")));
        }
        if coverage_amount <= 0 {
            return Err(CatalogError::invalid(format!(
                "coverage_amount must be positive, got {coverage_amount}"
            )));
        }
        if income < 0 {
            return Err(CatalogError::invalid(format!(
                "income must be non-negative, got {income}"
            )));
        }
        Ok(Self { age, term, coverage_amount, income })
    }
}

/// Output row of the basic premium lookup, one per matching band.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumRow {
    pub insurer_name: String,
    pub plan_name: String,
    pub annual_premium: i64,
    pub free_riders: String,
    pub paid_riders: String,
}

/// Superset row the ranking engine sorts: the premium lookup joined with the
/// owning insurer's metrics. Fetched in stable `premium_id` order so omitted
/// factors never influence tie-breaks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateRow {
    pub insurer_name: String,
    pub plan_name: String,
    pub annual_premium: i64,
    pub claim_settlement_ratio: f64,
    pub amount_settlement_ratio: f64,
    pub complaints_volume: f64,
    pub free_riders: String,
    pub paid_riders: String,
}

/// Insurer quality metrics as exposed by `list_insurer_metrics` and
/// `find_insurer`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InsurerMetrics {
    pub name: String,
    pub claim_settlement_ratio: f64,
    pub amount_settlement_ratio: f64,
    pub complaints_volume: f64,
}

/// Full plan detail for a name lookup, including the owning insurer's metrics
/// and the external purchase link.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanDetail {
    pub plan_name: String,
    pub insurer_name: String,
    pub claim_settlement_ratio: f64,
    pub amount_settlement_ratio: f64,
    pub complaints_volume: f64,
    pub free_riders: String,
    pub paid_riders: String,
    pub plan_link: String,
}
