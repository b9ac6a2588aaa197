//! Deterministic demo catalog, ported from the original mock-data generator
//! with the randomized premium factor removed so repeated seeds are
//! byte-identical. Four insurers, two plans each, and a premium-band matrix
//! clamped to each plan's envelope; bands that fall entirely outside the
//! envelope are dropped, so the bucket space is sparse by construction.

use tracing::info;

use crate::{DbPool, StoreError};

struct InsurerSeed {
    id: i64,
    name: &'static str,
    claim_settlement_ratio: f64,
    amount_settlement_ratio: f64,
    complaints_volume: f64,
}

struct PlanTemplate {
    min_cover: i64,
    max_cover: i64,
    min_term: i64,
    max_term: i64,
    min_age: i64,
    max_age: i64,
    free_riders: &'static str,
    paid_riders: &'static str,
}

const INSURERS: &[InsurerSeed] = &[
    InsurerSeed {
        id: 1,
        name: "Axis Max Life",
        claim_settlement_ratio: 99.5,
        amount_settlement_ratio: 95.5,
        complaints_volume: 7.3,
    },
    InsurerSeed {
        id: 2,
        name: "Bajaj Allianz Life",
        claim_settlement_ratio: 99.1,
        amount_settlement_ratio: 93.0,
        complaints_volume: 4.4,
    },
    InsurerSeed {
        id: 3,
        name: "ICICI Prudential",
        claim_settlement_ratio: 97.5,
        amount_settlement_ratio: 92.1,
        complaints_volume: 14.3,
    },
    InsurerSeed {
        id: 4,
        name: "HDFC Life",
        claim_settlement_ratio: 99.2,
        amount_settlement_ratio: 87.3,
        complaints_volume: 2.0,
    },
];

const PLAN_NAMES: &[(&str, &[(&str, &str)])] = &[
    ("Axis Max Life", &[
        ("Smart Secure Plus", "https://www.axismaxlife.com/smartsecureplus"),
        ("Online Term Plan Plus", "https://www.axismaxlife.com/onlinetermplanplus"),
    ]),
    ("Bajaj Allianz Life", &[
        ("Smart Protect Goal", "https://www.bajajallianz.com/term-insurance/smart-protect-goal"),
        ("Life Guard", "https://www.bajajallianz.com/term-insurance/life-guard"),
    ]),
    ("ICICI Prudential", &[
        ("iProtect Smart", "https://www.icicipru.com/insurance/term-insurance/iProtect-Smart"),
        ("iProtect Super", "https://www.icicipru.com/insurance/term-insurance/iProtect-Super"),
    ]),
    ("HDFC Life", &[
        ("Click 2 Protect Life", "https://www.hdfclife.com/click2protectlife"),
        ("HDFC Life Sanchay Plus", "https://www.hdfclife.com/hdfclifesanchayplus"),
    ]),
];

// Two alternating envelope templates, as in the source data.
const PLAN_TEMPLATES: &[PlanTemplate] = &[
    PlanTemplate {
        min_cover: 500_000,
        max_cover: 150_000_000,
        min_term: 5,
        max_term: 50,
        min_age: 18,
        max_age: 70,
        free_riders: "",
        paid_riders: "Critical Illness, Accidental Death",
    },
    PlanTemplate {
        min_cover: 1_000_000,
        max_cover: 120_000_000,
        min_term: 5,
        max_term: 55,
        min_age: 20,
        max_age: 75,
        free_riders: "Critical Illness",
        paid_riders: "Accidental Death",
    },
];

const COVERAGE_BANDS: &[(i64, i64)] = &[
    (0, 1_000_000),
    (1_000_000, 2_000_000),
    (2_000_000, 3_000_000),
    (3_000_000, 4_000_000),
    (4_000_000, 5_000_000),
    (5_000_000, 7_500_000),
    (7_500_000, 10_000_000),
    (10_000_000, 15_000_000),
    (15_000_000, 20_000_000),
    (20_000_000, 30_000_000),
];

const TERM_BANDS: &[(i64, i64)] =
    &[(1, 4), (4, 7), (7, 10), (10, 13), (13, 16), (16, 19), (19, 25), (25, 31), (31, 41)];

fn age_bands() -> impl Iterator<Item = (i64, i64)> {
    (20..70).step_by(5).map(|age| (age, age + 5))
}

fn required_min_income(coverage_max: i64) -> i64 {
    coverage_max / 20
}

fn annual_premium(age_min: i64, term_max: i64, coverage_max: i64) -> i64 {
    coverage_max / 2_000 + age_min * 50 + term_max * 40
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub insurers: usize,
    pub plans: usize,
    pub premium_bands: usize,
}

/// Loads the deterministic demo catalog. Idempotent via a wipe-and-reload:
/// existing catalog rows are deleted first.
pub struct SeedCatalog;

impl SeedCatalog {
    pub async fn load(pool: &DbPool) -> Result<SeedSummary, StoreError> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM premiums").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM term_plans").execute(&mut *tx).await?;
        sqlx::query("DELETE FROM insurers").execute(&mut *tx).await?;

        let mut summary = SeedSummary::default();

        for insurer in INSURERS {
            sqlx::query(
                "INSERT INTO insurers (insurer_id, name, claim_settlement_ratio, \
                 amount_settlement_ratio, complaints_volume) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(insurer.id)
            .bind(insurer.name)
            .bind(insurer.claim_settlement_ratio)
            .bind(insurer.amount_settlement_ratio)
            .bind(insurer.complaints_volume)
            .execute(&mut *tx)
            .await?;
            summary.insurers += 1;
        }

        let mut plan_id: i64 = 0;
        let mut premium_id: i64 = 0;

        for insurer in INSURERS {
            let plans = PLAN_NAMES
                .iter()
                .find(|(name, _)| *name == insurer.name)
                .map(|(_, plans)| *plans)
                .unwrap_or_default();

            for (index, (plan_name, plan_link)) in plans.iter().enumerate() {
                plan_id += 1;
                let template = &PLAN_TEMPLATES[index % PLAN_TEMPLATES.len()];

                sqlx::query(
                    "INSERT INTO term_plans (plan_id, insurer_id, plan_name, min_cover, \
                     max_cover, min_term, max_term, min_age, max_age, free_riders, \
                     paid_riders, plan_link) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(plan_id)
                .bind(insurer.id)
                .bind(plan_name)
                .bind(template.min_cover)
                .bind(template.max_cover)
                .bind(template.min_term)
                .bind(template.max_term)
                .bind(template.min_age)
                .bind(template.max_age)
                .bind(template.free_riders)
                .bind(template.paid_riders)
                .bind(plan_link)
                .execute(&mut *tx)
                .await?;
                summary.plans += 1;

                for (cov_min, cov_max) in COVERAGE_BANDS {
                    // Drop bands with no overlap; clamp the rest into the
                    // plan envelope so no band is ever wider than its plan.
                    if *cov_min >= template.max_cover || *cov_max <= template.min_cover {
                        continue;
                    }
                    let cov_min = (*cov_min).max(template.min_cover);
                    let cov_max = (*cov_max).min(template.max_cover);

                    for (age_min, age_max) in age_bands() {
                        if age_min >= template.max_age || age_max <= template.min_age {
                            continue;
                        }
                        let age_min = age_min.max(template.min_age);
                        let age_max = age_max.min(template.max_age);

                        for (term_min, term_max) in TERM_BANDS {
                            if *term_min >= template.max_term || *term_max <= template.min_term {
                                continue;
                            }
                            let term_min = (*term_min).max(template.min_term);
                            let term_max = (*term_max).min(template.max_term);

                            premium_id += 1;
                            sqlx::query(
                                "INSERT INTO premiums (premium_id, plan_id, age_min, age_max, \
                                 term_min, term_max, coverage_min, coverage_max, \
                                 required_min_income, annual_premium) \
                                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                            )
                            .bind(premium_id)
                            .bind(plan_id)
                            .bind(age_min)
                            .bind(age_max)
                            .bind(term_min)
                            .bind(term_max)
                            .bind(cov_min)
                            .bind(cov_max)
                            .bind(required_min_income(cov_max))
                            .bind(annual_premium(age_min, term_max, cov_max))
                            .execute(&mut *tx)
                            .await?;
                            summary.premium_bands += 1;
                        }
                    }
                }
            }
        }

        tx.commit().await?;
        info!(
            insurers = summary.insurers,
            plans = summary.plans,
            premium_bands = summary.premium_bands,
            "seeded demo catalog"
        );
        Ok(summary)
    }
}
