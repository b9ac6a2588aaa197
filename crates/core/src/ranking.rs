use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::catalog::CandidateRow;

/// A named ranking criterion, supplied by the caller in priority order.
///
/// Replaces the source system's ORDER-BY-by-string-concatenation with a fixed
/// factor-to-comparator mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityFactor {
    Premium,
    Csr,
    Asr,
    Complaints,
}

impl PriorityFactor {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "premium" => Some(Self::Premium),
            "csr" => Some(Self::Csr),
            "asr" => Some(Self::Asr),
            "complaints" => Some(Self::Complaints),
            _ => None,
        }
    }

    fn compare(self, a: &CandidateRow, b: &CandidateRow) -> Ordering {
        match self {
            Self::Premium => a.annual_premium.cmp(&b.annual_premium),
            Self::Csr => b.claim_settlement_ratio.total_cmp(&a.claim_settlement_ratio),
            Self::Asr => b.amount_settlement_ratio.total_cmp(&a.amount_settlement_ratio),
            Self::Complaints => a.complaints_volume.total_cmp(&b.complaints_volume),
        }
    }
}

/// Parses caller-supplied factor names. Unknown names are dropped and
/// duplicates keep their first position; both are tolerated, not errors.
pub fn parse_factors<S: AsRef<str>>(raw: &[S]) -> Vec<PriorityFactor> {
    let mut factors = Vec::new();
    for name in raw {
        if let Some(factor) = PriorityFactor::parse(name.as_ref()) {
            if !factors.contains(&factor) {
                factors.push(factor);
            }
        }
    }
    factors
}

/// A candidate row with its dense rank after sorting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedRow {
    pub rank: u32,
    pub insurer_name: String,
    pub plan_name: String,
    pub annual_premium: i64,
    pub claim_settlement_ratio: f64,
    pub amount_settlement_ratio: f64,
    pub complaints_volume: f64,
    pub free_riders: String,
    pub paid_riders: String,
}

/// Sorts candidates by the factor chain evaluated left to right as a
/// lexicographic tie-break, assigns dense ranks starting at 1, and truncates
/// to `limit` rows.
///
/// The sort is stable, so rows tied on every supplied factor keep the
/// insertion order of `candidates`; factors the caller omitted never act as
/// tie-breakers.
pub fn rank_candidates(
    mut candidates: Vec<CandidateRow>,
    factors: &[PriorityFactor],
    limit: usize,
) -> Vec<RankedRow> {
    candidates.sort_by(|a, b| {
        factors
            .iter()
            .fold(Ordering::Equal, |ordering, factor| ordering.then_with(|| factor.compare(a, b)))
    });

    candidates
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(index, row)| RankedRow {
            rank: index as u32 + 1,
            insurer_name: row.insurer_name,
            plan_name: row.plan_name,
            annual_premium: row.annual_premium,
            claim_settlement_ratio: row.claim_settlement_ratio,
            amount_settlement_ratio: row.amount_settlement_ratio,
            complaints_volume: row.complaints_volume,
            free_riders: row.free_riders,
            paid_riders: row.paid_riders,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(
        insurer: &str,
        plan: &str,
        premium: i64,
        csr: f64,
        asr: f64,
        complaints: f64,
    ) -> CandidateRow {
        CandidateRow {
            insurer_name: insurer.to_string(),
            plan_name: plan.to_string(),
            annual_premium: premium,
            claim_settlement_ratio: csr,
            amount_settlement_ratio: asr,
            complaints_volume: complaints,
            free_riders: String::new(),
            paid_riders: String::new(),
        }
    }

    fn sample() -> Vec<CandidateRow> {
        vec![
            candidate("Axis Max Life", "Smart Secure Plus", 25_000, 99.5, 95.5, 7.3),
            candidate("HDFC Life", "Click 2 Protect Life", 22_000, 99.2, 87.3, 2.0),
            candidate("ICICI Prudential", "iProtect Smart", 19_000, 97.5, 92.1, 14.3),
        ]
    }

    #[test]
    fn parse_drops_unknown_and_duplicate_factors() {
        let raw = ["premium", "bogus", "csr", "premium", " CSR "];
        assert_eq!(
            parse_factors(&raw),
            vec![PriorityFactor::Premium, PriorityFactor::Csr]
        );
    }

    #[test]
    fn premium_factor_sorts_ascending() {
        let ranked = rank_candidates(sample(), &[PriorityFactor::Premium], 10);
        let premiums: Vec<i64> = ranked.iter().map(|row| row.annual_premium).collect();
        assert_eq!(premiums, vec![19_000, 22_000, 25_000]);
        assert!(premiums.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn csr_factor_sorts_descending() {
        let ranked = rank_candidates(sample(), &[PriorityFactor::Csr], 10);
        let ratios: Vec<f64> = ranked.iter().map(|row| row.claim_settlement_ratio).collect();
        assert!(ratios.windows(2).all(|pair| pair[0] >= pair[1]));
        assert_eq!(ranked[0].insurer_name, "Axis Max Life");
    }

    #[test]
    fn ranks_are_dense_from_one_and_output_is_truncated() {
        let ranked = rank_candidates(sample(), &[PriorityFactor::Premium], 2);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[1].rank, 2);
    }

    #[test]
    fn tied_first_factor_falls_through_to_second() {
        let rows = vec![
            candidate("A", "plan-a", 30_000, 99.0, 90.0, 5.0),
            candidate("B", "plan-b", 20_000, 99.0, 90.0, 5.0),
            candidate("C", "plan-c", 25_000, 99.0, 90.0, 5.0),
        ];
        let ranked = rank_candidates(
            rows,
            &[PriorityFactor::Complaints, PriorityFactor::Premium],
            10,
        );
        let order: Vec<&str> = ranked.iter().map(|row| row.plan_name.as_str()).collect();
        assert_eq!(order, vec!["plan-b", "plan-c", "plan-a"]);
    }

    #[test]
    fn omitted_factors_do_not_break_ties() {
        // Premiums tied; csr differs but was not requested, so insertion
        // order must survive the stable sort.
        let rows = vec![
            candidate("A", "first", 20_000, 90.0, 90.0, 5.0),
            candidate("B", "second", 20_000, 99.0, 90.0, 5.0),
        ];
        let ranked = rank_candidates(rows, &[PriorityFactor::Premium], 10);
        assert_eq!(ranked[0].plan_name, "first");
        assert_eq!(ranked[1].plan_name, "second");
    }

    #[test]
    fn empty_candidate_set_ranks_to_empty_output() {
        assert!(rank_candidates(Vec::new(), &[PriorityFactor::Premium], 2).is_empty());
    }
}
