use std::path::PathBuf;

use crate::catalog::{PremiumRow, QuoteRequest};
use crate::ranking::RankedRow;

/// What a renderer hands back for delivery to the customer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Artifact {
    Text { caption: String, body: String },
    Image { caption: String, path: PathBuf },
}

/// Presentation seam. The core's obligation ends at well-typed rows; anything
/// that draws charts or uploads media implements this trait outside the core.
/// Returning `None` means "nothing worth showing" (e.g. zero rows).
pub trait ResultRenderer: Send + Sync {
    fn render_premiums(&self, request: &QuoteRequest, rows: &[PremiumRow]) -> Option<Artifact>;
    fn render_ranked(&self, request: &QuoteRequest, rows: &[RankedRow]) -> Option<Artifact>;
}

/// Default renderer: an aligned plain-text table, good enough for a chat
/// message without any drawing dependency.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextTableRenderer;

impl TextTableRenderer {
    fn caption(request: &QuoteRequest) -> String {
        format!(
            "Plans for age {} yrs, term {} yrs, coverage Rs. {}, income Rs. {}",
            request.age, request.term, request.coverage_amount, request.income
        )
    }

    fn table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
        let mut widths: Vec<usize> = headers.iter().map(|header| header.len()).collect();
        for row in &rows {
            for (index, cell) in row.iter().enumerate() {
                widths[index] = widths[index].max(cell.len());
            }
        }

        let format_line = |cells: &[String]| {
            cells
                .iter()
                .enumerate()
                .map(|(index, cell)| format!("{:width$}", cell, width = widths[index]))
                .collect::<Vec<_>>()
                .join("  ")
        };

        let header_cells: Vec<String> = headers.iter().map(|header| header.to_string()).collect();
        let mut lines = vec![format_line(&header_cells)];
        lines.push(widths.iter().map(|width| "-".repeat(*width)).collect::<Vec<_>>().join("  "));
        for row in rows {
            lines.push(format_line(&row));
        }
        lines.join("\n")
    }
}

impl ResultRenderer for TextTableRenderer {
    fn render_premiums(&self, request: &QuoteRequest, rows: &[PremiumRow]) -> Option<Artifact> {
        if rows.is_empty() {
            return None;
        }
        let body = Self::table(
            &["Insurer", "Plan", "Annual Premium", "Free Riders", "Paid Riders"],
            rows.iter()
                .map(|row| {
                    vec![
                        row.insurer_name.clone(),
                        row.plan_name.clone(),
                        row.annual_premium.to_string(),
                        row.free_riders.clone(),
                        row.paid_riders.clone(),
                    ]
                })
                .collect(),
        );
        Some(Artifact::Text { caption: Self::caption(request), body })
    }

    fn render_ranked(&self, request: &QuoteRequest, rows: &[RankedRow]) -> Option<Artifact> {
        if rows.is_empty() {
            return None;
        }
        let body = Self::table(
            &["Rank", "Insurer", "Plan", "Annual Premium", "CSR", "ASR", "Complaints"],
            rows.iter()
                .map(|row| {
                    vec![
                        row.rank.to_string(),
                        row.insurer_name.clone(),
                        row.plan_name.clone(),
                        row.annual_premium.to_string(),
                        format!("{:.1}", row.claim_settlement_ratio),
                        format!("{:.1}", row.amount_settlement_ratio),
                        format!("{:.1}", row.complaints_volume),
                    ]
                })
                .collect(),
        );
        Some(Artifact::Text {
            caption: format!("Top recommendations - {}", Self::caption(request)),
            body,
        })
    }
}
