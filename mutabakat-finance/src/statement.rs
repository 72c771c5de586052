//! `parse_statement`: the full statement pipeline from extracted text to
//! enriched, quality-checked transactions.

use std::collections::BTreeMap;
use std::path::Path;

use mutabakat_core::{AccountInfo, Category, EnrichedTransaction, QualityReport, round_cents};
use mutabakat_ingest::{StatementError, parse_statement_text, read_statement_text};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::category_rules::enrich;
use crate::quality::assess;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementSummary {
    pub transaction_count: usize,
    pub rejected_count: usize,
    pub by_category: BTreeMap<Category, usize>,
    pub total_debit: f64,
    pub total_credit: f64,
    /// Records carrying at least one anomaly note
    pub anomaly_count: usize,
    /// 1.0 when at least one transaction was produced, else 0.0
    pub success_rate: f64,
}

impl StatementSummary {
    fn from_parts(transactions: &[EnrichedTransaction], quality: &QualityReport) -> Self {
        let mut by_category = BTreeMap::new();
        let mut total_debit = 0.0;
        let mut total_credit = 0.0;
        for tx in transactions {
            *by_category.entry(tx.category).or_insert(0) += 1;
            total_debit += tx.debit;
            total_credit += tx.credit;
        }

        StatementSummary {
            transaction_count: transactions.len(),
            rejected_count: quality.rejected_rows.len(),
            by_category,
            total_debit: round_cents(total_debit),
            total_credit: round_cents(total_credit),
            anomaly_count: transactions
                .iter()
                .filter(|tx| !tx.anomalies.is_empty())
                .count(),
            success_rate: if transactions.is_empty() { 0.0 } else { 1.0 },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementResult {
    pub transactions: Vec<EnrichedTransaction>,
    pub account_info: AccountInfo,
    pub summary: StatementSummary,
    pub quality: QualityReport,
}

/// Parse extracted statement text end to end.
///
/// Row-level problems never fail the call. They are reported through
/// `quality.rejected_rows`, anomalies and confidence instead.
pub fn parse_statement(text: &str) -> Result<StatementResult, StatementError> {
    let parsed = parse_statement_text(text)?;

    let enriched = parsed.records.into_iter().map(enrich).collect();
    let mut assessment = assess(enriched);
    assessment.report.rejected_rows = parsed.rejected_rows;

    let mut account_info = parsed.account_info;
    if account_info.end_balance.is_none() {
        account_info.end_balance = assessment.transactions.last().map(|tx| tx.record.balance);
    }

    let summary = StatementSummary::from_parts(&assessment.transactions, &assessment.report);
    info!(
        transactions = summary.transaction_count,
        rejected = summary.rejected_count,
        anomalies = summary.anomaly_count,
        duplicates = assessment.report.duplicate_hashes.len(),
        "statement parsed"
    );

    Ok(StatementResult {
        transactions: assessment.transactions,
        account_info,
        summary,
        quality: assessment.report,
    })
}

/// Read extracted text from `path` and run [`parse_statement`].
pub fn parse_statement_file(path: impl AsRef<Path>) -> Result<StatementResult, StatementError> {
    let text = read_statement_text(path)?;
    parse_statement(&text)
}
