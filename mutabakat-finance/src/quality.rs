//! Running-balance consistency, content hashing and in-batch duplicate marking.
//!
//! Nothing here drops a record: problems lower `confidence` and land in the
//! [`QualityReport`].

use std::collections::HashSet;

use mutabakat_core::{BalanceAnomaly, EnrichedTransaction, ParsedRecord, QualityReport, round_cents};
use sha2::{Digest, Sha256};
use tracing::debug;

/// Allowed drift between the stated and the recomputed balance.
pub const BALANCE_TOLERANCE: f64 = 0.01;
/// Confidence multiplier per balance anomaly.
pub const BALANCE_PENALTY: f64 = 0.8;
/// Confidence multiplier per repeated record.
pub const DUPLICATE_PENALTY: f64 = 0.5;
/// Description prefix length that takes part in the hash.
pub const HASH_DESCRIPTION_CHARS: usize = 120;

/// Deterministic SHA-256 fingerprint of a record, lowercase hex.
pub fn content_hash(record: &ParsedRecord) -> String {
    let prefix: String = record
        .description
        .chars()
        .take(HASH_DESCRIPTION_CHARS)
        .collect();
    let key = format!(
        "{}|{:.2}|{:.2}|{}",
        record.iso_date_time(),
        record.amount,
        record.balance,
        prefix
    );

    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Output of [`assess`]: chronologically ordered records plus the report.
#[derive(Debug, Clone, Default)]
pub struct Assessment {
    pub transactions: Vec<EnrichedTransaction>,
    pub report: QualityReport,
}

/// Sort, check the balance chain and mark repeats within this batch.
///
/// The seen-hash set lives only for this call, so separate statements never
/// deduplicate against each other.
pub fn assess(mut transactions: Vec<EnrichedTransaction>) -> Assessment {
    // stable: same-second records keep statement order
    transactions.sort_by_key(|tx| tx.record.date_time);

    let mut report = QualityReport::default();

    for i in 1..transactions.len() {
        let previous = transactions[i - 1].record.balance;
        let tx = &mut transactions[i];
        let expected = previous + tx.credit - tx.debit;
        let actual = tx.record.balance;
        let difference = actual - expected;

        if difference.abs() > BALANCE_TOLERANCE {
            debug!(
                line = tx.record.line_number,
                expected, actual, "balance chain broken"
            );
            report.balance_anomalies.push(BalanceAnomaly {
                line_number: tx.record.line_number,
                expected_balance: round_cents(expected),
                actual_balance: round_cents(actual),
                difference: round_cents(difference),
            });
            tx.confidence *= BALANCE_PENALTY;
            tx.anomalies.push(format!(
                "balance mismatch: expected {expected:.2}, got {actual:.2}"
            ));
        }
    }

    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for tx in &mut transactions {
        if seen.insert(tx.hash.clone()) {
            continue;
        }
        tx.confidence *= DUPLICATE_PENALTY;
        tx.anomalies.push("repeated transaction".to_string());
        if reported.insert(tx.hash.clone()) {
            report.duplicate_hashes.push(tx.hash.clone());
        }
    }

    Assessment {
        transactions,
        report,
    }
}
