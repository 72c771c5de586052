//! Aging buckets over invoices that still carry a balance after FIFO.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use mutabakat_core::round_cents;
use serde::{Deserialize, Serialize};

use crate::fifo::FifoResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgingBucket {
    #[serde(rename = "current")]
    Current,
    #[serde(rename = "30")]
    Days30,
    #[serde(rename = "60")]
    Days60,
    #[serde(rename = "90")]
    Days90,
    #[serde(rename = "90+")]
    Days90Plus,
}

impl AgingBucket {
    /// Bucket for a number of days past due; zero or negative is current.
    pub fn for_days(overdue_days: i64) -> Self {
        match overdue_days {
            d if d <= 0 => AgingBucket::Current,
            d if d <= 30 => AgingBucket::Days30,
            d if d <= 60 => AgingBucket::Days60,
            d if d <= 90 => AgingBucket::Days90,
            _ => AgingBucket::Days90Plus,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgingBucket::Current => "current",
            AgingBucket::Days30 => "30",
            AgingBucket::Days60 => "60",
            AgingBucket::Days90 => "90",
            AgingBucket::Days90Plus => "90+",
        }
    }
}

impl fmt::Display for AgingBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgingEntry {
    pub invoice_id: String,
    pub customer_id: String,
    pub due_date: Option<NaiveDate>,
    pub remaining: f64,
    pub overdue: bool,
    pub overdue_days: i64,
    pub bucket: AgingBucket,
}

/// Age every invoice with a positive remaining amount as of `today`.
///
/// An invoice without a due date is never overdue.
pub fn age_open_invoices(result: &FifoResult, today: NaiveDate) -> Vec<AgingEntry> {
    result
        .invoices
        .iter()
        .filter(|s| s.remaining > 0.0)
        .map(|s| {
            let overdue_days = s
                .invoice
                .due_date
                .map(|due| (today - due).num_days())
                .unwrap_or(0);
            AgingEntry {
                invoice_id: s.invoice.id.clone(),
                customer_id: s.invoice.customer_id.clone(),
                due_date: s.invoice.due_date,
                remaining: s.remaining,
                overdue: s.invoice.due_date.is_some_and(|due| due < today),
                overdue_days,
                bucket: AgingBucket::for_days(overdue_days),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketTotal {
    pub count: usize,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgingSummary {
    pub buckets: BTreeMap<AgingBucket, BucketTotal>,
    pub total_open: f64,
    pub overdue_count: usize,
}

pub fn summarize_aging(entries: &[AgingEntry]) -> AgingSummary {
    let mut summary = AgingSummary::default();
    for entry in entries {
        let total = summary.buckets.entry(entry.bucket).or_default();
        total.count += 1;
        total.amount = round_cents(total.amount + entry.remaining);
        summary.total_open += entry.remaining;
        if entry.overdue {
            summary.overdue_count += 1;
        }
    }
    summary.total_open = round_cents(summary.total_open);
    summary
}
