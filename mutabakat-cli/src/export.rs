//! CSV export and per-customer FIFO report shapes.

use anyhow::{Context, Result};
use mutabakat_core::{Category, EnrichedTransaction, Subcategory};
use mutabakat_finance::{AgingEntry, AgingSummary, FifoResult, PaidInvoice, PaymentPerformance};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
struct TransactionRow<'a> {
    id: &'a str,
    date_time: String,
    description: &'a str,
    debit: f64,
    credit: f64,
    balance: f64,
    currency: &'a str,
    category: Category,
    subcategory: Subcategory,
    counterparty: &'a str,
    confidence: f64,
}

/// Write statement transactions as CSV, one row per record.
pub fn write_transactions_csv(path: &Path, transactions: &[EnrichedTransaction]) -> Result<()> {
    let mut wtr =
        csv::Writer::from_path(path).with_context(|| format!("create {}", path.display()))?;
    for tx in transactions {
        wtr.serialize(TransactionRow {
            id: tx.id(),
            date_time: tx.record.iso_date_time(),
            description: &tx.record.description,
            debit: tx.debit,
            credit: tx.credit,
            balance: tx.record.balance,
            currency: &tx.record.currency,
            category: tx.category,
            subcategory: tx.subcategory,
            counterparty: tx.counterparty_name.as_deref().unwrap_or(""),
            confidence: tx.confidence,
        })?;
    }
    wtr.flush()
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerReport {
    pub customer_id: String,
    pub open_balance: f64,
    pub unapplied_credit: f64,
    pub paid_invoices: Vec<PaidInvoice>,
    pub payment_performance: Vec<PaymentPerformance>,
    #[serde(flatten)]
    pub allocation: FifoResult,
}

impl CustomerReport {
    pub fn new(customer_id: String, allocation: FifoResult) -> Self {
        Self {
            customer_id,
            open_balance: allocation.open_balance(),
            unapplied_credit: allocation.unapplied_credit(),
            paid_invoices: allocation.paid_invoices(),
            payment_performance: allocation.payment_performance(),
            allocation,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgingReport {
    pub today: chrono::NaiveDate,
    pub entries: Vec<AgingEntry>,
    pub summary: AgingSummary,
}
