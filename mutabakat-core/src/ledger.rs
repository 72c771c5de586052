//! Customer ledger rows consumed by FIFO allocation.
//!
//! Rows are supplied by the persistence layer; the allocator never mutates
//! them and only produces [`Allocation`]s.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Payment method reported when a payment row carries no document type.
pub const DEFAULT_PAYMENT_METHOD: &str = "Nakit";

/// A customer invoice (ledger debit row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    pub date: NaiveDate,
    pub debit: f64,
    pub due_date: Option<NaiveDate>,
    pub customer_id: String,
}

/// A customer payment (ledger credit row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub date: NaiveDate,
    pub credit: f64,
    pub customer_id: String,
    pub document_type: Option<String>,
}

impl Payment {
    pub fn method(&self) -> &str {
        self.document_type
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(DEFAULT_PAYMENT_METHOD)
    }
}

/// Part of one payment applied to one invoice. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    pub invoice_id: String,
    pub payment_id: String,
    pub applied_amount: f64,
    pub payment_date: NaiveDate,
}
