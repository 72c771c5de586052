//! FIFO allocation of customer payments to invoices.
//!
//! Invoices are settled oldest first, payments are consumed oldest first, and
//! an exhausted payment is never revisited. Reports built on top (paid
//! invoices, aging, payment performance) depend on reproducing exactly these
//! allocations, so the order here is part of the contract.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use mutabakat_core::{Allocation, DEFAULT_PAYMENT_METHOD, Invoice, Payment, round_cents};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// An invoice after allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceState {
    pub invoice: Invoice,
    pub remaining: f64,
    /// Allocations applied to this invoice, in application order
    pub allocations: Vec<Allocation>,
}

impl InvoiceState {
    pub fn is_paid(&self) -> bool {
        self.remaining <= 0.0 && !self.allocations.is_empty()
    }
}

/// A payment after allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentState {
    pub payment: Payment,
    pub remaining_credit: f64,
    /// Invoice IDs this payment was applied to, in order
    pub applied_to: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FifoResult {
    pub allocations: Vec<Allocation>,
    /// Invoices in allocation (date) order
    pub invoices: Vec<InvoiceState>,
    /// Payments in consumption (date) order
    pub payments: Vec<PaymentState>,
}

/// Allocate one customer's payments to their invoices.
///
/// Both inputs are sorted by date here; ties keep input order.
/// Payments with no positive credit are listed but never applied.
pub fn allocate(invoices: &[Invoice], payments: &[Payment]) -> FifoResult {
    let mut invoices: Vec<InvoiceState> = invoices
        .iter()
        .map(|inv| InvoiceState {
            remaining: round_cents(inv.debit),
            invoice: inv.clone(),
            allocations: Vec::new(),
        })
        .collect();
    invoices.sort_by_key(|s| s.invoice.date);

    let mut payments: Vec<PaymentState> = payments
        .iter()
        .map(|p| PaymentState {
            remaining_credit: round_cents(p.credit),
            payment: p.clone(),
            applied_to: Vec::new(),
        })
        .collect();
    payments.sort_by_key(|s| s.payment.date);

    let mut allocations = Vec::new();
    // front of the payment queue; everything before it is exhausted
    let mut cursor = 0;

    for inv in &mut invoices {
        while inv.remaining > 0.0 && cursor < payments.len() {
            let pay = &mut payments[cursor];
            if pay.remaining_credit <= 0.0 {
                cursor += 1;
                continue;
            }

            let applied = inv.remaining.min(pay.remaining_credit);
            inv.remaining = round_cents(inv.remaining - applied);
            pay.remaining_credit = round_cents(pay.remaining_credit - applied);
            pay.applied_to.push(inv.invoice.id.clone());

            let allocation = Allocation {
                invoice_id: inv.invoice.id.clone(),
                payment_id: pay.payment.id.clone(),
                applied_amount: applied,
                payment_date: pay.payment.date,
            };
            inv.allocations.push(allocation.clone());
            allocations.push(allocation);

            if pay.remaining_credit <= 0.0 {
                cursor += 1;
            }
        }
    }

    debug!(
        invoices = invoices.len(),
        payments = payments.len(),
        allocations = allocations.len(),
        "fifo allocation finished"
    );

    FifoResult {
        allocations,
        invoices,
        payments,
    }
}

/// Split mixed ledger rows by customer and allocate each independently.
pub fn allocate_customers(
    invoices: &[Invoice],
    payments: &[Payment],
) -> BTreeMap<String, FifoResult> {
    let mut grouped: BTreeMap<String, (Vec<Invoice>, Vec<Payment>)> = BTreeMap::new();
    for inv in invoices {
        grouped
            .entry(inv.customer_id.clone())
            .or_default()
            .0
            .push(inv.clone());
    }
    for pay in payments {
        grouped
            .entry(pay.customer_id.clone())
            .or_default()
            .1
            .push(pay.clone());
    }

    grouped
        .into_iter()
        .map(|(customer, (invs, pays))| (customer, allocate(&invs, &pays)))
        .collect()
}

/// A fully settled invoice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaidInvoice {
    pub invoice_id: String,
    pub customer_id: String,
    pub date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub debit: f64,
    pub total_paid: f64,
    pub last_payment_date: NaiveDate,
    pub payment_method: String,
}

impl FifoResult {
    fn payment(&self, id: &str) -> Option<&Payment> {
        self.payments
            .iter()
            .map(|s| &s.payment)
            .find(|p| p.id == id)
    }

    /// Invoices whose remaining amount reached zero. Partially paid invoices
    /// are left out entirely.
    pub fn paid_invoices(&self) -> Vec<PaidInvoice> {
        self.invoices
            .iter()
            .filter(|s| s.is_paid())
            .filter_map(|s| {
                let first = s.allocations.first()?;
                let last = s.allocations.last()?;
                let payment_method = self
                    .payment(&first.payment_id)
                    .map(|p| p.method().to_string())
                    .unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string());

                Some(PaidInvoice {
                    invoice_id: s.invoice.id.clone(),
                    customer_id: s.invoice.customer_id.clone(),
                    date: s.invoice.date,
                    due_date: s.invoice.due_date,
                    debit: s.invoice.debit,
                    total_paid: round_cents(s.invoice.debit - s.remaining),
                    last_payment_date: last.payment_date,
                    payment_method,
                })
            })
            .collect()
    }

    /// Payment timing of every fully paid invoice.
    pub fn payment_performance(&self) -> Vec<PaymentPerformance> {
        self.paid_invoices()
            .into_iter()
            .map(|paid| {
                let days_late = paid
                    .due_date
                    .map(|due| (paid.last_payment_date - due).num_days().max(0))
                    .unwrap_or(0);
                PaymentPerformance {
                    days_to_pay: (paid.last_payment_date - paid.date).num_days(),
                    paid_late: days_late > 0,
                    days_late,
                    due_date: paid.due_date,
                    invoice_id: paid.invoice_id,
                }
            })
            .collect()
    }

    /// Sum of unsettled invoice amounts.
    pub fn open_balance(&self) -> f64 {
        round_cents(self.invoices.iter().map(|s| s.remaining.max(0.0)).sum())
    }

    /// Credit not yet applied to any invoice.
    pub fn unapplied_credit(&self) -> f64 {
        round_cents(self.payments.iter().map(|s| s.remaining_credit.max(0.0)).sum())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPerformance {
    pub invoice_id: String,
    /// Days from the invoice date to its last allocation
    pub days_to_pay: i64,
    pub due_date: Option<NaiveDate>,
    pub paid_late: bool,
    pub days_late: i64,
}
