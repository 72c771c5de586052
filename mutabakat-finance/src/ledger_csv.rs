//! Read customer ledger exports into invoice and payment rows.
//!
//! Expected header:
//! customer_id,kind,id,date,amount,due_date,document_type
//!
//! `kind` is `invoice`/`fatura` or `payment`/`tahsilat`. Dates are ISO
//! (`2024-03-12`) or Turkish (`12.03.2024`). Amounts may be plain (`1250.50`)
//! or Turkish formatted (`1.250,50`, `1.250`). A dot followed by exactly
//! three-digit groups is read as thousands grouping.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use mutabakat_core::{Invoice, Payment, parse_amount, time::parse_tr_date};
use std::path::Path;
use tracing::warn;

/// Ledger rows of any number of customers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    pub invoices: Vec<Invoice>,
    pub payments: Vec<Payment>,
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_tr_date(s))
}

/// `1.250` and `12.500.000` are dot-grouped Turkish integers, not decimals.
fn is_dot_grouped(s: &str) -> bool {
    let mut groups = s.trim_start_matches('-').split('.');
    let head_ok = groups
        .next()
        .is_some_and(|g| (1..=3).contains(&g.len()) && g.bytes().all(|b| b.is_ascii_digit()));
    let mut tail = groups.peekable();
    head_ok && tail.peek().is_some() && tail.all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit()))
}

/// A comma or dot grouping means Turkish format; anything else is a plain
/// decimal.
fn parse_ledger_amount(s: &str) -> f64 {
    let s = s.trim();
    if s.contains(',') || is_dot_grouped(s) {
        return parse_amount(s);
    }
    s.parse::<f64>().unwrap_or_else(|_| parse_amount(s))
}

fn non_empty(s: Option<&str>) -> Option<String> {
    s.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse a ledger CSV. Rows with an unknown kind or bad date are skipped.
pub fn parse_ledger_csv(path: impl AsRef<Path>) -> Result<Ledger> {
    let path = path.as_ref();
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let mut ledger = Ledger::default();

    for (idx, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("reading {} row {}", path.display(), idx + 2))?;
        let field = |i: usize| record.get(i).unwrap_or("");

        let customer_id = field(0).to_string();
        let kind = field(1).to_lowercase();
        let id = field(2).to_string();
        let Some(date) = parse_date(field(3)) else {
            warn!(row = idx + 2, value = field(3), "skipping ledger row with bad date");
            continue;
        };
        let amount = parse_ledger_amount(field(4));

        match kind.as_str() {
            "invoice" | "fatura" => ledger.invoices.push(Invoice {
                id,
                date,
                debit: amount,
                due_date: parse_date(field(5)),
                customer_id,
            }),
            "payment" | "tahsilat" => ledger.payments.push(Payment {
                id,
                date,
                credit: amount,
                customer_id,
                document_type: non_empty(record.get(6)),
            }),
            other => warn!(row = idx + 2, kind = other, "skipping ledger row of unknown kind"),
        }
    }

    Ok(ledger)
}
