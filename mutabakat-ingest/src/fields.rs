//! Amount and running-balance extraction from one joined record.
//!
//! Two strategies, tried in order:
//! 1. currency-tagged: `<amount> TL|TRY|USD|EUR|GBP`
//! 2. bare numeric: the amount pattern alone, currency assumed `TL`
//!
//! Either way the last value is the balance after the transaction and the
//! one before it is the transaction amount.

use chrono::NaiveDateTime;
use mutabakat_core::{parse_amount, time::parse_tr_date_time};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::clean::rejoin_hyphenated;
use crate::types::RecordGroup;

const DEFAULT_CURRENCY: &str = "TL";

static LEADING_DATE_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<date>\d{2}/\d{2}/\d{4})\s*(?P<time>\d{2}:\d{2}:\d{2})")
        .expect("invalid date time regex")
});

static CURRENCY_AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?:^|[^\d.,])",
        r"(?P<amount>-?(?:\d{1,3}(?:[.\s]\d{3})+|\d+)(?:,\d{1,2})?)",
        r"\s*(?P<currency>TL|TRY|USD|EUR|GBP)\b"
    ))
    .expect("invalid currency amount regex")
});

static BARE_AMOUNT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?:^|[^\d.,])",
        r"(?P<amount>-?(?:\d{1,3}(?:[.\s]\d{3})+|\d+)(?:,\d{1,2})?)"
    ))
    .expect("invalid bare amount regex")
});

/// Fields pulled out of one record, description still raw.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedFields {
    pub date_time: NaiveDateTime,
    /// Text between the timestamp and the transaction amount
    pub head: String,
    pub amount: f64,
    pub currency: String,
    pub balance: f64,
    pub balance_currency: String,
    pub raw: String,
}

/// Why a record could not be turned into fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    BadTimestamp,
    TooFewAmounts,
    ZeroAmount,
}

struct Token<'t> {
    start: usize,
    amount: &'t str,
    currency: &'t str,
}

fn token<'t>(caps: &Captures<'t>, default_currency: &'t str) -> Option<Token<'t>> {
    let amount = caps.name("amount")?;
    Some(Token {
        start: amount.start(),
        amount: amount.as_str(),
        currency: caps
            .name("currency")
            .map(|m| m.as_str())
            .unwrap_or(default_currency),
    })
}

fn scan<'t>(re: &Regex, text: &'t str) -> Vec<Token<'t>> {
    re.captures_iter(text)
        .filter_map(|caps| token(&caps, DEFAULT_CURRENCY))
        .collect()
}

/// Extract timestamp, amount and balance from a record group.
pub fn extract(group: &RecordGroup) -> Result<ExtractedFields, RejectReason> {
    let raw = rejoin_hyphenated(&group.joined());

    let caps = LEADING_DATE_TIME
        .captures(&raw)
        .ok_or(RejectReason::BadTimestamp)?;
    let date_time = parse_tr_date_time(&caps["date"], &caps["time"]).ok_or(RejectReason::BadTimestamp)?;
    let body_start = caps.get(0).map(|m| m.end()).unwrap_or(0);
    let body = &raw[body_start..];

    let mut tokens = scan(&CURRENCY_AMOUNT, body);
    if tokens.len() < 2 {
        tokens = scan(&BARE_AMOUNT, body);
    }
    if tokens.len() < 2 {
        return Err(RejectReason::TooFewAmounts);
    }

    let balance_tok = &tokens[tokens.len() - 1];
    let amount_tok = &tokens[tokens.len() - 2];

    let amount = parse_amount(amount_tok.amount);
    if amount == 0.0 {
        return Err(RejectReason::ZeroAmount);
    }

    Ok(ExtractedFields {
        date_time,
        head: body[..amount_tok.start].trim().to_string(),
        amount,
        currency: amount_tok.currency.to_string(),
        balance: parse_amount(balance_tok.amount),
        balance_currency: balance_tok.currency.to_string(),
        raw,
    })
}
