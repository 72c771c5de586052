//! Statement header fields: holder, IBAN, period and closing balance.
//!
//! Values may sit on the same line as their label or on the next one.

use mutabakat_core::{AccountInfo, parse_amount, time::parse_tr_date};
use once_cell::sync::Lazy;
use regex::Regex;

static HOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Müşteri Adı:\s*(?P<v>[^\n]+)").expect("invalid holder regex"));

static IBAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"IBAN/Hesap No:\s*(?P<v>TR\d{2}(?:[ \t]?\d{4}){5}[ \t]?\d{2})")
        .expect("invalid iban regex")
});

static PERIOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"Tarih Aralığı:\s*(?P<start>\d{2}[./]\d{2}[./]\d{4})\s*-\s*(?P<end>\d{2}[./]\d{2}[./]\d{4})",
    )
    .expect("invalid period regex")
});

static END_BALANCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Kullanılabilir Bakiye:\s*(?P<v>-?\d[\d. ]*(?:,\d{1,2})?)")
        .expect("invalid balance regex")
});

/// Read account details from the raw statement text.
pub fn extract_account_info(text: &str) -> AccountInfo {
    let mut info = AccountInfo::default();

    if let Some(caps) = HOLDER.captures(text) {
        let holder = caps["v"].trim();
        if !holder.is_empty() {
            info.account_holder = Some(holder.to_string());
        }
    }

    if let Some(caps) = IBAN.captures(text) {
        info.iban = Some(caps["v"].chars().filter(|c| !c.is_whitespace()).collect());
    }

    if let Some(caps) = PERIOD.captures(text) {
        info.start_date = parse_tr_date(&caps["start"]);
        info.end_date = parse_tr_date(&caps["end"]);
    }

    if let Some(caps) = END_BALANCE.captures(text) {
        info.end_balance = Some(parse_amount(&caps["v"]));
    }

    info
}
