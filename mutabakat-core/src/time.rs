//! Time utilities: timezone-aware "today" and date parsing for Turkish formats.

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// Timezone used when none is configured.
pub const DEFAULT_TIMEZONE: &str = "Europe/Istanbul";

/// Current calendar date in an IANA timezone like "Europe/Istanbul".
pub fn today_in(tz: &str) -> Result<NaiveDate> {
    let tz: Tz = tz
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {tz}"))?;
    Ok(Utc::now().with_timezone(&tz).date_naive())
}

/// Parse `dd/mm/yyyy` or `dd.mm.yyyy`.
pub fn parse_tr_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim().replace('.', "/");
    NaiveDate::parse_from_str(&s, "%d/%m/%Y").ok()
}

/// Parse a date followed by `HH:MM` or `HH:MM:SS`, with or without a space
/// between date and time.
pub fn parse_tr_date_time(date: &str, time: &str) -> Option<NaiveDateTime> {
    let date = parse_tr_date(date)?;
    let time = time.trim();
    let time = chrono::NaiveTime::parse_from_str(time, "%H:%M:%S")
        .or_else(|_| chrono::NaiveTime::parse_from_str(time, "%H:%M"))
        .ok()?;
    Some(date.and_time(time))
}
