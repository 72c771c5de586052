//! Timestamp-row statement parser.
//!
//! Expected text rows after PDF-to-text (cells merged, rows may wrap):
//!   TarihAçıklamaTutarBakiye
//!   12/03/2024 14:22:01 Internet - Mobil GİDEN FAST - AHMET YILMAZ
//!   Kira -1.250,00 TL 3.750,50 TL

use mutabakat_core::ParsedRecord;
use tracing::debug;

use crate::clean::clean_lines;
use crate::description::normalize;
use crate::fields::extract;
use crate::segment::segment;

/// Records plus the raw text of rows that could not be parsed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowParse {
    pub records: Vec<ParsedRecord>,
    pub rejected: Vec<String>,
}

/// Parse extracted statement text into records, in statement order.
pub fn parse_timestamped_text(text: &str) -> RowParse {
    let lines = clean_lines(text);
    let mut out = RowParse::default();

    for group in segment(&lines) {
        match extract(&group) {
            Ok(fields) => out.records.push(ParsedRecord {
                line_number: group.start_line,
                date_time: fields.date_time,
                description: normalize(&fields.head),
                amount: fields.amount,
                currency: fields.currency,
                balance: fields.balance,
                balance_currency: fields.balance_currency,
                raw: fields.raw,
            }),
            Err(reason) => {
                debug!(line = group.start_line, ?reason, "row rejected");
                out.rejected.push(group.joined());
            }
        }
    }

    out
}
