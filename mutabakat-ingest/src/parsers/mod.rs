//! Statement layouts and the text-stage entry point.

pub mod timestamped;

use std::fs;
use std::path::Path;

use tracing::{debug, warn};

use crate::account::extract_account_info;
use crate::error::StatementError;
use crate::types::{ParsedStatement, StatementLayout};

/// Marker strings that identify the timestamp-row layout.
const TIMESTAMPED_MARKERS: &[&str] = &[
    "Hesap Hareketleri",
    "TarihAçıklamaTutarBakiye",
    "Tarih Açıklama Tutar Bakiye",
];

impl StatementLayout {
    pub fn detect(text: &str) -> Self {
        if TIMESTAMPED_MARKERS.iter().any(|m| text.contains(m)) {
            StatementLayout::TimestampedRows
        } else {
            StatementLayout::Unknown
        }
    }
}

/// Read extracted statement text from disk.
pub fn read_statement_text(path: impl AsRef<Path>) -> Result<String, StatementError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| StatementError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    if bytes.starts_with(b"%PDF-") {
        return Err(StatementError::Parse(format!(
            "{} is a raw PDF; pass the extracted text instead",
            path.display()
        )));
    }
    String::from_utf8(bytes).map_err(|e| StatementError::Parse(format!("{}: {e}", path.display())))
}

/// Run the text stage: layout detection, account info, cleaned rows.
pub fn parse_statement_text(text: &str) -> Result<ParsedStatement, StatementError> {
    if text.trim().is_empty() {
        return Err(StatementError::Empty);
    }
    if text.contains('\0') {
        return Err(StatementError::Parse("statement text contains NUL bytes".to_string()));
    }

    let layout = StatementLayout::detect(text);
    if layout == StatementLayout::Unknown {
        warn!("no known statement marker found; parsing as timestamped rows");
    }

    let rows = timestamped::parse_timestamped_text(text);
    debug!(
        records = rows.records.len(),
        rejected = rows.rejected.len(),
        "statement text parsed"
    );

    Ok(ParsedStatement {
        layout,
        account_info: extract_account_info(text),
        records: rows.records,
        rejected_rows: rows.rejected,
    })
}
