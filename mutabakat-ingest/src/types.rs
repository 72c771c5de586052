use mutabakat_core::{AccountInfo, ParsedRecord};
use serde::{Deserialize, Serialize};

/// Which text layout a statement uses, detected from fixed marker strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatementLayout {
    /// One row per transaction, each starting with `dd/mm/yyyy HH:MM:SS`
    TimestampedRows,
    Unknown,
}

/// Raw text span of one candidate transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordGroup {
    /// 1-based index of the first line among the cleaned lines
    pub start_line: usize,
    pub lines: Vec<String>,
}

impl RecordGroup {
    pub fn joined(&self) -> String {
        self.lines.join(" ")
    }
}

/// Output of the text stage, before enrichment and quality checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedStatement {
    pub layout: StatementLayout,
    pub account_info: AccountInfo,
    pub records: Vec<ParsedRecord>,
    pub rejected_rows: Vec<String>,
}
