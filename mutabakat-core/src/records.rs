//! Record types flowing through the statement and email pipelines.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of hex characters of the content hash used as the external ID.
pub const RECORD_ID_LEN: usize = 16;

/// One transaction as read from a statement, before enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedRecord {
    /// 1-based line of the record start within the cleaned statement lines
    pub line_number: usize,
    pub date_time: NaiveDateTime,
    pub description: String,
    /// Negative = money out, positive = money in
    pub amount: f64,
    pub currency: String,
    /// Account balance after this transaction
    pub balance: f64,
    pub balance_currency: String,
    /// Joined source text of the record
    pub raw: String,
}

impl ParsedRecord {
    /// Fixed-width ISO-8601 timestamp; lexical order equals time order.
    pub fn iso_date_time(&self) -> String {
        self.date_time.format("%Y-%m-%dT%H:%M:%S").to_string()
    }

    pub fn is_debit(&self) -> bool {
        self.amount < 0.0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Fee,
    Incoming,
    Outgoing,
    Pos,
    Utility,
    Other,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::Fee => "fee",
            Category::Incoming => "incoming",
            Category::Outgoing => "outgoing",
            Category::Pos => "pos",
            Category::Utility => "utility",
            Category::Other => "other",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Subcategory {
    FeeBsmv,
    FeeEft,
    IncomingTransfer,
    OutgoingTransfer,
    PosPurchase,
    UtilityBill,
    Other,
}

/// Operation keyword found in the record text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Operation {
    #[serde(rename = "FAST")]
    Fast,
    #[serde(rename = "EFT")]
    Eft,
    #[serde(rename = "HAVALE")]
    Havale,
    #[serde(rename = "POS")]
    Pos,
    #[serde(rename = "Fatura")]
    Fatura,
    #[serde(rename = "Para Gönder")]
    ParaGonder,
}

/// Banking channel the transaction went through.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Channel {
    #[serde(rename = "Internet - Mobil")]
    InternetMobil,
    #[serde(rename = "Diğer")]
    #[default]
    Diger,
    #[serde(rename = "Şube")]
    Sube,
}

/// Transfer direction as printed on statements.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TransferDirection {
    #[serde(rename = "GELEN")]
    Gelen,
    #[serde(rename = "GİDEN")]
    Giden,
}

/// A parsed record after categorization and quality checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedTransaction {
    #[serde(flatten)]
    pub record: ParsedRecord,
    pub debit: f64,
    pub credit: f64,
    pub category: Category,
    pub subcategory: Subcategory,
    pub op: Option<Operation>,
    pub channel: Channel,
    pub direction: Option<TransferDirection>,
    pub counterparty_name: Option<String>,
    pub counterparty_iban: Option<String>,
    /// Trust in this record, 1.0 until penalties are applied
    pub confidence: f64,
    pub anomalies: Vec<String>,
    /// Full SHA-256 content fingerprint (hex)
    pub hash: String,
}

impl EnrichedTransaction {
    /// External record ID: the leading hex characters of the content hash.
    pub fn id(&self) -> &str {
        let end = self.hash.len().min(RECORD_ID_LEN);
        &self.hash[..end]
    }

    /// Split a signed amount into `(debit, credit)`; exactly one is non-zero.
    pub fn split_amount(amount: f64) -> (f64, f64) {
        if amount < 0.0 {
            (-amount, 0.0)
        } else {
            (0.0, amount)
        }
    }
}

/// Statement-level account details, read once per statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub account_holder: Option<String>,
    pub iban: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub end_balance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceAnomaly {
    pub line_number: usize,
    pub expected_balance: f64,
    pub actual_balance: f64,
    pub difference: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityReport {
    pub balance_anomalies: Vec<BalanceAnomaly>,
    pub duplicate_hashes: Vec<String>,
    pub rejected_rows: Vec<String>,
}

/// Direction of a notified transfer relative to the account owner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum EmailDirection {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Fast,
    Havale,
    Eft,
}

/// A transfer extracted from a bank notification email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailTransaction {
    pub message_id: String,
    pub bank_code: String,
    pub direction: EmailDirection,
    pub account_iban: String,
    pub masked_account: String,
    pub transaction_date: NaiveDateTime,
    pub amount: f64,
    pub counterparty_name: String,
    pub balance_after: Option<f64>,
    pub transaction_type: TransactionType,
}
