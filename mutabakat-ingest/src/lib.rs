//! mutabakat-ingest: statement text and notification email ingestion.
//!
//! Statement path: clean -> segment -> extract fields -> normalize description.
//! Email path: HTML decode -> template match -> direction resolution.

pub mod account;
pub mod clean;
pub mod description;
pub mod email;
pub mod error;
pub mod fields;
pub mod parsers;
pub mod segment;
pub mod types;

pub use account::extract_account_info;
pub use email::{EmailMessage, EmailParser, FailureLog};
pub use error::{EmailError, StatementError};
pub use parsers::{parse_statement_text, read_statement_text};
pub use types::{ParsedStatement, RecordGroup, StatementLayout};
