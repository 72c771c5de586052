//! mutabakat-core: value types, amount parsing and rule tables shared by the
//! statement, email and allocation pipelines.

pub mod amount;
pub mod ledger;
pub mod records;
pub mod rules;
pub mod text;
pub mod time;

pub use amount::{parse_amount, round_cents};
pub use ledger::{Allocation, Invoice, Payment, DEFAULT_PAYMENT_METHOD};
pub use records::{
    AccountInfo, BalanceAnomaly, Category, Channel, EmailDirection, EmailTransaction,
    EnrichedTransaction, Operation, ParsedRecord, QualityReport, Subcategory, TransactionType,
    TransferDirection, RECORD_ID_LEN,
};
pub use rules::{Rule, RuleTable};
pub use text::fold;
