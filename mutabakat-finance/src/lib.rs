//! mutabakat-finance: enrichment, quality checks, the statement pipeline,
//! and FIFO allocation of customer payments to invoices.

pub mod aging;
pub mod category_rules;
pub mod fifo;
pub mod ledger_csv;
pub mod quality;
pub mod statement;

pub use aging::{AgingBucket, AgingEntry, AgingSummary, BucketTotal, age_open_invoices, summarize_aging};
pub use category_rules::{Classification, OperationInfo, categorize, enrich, operation_info};
pub use fifo::{
    FifoResult, InvoiceState, PaidInvoice, PaymentPerformance, PaymentState, allocate,
    allocate_customers,
};
pub use ledger_csv::{Ledger, parse_ledger_csv};
pub use quality::{Assessment, assess, content_hash};
pub use statement::{StatementResult, StatementSummary, parse_statement, parse_statement_file};
