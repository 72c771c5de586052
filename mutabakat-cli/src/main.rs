use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use mutabakat_core::time::today_in;
use mutabakat_finance::{
    age_open_invoices, allocate_customers, parse_ledger_csv, parse_statement_file, summarize_aging,
};
use mutabakat_ingest::{EmailMessage, EmailParser, FailureLog};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

mod config;
mod export;
mod logging;
mod mailbox;
mod sync;

use config::{Config, EmailSettings};
use export::{AgingReport, CustomerReport, write_transactions_csv};
use mailbox::DirMailbox;
use sync::{SyncOptions, run_sync_cycle};

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("MUTABAKAT_BUILD_SHA"), ")");

#[derive(Parser, Debug)]
#[command(name = "mutabakat", version = VERSION, about = "Bank statement and payment reconciliation")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Log level when RUST_LOG is unset (overrides config)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bank statement commands
    Statement {
        #[command(subcommand)]
        command: StatementCommand,
    },

    /// Bank notification email commands
    Email {
        #[command(subcommand)]
        command: EmailCommand,
    },

    /// Customer ledger allocation and aging
    Fifo {
        #[command(subcommand)]
        command: FifoCommand,
    },

    /// Configuration helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum StatementCommand {
    /// Parse PDF-extracted statement text and print the result as JSON
    Parse {
        file: PathBuf,

        /// Also write the transactions to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum EmailCommand {
    /// Parse one email stored as JSON
    Parse { file: PathBuf },

    /// Run one sync cycle over a directory of exported emails
    Sync {
        #[arg(long)]
        maildir: PathBuf,

        /// Only messages dated on or after this day (yyyy-mm-dd)
        #[arg(long)]
        since: Option<NaiveDate>,
    },
}

#[derive(Subcommand, Debug)]
enum FifoCommand {
    /// Allocate payments to invoices per customer
    Allocate { ledger: PathBuf },

    /// Age open invoices after allocation
    Aging {
        ledger: PathBuf,

        /// Reference day (yyyy-mm-dd); defaults to today in the configured zone
        #[arg(long)]
        today: Option<NaiveDate>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default ~/.mutabakat/config.toml
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config()?;

    let level = cli.log_level.as_deref().unwrap_or(&cfg.general.log_level);
    logging::init_tracing(level, cli.json_logs);

    match cli.command {
        Command::Statement { command } => match command {
            StatementCommand::Parse { file, csv } => statement_parse(&file, csv.as_deref())?,
        },

        Command::Email { command } => match command {
            EmailCommand::Parse { file } => email_parse(&cfg, &file)?,
            EmailCommand::Sync { maildir, since } => email_sync(&cfg, maildir, since).await?,
        },

        Command::Fifo { command } => match command {
            FifoCommand::Allocate { ledger } => fifo_allocate(&ledger)?,
            FifoCommand::Aging { ledger, today } => fifo_aging(&cfg, &ledger, today)?,
        },

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
        },
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("serialize output")?);
    Ok(())
}

fn statement_parse(file: &Path, csv: Option<&Path>) -> Result<()> {
    if !file.exists() {
        bail!("Statement not found: {}", file.display());
    }
    let result = parse_statement_file(file)
        .with_context(|| format!("parsing {}", file.display()))?;

    if let Some(out) = csv {
        write_transactions_csv(out, &result.transactions)?;
        info!(path = %out.display(), rows = result.transactions.len(), "csv written");
    }
    print_json(&result)
}

fn email_parser(cfg: &Config) -> Result<EmailParser> {
    Ok(EmailParser::new(FailureLog::new(config::failure_log_path(cfg)?)))
}

fn email_parse(cfg: &Config, file: &Path) -> Result<()> {
    let raw = fs::read_to_string(file).with_context(|| format!("read {}", file.display()))?;
    let message: EmailMessage =
        serde_json::from_str(&raw).with_context(|| format!("parse {}", file.display()))?;

    let tx = email_parser(cfg)?
        .parse(&message)
        .with_context(|| format!("extracting transaction from {}", message.message_id))?;
    print_json(&tx)
}

async fn email_sync(cfg: &Config, maildir: PathBuf, since: Option<NaiveDate>) -> Result<()> {
    let settings = EmailSettings::from_section(&cfg.email)?;
    info!(
        host = %settings.host,
        port = settings.port,
        user = %settings.user,
        mailbox = %settings.mailbox,
        "mail settings loaded; reading from directory mailbox"
    );

    let opts = SyncOptions::from_settings(&settings, since);
    let mailbox = DirMailbox::new(maildir);
    let parser = Arc::new(email_parser(cfg)?);
    let report = run_sync_cycle(&mailbox, parser, &opts).await?;
    print_json(&report)
}

fn load_allocations(ledger: &Path) -> Result<Vec<CustomerReport>> {
    let rows = parse_ledger_csv(ledger)?;
    Ok(allocate_customers(&rows.invoices, &rows.payments)
        .into_iter()
        .map(|(customer, result)| CustomerReport::new(customer, result))
        .collect())
}

fn fifo_allocate(ledger: &Path) -> Result<()> {
    print_json(&load_allocations(ledger)?)
}

fn fifo_aging(cfg: &Config, ledger: &Path, today: Option<NaiveDate>) -> Result<()> {
    let today = match today {
        Some(d) => d,
        None => today_in(&cfg.general.timezone)?,
    };

    let entries: Vec<_> = load_allocations(ledger)?
        .iter()
        .flat_map(|report| age_open_invoices(&report.allocation, today))
        .collect();
    let summary = summarize_aging(&entries);
    print_json(&AgingReport {
        today,
        entries,
        summary,
    })
}
