//! One mail sync cycle: connect, lock, fetch, unlock, then parse the batch on
//! a bounded worker pool.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use mutabakat_core::EmailTransaction;
use mutabakat_ingest::{EmailError, EmailMessage, EmailParser};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::config::EmailSettings;
use crate::mailbox::{FetchCriteria, Mailbox, MailboxError};

/// Knobs of one sync cycle.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub mailbox: String,
    pub batch_size: usize,
    pub concurrency_limit: usize,
    /// Applies to each connect/fetch attempt, never to parsing
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub since: Option<NaiveDate>,
}

impl SyncOptions {
    pub fn from_settings(settings: &EmailSettings, since: Option<NaiveDate>) -> Self {
        Self {
            mailbox: settings.mailbox.clone(),
            batch_size: settings.batch_size,
            concurrency_limit: settings.concurrency_limit,
            timeout: settings.timeout,
            max_retries: settings.max_retries,
            retry_delay: settings.retry_delay,
            since,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub fetched: usize,
    pub parsed: usize,
    /// Messages no template matched
    pub unmatched: usize,
    /// Matched messages that could not be turned into a transaction
    pub failed: usize,
    pub transactions: Vec<EmailTransaction>,
}

/// Run `op` under the per-attempt timeout, retrying transient failures.
async fn with_retries<T, F, Fut>(op: &'static str, opts: &SyncOptions, f: F) -> Result<T, MailboxError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, MailboxError>>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        let result = match tokio::time::timeout(opts.timeout, f()).await {
            Ok(r) => r,
            Err(_) => Err(MailboxError::Timeout {
                op,
                after: opts.timeout,
            }),
        };
        match result {
            Ok(v) => return Ok(v),
            Err(e) if e.is_retryable() && attempt <= opts.max_retries => {
                warn!(op, attempt, error = %e, "mailbox operation failed, retrying");
                tokio::time::sleep(opts.retry_delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

enum Outcome {
    Parsed(EmailTransaction),
    Unmatched,
    Failed,
}

fn parse_one(parser: &EmailParser, email: &EmailMessage) -> Outcome {
    match parser.parse(email) {
        Ok(Some(tx)) => Outcome::Parsed(tx),
        Ok(None) => Outcome::Unmatched,
        Err(e @ EmailError::DirectionUndetectable { .. }) => {
            warn!(message_id = %email.message_id, error = %e, "email skipped");
            if let Err(log_err) = parser.record_failure(email, &e.to_string()) {
                warn!(error = %log_err, "could not write failure log");
            }
            Outcome::Failed
        }
        Err(e) => {
            warn!(message_id = %email.message_id, error = %e, "email parse failed");
            Outcome::Failed
        }
    }
}

/// Run `parse` over every email on blocking workers, at most `limit` at a
/// time. Results come back in completion order.
async fn parse_batch<T, F>(emails: Vec<EmailMessage>, limit: usize, parse: F) -> Result<Vec<T>>
where
    T: Send + 'static,
    F: Fn(&EmailMessage) -> T + Send + Sync + 'static,
{
    let parse = Arc::new(parse);
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut workers = JoinSet::new();
    for email in emails {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .context("worker pool closed")?;
        let parse = parse.clone();
        workers.spawn_blocking(move || {
            let _permit = permit;
            parse(&email)
        });
    }

    let mut results = Vec::with_capacity(workers.len());
    while let Some(joined) = workers.join_next().await {
        results.push(joined.context("email worker panicked")?);
    }
    Ok(results)
}

/// Fetch one batch under the mailbox lock, then parse it.
///
/// The lock is released before parsing starts, also when the fetch fails.
pub async fn run_sync_cycle<M: Mailbox>(
    mailbox: &M,
    parser: Arc<EmailParser>,
    opts: &SyncOptions,
) -> Result<SyncReport> {
    with_retries("connect", opts, || mailbox.connect())
        .await
        .context("connecting to mailbox")?;
    mailbox
        .open(&opts.mailbox)
        .await
        .with_context(|| format!("opening {}", opts.mailbox))?;
    mailbox.lock().await.context("locking mailbox")?;

    let criteria = FetchCriteria {
        since: opts.since,
        limit: opts.batch_size,
    };
    let fetched = with_retries("fetch", opts, || mailbox.fetch(&criteria)).await;
    if let Err(e) = mailbox.unlock().await {
        warn!(error = %e, "could not release mailbox lock");
    }
    let emails = fetched.context("fetching messages")?;

    let mut report = SyncReport {
        fetched: emails.len(),
        ..SyncReport::default()
    };
    info!(fetched = report.fetched, "messages fetched");

    let outcomes = parse_batch(emails, opts.concurrency_limit, move |email| {
        parse_one(&parser, email)
    })
    .await?;

    for outcome in outcomes {
        match outcome {
            Outcome::Parsed(tx) => {
                report.parsed += 1;
                report.transactions.push(tx);
            }
            Outcome::Unmatched => report.unmatched += 1,
            Outcome::Failed => report.failed += 1,
        }
    }
    report
        .transactions
        .sort_by(|a, b| {
            a.transaction_date
                .cmp(&b.transaction_date)
                .then_with(|| a.message_id.cmp(&b.message_id))
        });

    info!(
        parsed = report.parsed,
        unmatched = report.unmatched,
        failed = report.failed,
        "mail sync finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mailbox::DirMailbox;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use mutabakat_core::EmailDirection;
    use mutabakat_ingest::FailureLog;
    use std::path::Path;
    use std::sync::atomic::{AtomicU32, Ordering};

    const INCOMING: &str = "<p>1234XXXX5678 numaralı TR120006200000000123456789 IBAN'lı hesabınıza \
        12.03.2024 14:22 tarihinde AHMET YILMAZ isimli kişiden 1.250,00 TL FAST ile gelmiştir.</p>";
    const NO_DIRECTION: &str = "1234XXXX5678 numaralı TR120006200000000123456789 IBAN'lı hesabı \
        12.03.2024 14:22 tarihinde AHMET YILMAZ isimli kişi 100,00 TL FAST işlemi.";

    fn opts() -> SyncOptions {
        SyncOptions {
            mailbox: "INBOX".to_string(),
            batch_size: 50,
            concurrency_limit: 2,
            timeout: Duration::from_secs(5),
            max_retries: 2,
            retry_delay: Duration::from_millis(1),
            since: None,
        }
    }

    fn write(dir: &Path, id: &str, body: &str) {
        let message = EmailMessage {
            message_id: id.to_string(),
            subject: "Bildirim".to_string(),
            from: "bildirim@banka.com.tr".to_string(),
            date: Utc.with_ymd_and_hms(2024, 3, 12, 11, 22, 0).unwrap(),
            body: body.to_string(),
        };
        std::fs::write(
            dir.join(format!("{id}.json")),
            serde_json::to_vec(&message).unwrap(),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn test_cycle_counts_every_outcome() {
        let maildir = tempfile::tempdir().unwrap();
        write(maildir.path(), "m1", INCOMING);
        write(maildir.path(), "m2", "Kampanya duyurusu");
        write(maildir.path(), "m3", NO_DIRECTION);

        let log_dir = tempfile::tempdir().unwrap();
        let log_path = log_dir.path().join("failures.jsonl");
        let parser = Arc::new(EmailParser::new(FailureLog::new(&log_path)));

        let mailbox = DirMailbox::new(maildir.path());
        let report = run_sync_cycle(&mailbox, parser, &opts()).await.unwrap();

        assert_eq!(report.fetched, 3);
        assert_eq!(report.parsed, 1);
        assert_eq!(report.unmatched, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.transactions[0].direction, EmailDirection::In);
        assert_eq!(report.transactions[0].amount, 1250.0);

        let log = std::fs::read_to_string(&log_path).unwrap();
        assert_eq!(log.lines().count(), 2);
        assert!(!maildir.path().join(crate::mailbox::LOCK_FILE).exists());
    }

    #[tokio::test]
    async fn test_locked_mailbox_fails_fast() {
        let maildir = tempfile::tempdir().unwrap();
        std::fs::write(maildir.path().join(crate::mailbox::LOCK_FILE), b"").unwrap();

        let mailbox = DirMailbox::new(maildir.path());
        let err = run_sync_cycle(&mailbox, Arc::new(EmailParser::without_log()), &opts())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MailboxError>(),
            Some(MailboxError::Locked(_))
        ));
    }

    /// Fails `connect` a fixed number of times, then serves nothing.
    struct Flaky {
        failures_left: AtomicU32,
        attempts: AtomicU32,
    }

    #[async_trait]
    impl Mailbox for Flaky {
        async fn connect(&self) -> Result<(), MailboxError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let left = self.failures_left.load(Ordering::SeqCst);
            if left > 0 {
                self.failures_left.store(left - 1, Ordering::SeqCst);
                return Err(MailboxError::Connect("connection reset".to_string()));
            }
            Ok(())
        }
        async fn open(&self, _name: &str) -> Result<(), MailboxError> {
            Ok(())
        }
        async fn lock(&self) -> Result<(), MailboxError> {
            Ok(())
        }
        async fn unlock(&self) -> Result<(), MailboxError> {
            Ok(())
        }
        async fn fetch(&self, _criteria: &FetchCriteria) -> Result<Vec<EmailMessage>, MailboxError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_connect_is_retried() {
        let mailbox = Flaky {
            failures_left: AtomicU32::new(2),
            attempts: AtomicU32::new(0),
        };
        let report = run_sync_cycle(&mailbox, Arc::new(EmailParser::without_log()), &opts())
            .await
            .unwrap();
        assert_eq!(report.fetched, 0);
        assert_eq!(mailbox.attempts.load(Ordering::SeqCst), 3);
    }

    /// Connects slower than any sensible timeout.
    struct Stalled {
        attempts: AtomicU32,
    }

    #[async_trait]
    impl Mailbox for Stalled {
        async fn connect(&self) -> Result<(), MailboxError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }
        async fn open(&self, _name: &str) -> Result<(), MailboxError> {
            Ok(())
        }
        async fn lock(&self) -> Result<(), MailboxError> {
            Ok(())
        }
        async fn unlock(&self) -> Result<(), MailboxError> {
            Ok(())
        }
        async fn fetch(&self, _criteria: &FetchCriteria) -> Result<Vec<EmailMessage>, MailboxError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_slow_connect_times_out_after_retries() {
        let mailbox = Stalled {
            attempts: AtomicU32::new(0),
        };
        let mut opts = opts();
        opts.timeout = Duration::from_millis(20);

        let err = run_sync_cycle(&mailbox, Arc::new(EmailParser::without_log()), &opts)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MailboxError>(),
            Some(MailboxError::Timeout { op: "connect", .. })
        ));
        assert_eq!(mailbox.attempts.load(Ordering::SeqCst), 1 + opts.max_retries);
    }

    #[tokio::test]
    async fn test_worker_pool_respects_concurrency_limit() {
        use std::sync::atomic::AtomicUsize;

        let emails: Vec<EmailMessage> = (0..8)
            .map(|i| EmailMessage {
                message_id: format!("m{i}"),
                subject: String::new(),
                from: String::new(),
                date: Utc.with_ymd_and_hms(2024, 3, 12, 9, 0, 0).unwrap(),
                body: String::new(),
            })
            .collect();

        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (now, max) = (in_flight.clone(), peak.clone());
        let ids = parse_batch(emails, 2, move |email| {
            let current = now.fetch_add(1, Ordering::SeqCst) + 1;
            max.fetch_max(current, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(30));
            now.fetch_sub(1, Ordering::SeqCst);
            email.message_id.clone()
        })
        .await
        .unwrap();

        assert_eq!(ids.len(), 8);
        assert_eq!(peak.load(Ordering::SeqCst), 2);
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let mailbox = Flaky {
            failures_left: AtomicU32::new(10),
            attempts: AtomicU32::new(0),
        };
        let result = run_sync_cycle(&mailbox, Arc::new(EmailParser::without_log()), &opts()).await;
        assert!(result.is_err());
        // first attempt plus max_retries
        assert_eq!(mailbox.attempts.load(Ordering::SeqCst), 3);
    }
}
