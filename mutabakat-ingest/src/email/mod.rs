//! Bank notification email extraction.

pub mod failure_log;
pub mod html;
pub mod templates;

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Europe::Istanbul;
use mutabakat_core::{EmailDirection, EmailTransaction, fold, parse_amount, time::parse_tr_date_time};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::EmailError;
pub use failure_log::{FailureEntry, FailureLog};
use html::decode_html;
use templates::{match_balance, match_transaction};

// Phrases are written in folded form (see `mutabakat_core::fold`).
const INCOMING_PHRASES: &[&str] = &["hesabiniza", "gelmiştir", "girişi", "kişiden"];
const OUTGOING_PHRASES: &[&str] = &["hesabinizdan", "gönderilmiştir", "çikişi", "kişiye"];

/// One fetched email, as handed over by the mail layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailMessage {
    pub message_id: String,
    pub subject: String,
    pub from: String,
    pub date: DateTime<Utc>,
    /// Plain text or HTML body
    pub body: String,
}

/// Resolve transfer direction. Subject tags win over body phrasing; `None`
/// means the direction must not be guessed.
pub fn resolve_direction(subject: &str, body: &str) -> Option<EmailDirection> {
    let subject = fold(subject);
    if subject.contains("asistan-gelen") {
        return Some(EmailDirection::In);
    }
    if subject.contains("asistan-giden") {
        return Some(EmailDirection::Out);
    }

    let body = fold(body);
    let has = |phrases: &[&str]| phrases.iter().any(|p| body.contains(p));

    if has(INCOMING_PHRASES) {
        Some(EmailDirection::In)
    } else if has(OUTGOING_PHRASES) {
        Some(EmailDirection::Out)
    } else {
        None
    }
}

/// Bank identifier digits of a Turkish IBAN (positions 5-9).
pub fn bank_code_from_iban(iban: &str) -> Option<String> {
    iban.get(4..9)
        .filter(|code| code.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
}

/// Stateless email parser; the only side effect is the optional failure log.
#[derive(Debug, Default)]
pub struct EmailParser {
    failure_log: Option<FailureLog>,
}

impl EmailParser {
    pub fn new(failure_log: FailureLog) -> Self {
        Self {
            failure_log: Some(failure_log),
        }
    }

    pub fn without_log() -> Self {
        Self::default()
    }

    pub fn failure_log(&self) -> Option<&FailureLog> {
        self.failure_log.as_ref()
    }

    /// Append a failure entry for `email`, if a log is configured.
    pub fn record_failure(&self, email: &EmailMessage, error: &str) -> Result<(), EmailError> {
        let Some(log) = &self.failure_log else {
            return Ok(());
        };
        let body = decode_html(&email.body);
        log.append(&FailureEntry::new(
            email.date.to_rfc3339(),
            &email.subject,
            &email.from,
            &body,
            error,
        ))
    }

    /// Extract a transaction from one email.
    ///
    /// `Ok(None)` means no template matched (routine for unrelated mail) and
    /// the email was written to the failure log. A matched email whose
    /// direction cannot be resolved is an error.
    pub fn parse(&self, email: &EmailMessage) -> Result<Option<EmailTransaction>, EmailError> {
        let text = decode_html(&email.body);

        let Some(m) = match_transaction(&text) else {
            debug!(message_id = %email.message_id, "no transaction template matched");
            self.record_failure(email, "no transaction template matched")?;
            return Ok(None);
        };

        let amount = parse_amount(&m.amount);
        if amount == 0.0 {
            self.record_failure(email, &format!("unparsable amount: {}", m.amount))?;
            return Ok(None);
        }

        let direction = resolve_direction(&email.subject, &text).ok_or_else(|| {
            EmailError::DirectionUndetectable {
                message_id: email.message_id.clone(),
            }
        })?;

        let transaction_date = parse_tr_date_time(&m.date, &m.time)
            .unwrap_or_else(|| local_naive(email.date));

        let tx = EmailTransaction {
            message_id: email.message_id.clone(),
            bank_code: bank_code_from_iban(&m.iban).unwrap_or_default(),
            direction,
            account_iban: m.iban,
            masked_account: m.masked_account,
            transaction_date,
            amount,
            counterparty_name: m.counterparty,
            balance_after: match_balance(&text),
            transaction_type: m.kind,
        };
        info!(
            message_id = %tx.message_id,
            kind = ?tx.transaction_type,
            direction = ?tx.direction,
            amount = tx.amount,
            "email transaction extracted"
        );
        Ok(Some(tx))
    }
}

fn local_naive(date: DateTime<Utc>) -> NaiveDateTime {
    date.with_timezone(&Istanbul).naive_local()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mutabakat_core::TransactionType;

    fn email(subject: &str, body: &str) -> EmailMessage {
        EmailMessage {
            message_id: "<m1@banka>".to_string(),
            subject: subject.to_string(),
            from: "bildirim@banka.com.tr".to_string(),
            date: Utc.with_ymd_and_hms(2024, 3, 12, 11, 30, 0).unwrap(),
            body: body.to_string(),
        }
    }

    const INCOMING_HTML: &str = "<html><style>.a{}</style><body><p>1234XXXX5678 numaral&#305; \
        TR120006200000000123456789 IBAN'l&#305; hesab&#305;n&#305;za 12.03.2024 14:22 tarihinde \
        AHMET YILMAZ isimli ki&scedil;iden 1.250,00 TL FAST ile gelmi&scedil;tir.</p>\
        <p>&#304;&scedil;lem sonras&#305; bakiyeniz: 5.430,25 TL</p></body></html>";

    const NEUTRAL: &str = "1234XXXX5678 numaralı TR120006200000000123456789 IBAN'lı hesabı \
        12.03.2024 14:22 tarihinde AHMET YILMAZ isimli kişi 100,00 TL FAST işlemi.";

    #[test]
    fn test_parse_incoming_html() {
        let parser = EmailParser::without_log();
        let tx = parser.parse(&email("Hesap hareketi", INCOMING_HTML)).unwrap().unwrap();
        assert_eq!(tx.direction, EmailDirection::In);
        assert_eq!(tx.transaction_type, TransactionType::Fast);
        assert_eq!(tx.amount, 1250.0);
        assert_eq!(tx.balance_after, Some(5430.25));
        assert_eq!(tx.bank_code, "00062");
        assert_eq!(tx.counterparty_name, "AHMET YILMAZ");
        assert_eq!(tx.transaction_date.to_string(), "2024-03-12 14:22:00");
    }

    #[test]
    fn test_subject_tag_beats_body() {
        let body = NEUTRAL.replace("hesabı", "hesabınızdan");
        let tx = EmailParser::without_log()
            .parse(&email("Asistan-Gelen bildirim", &body))
            .unwrap()
            .unwrap();
        assert_eq!(tx.direction, EmailDirection::In);
    }

    #[test]
    fn test_no_direction_signal_is_error() {
        let err = EmailParser::without_log()
            .parse(&email("Bilgilendirme", NEUTRAL))
            .unwrap_err();
        assert!(matches!(err, EmailError::DirectionUndetectable { .. }));
    }

    #[test]
    fn test_outgoing_phrasing() {
        assert_eq!(
            resolve_direction("", "300,00 TL hesabınızdan gönderilmiştir"),
            Some(EmailDirection::Out)
        );
        assert_eq!(resolve_direction("", "PARA GİRİŞİ"), Some(EmailDirection::In));
        assert_eq!(resolve_direction("asistan-giden", "hesabınıza"), Some(EmailDirection::Out));
    }

    #[test]
    fn test_unmatched_mail_is_logged_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let parser = EmailParser::new(FailureLog::new(dir.path().join("f.jsonl")));
        let out = parser.parse(&email("Kampanya", "<b>Size özel faiz!</b>")).unwrap();
        assert!(out.is_none());

        let content = std::fs::read_to_string(dir.path().join("f.jsonl")).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains("Size özel faiz!"));
    }

    #[test]
    fn test_bank_code_from_iban() {
        assert_eq!(bank_code_from_iban("TR120006200000000123456789").as_deref(), Some("00062"));
        assert_eq!(bank_code_from_iban("TR12"), None);
    }
}
