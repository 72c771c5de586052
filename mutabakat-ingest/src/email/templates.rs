//! Named-group templates for FAST / HAVALE / EFT notification bodies.
//!
//! Expected decoded body:
//!   1234XXXX5678 numaralı TR120006200000000123456789 IBAN'lı hesabınıza
//!   12.03.2024 14:22 tarihinde AHMET YILMAZ isimli kişiden 1.250,00 TL FAST
//!   ile gelmiştir. İşlem sonrası bakiyeniz: 5.430,25 TL

use mutabakat_core::{TransactionType, parse_amount};
use once_cell::sync::Lazy;
use regex::Regex;

const COMMON: &str = concat!(
    r"(?P<masked>\d{2,6}[X*]{2,}\d{2,6})\s+(?:numaral[ıi]|nolu|no'lu)\s+",
    r"(?P<iban>TR\d{2}(?:\s?\d{4}){5}\s?\d{2})\s+IBAN['’]?l[ıi]\s+hesab\S*\s+",
    r"(?P<date>\d{2}[./]\d{2}[./]\d{4})\s+(?:saat\s+)?(?P<time>\d{2}:\d{2}(?::\d{2})?)\s+tarihinde\s+",
    r"(?P<name>.+?)\s+(?:isimli|adlı|unvanlı)\s+kiş\S*\s+",
    r"(?P<amount>(?:\d{1,3}(?:\.\d{3})+|\d+)(?:,\d{1,2})?)\s*(?:TL|TRY)\s+",
);

/// Templates in priority order.
static TEMPLATES: Lazy<Vec<(TransactionType, Regex)>> = Lazy::new(|| {
    [
        (TransactionType::Fast, r"(?i:fast)\b"),
        (TransactionType::Havale, r"(?i:havale)\b"),
        (TransactionType::Eft, r"(?i:eft)\b"),
    ]
    .into_iter()
    .map(|(kind, suffix)| {
        let re = Regex::new(&format!("{COMMON}{suffix}")).expect("invalid email template");
        (kind, re)
    })
    .collect()
});

static BALANCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i:[İI]şlem\s+sonras[ıi]\s+bakiye\S*|güncel\s+bakiye\S*|kullan[ıi]labilir\s+bakiye\S*)",
        r"\s*:?\s*(?P<balance>-?(?:\d{1,3}(?:\.\d{3})+|\d+)(?:,\d{1,2})?)"
    ))
    .expect("invalid balance template")
});

/// Raw captures of a matched transaction template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateMatch {
    pub kind: TransactionType,
    pub masked_account: String,
    pub iban: String,
    pub date: String,
    pub time: String,
    pub counterparty: String,
    pub amount: String,
}

/// Try each transaction template in order.
pub fn match_transaction(text: &str) -> Option<TemplateMatch> {
    TEMPLATES.iter().find_map(|(kind, re)| {
        let caps = re.captures(text)?;
        Some(TemplateMatch {
            kind: *kind,
            masked_account: caps["masked"].to_string(),
            iban: caps["iban"].chars().filter(|c| !c.is_whitespace()).collect(),
            date: caps["date"].to_string(),
            time: caps["time"].to_string(),
            counterparty: caps["name"].trim().to_string(),
            amount: caps["amount"].to_string(),
        })
    })
}

/// Balance after the transaction, when the mail states one.
pub fn match_balance(text: &str) -> Option<f64> {
    BALANCE
        .captures(text)
        .map(|caps| parse_amount(&caps["balance"]))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST_IN: &str = "Sayın Müşterimiz, 1234XXXX5678 numaralı TR120006200000000123456789 IBAN'lı \
        hesabınıza 12.03.2024 14:22 tarihinde AHMET YILMAZ isimli kişiden 1.250,00 TL FAST ile \
        gelmiştir. İşlem sonrası bakiyeniz: 5.430,25 TL";

    #[test]
    fn test_fast_template() {
        let m = match_transaction(FAST_IN).unwrap();
        assert_eq!(m.kind, TransactionType::Fast);
        assert_eq!(m.masked_account, "1234XXXX5678");
        assert_eq!(m.iban, "TR120006200000000123456789");
        assert_eq!(m.date, "12.03.2024");
        assert_eq!(m.time, "14:22");
        assert_eq!(m.counterparty, "AHMET YILMAZ");
        assert_eq!(m.amount, "1.250,00");
        assert_eq!(match_balance(FAST_IN), Some(5430.25));
    }

    #[test]
    fn test_havale_and_eft_templates() {
        let havale = "1234****5678 numaralı TR12 0006 2000 0000 0123 4567 89 IBAN'lı hesabınızdan \
            01.04.2024 09:10:11 tarihinde AYŞE KAYA isimli kişiye 300,00 TL havale çıkışı olmuştur.";
        let m = match_transaction(havale).unwrap();
        assert_eq!(m.kind, TransactionType::Havale);
        assert_eq!(m.iban, "TR120006200000000123456789");
        assert_eq!(m.time, "09:10:11");

        let eft = havale.replace("havale çıkışı", "EFT çıkışı");
        assert_eq!(match_transaction(&eft).unwrap().kind, TransactionType::Eft);
    }

    #[test]
    fn test_unrelated_mail_does_not_match() {
        assert!(match_transaction("Kampanya: kredi kartınıza özel faiz fırsatı!").is_none());
        assert_eq!(match_balance("bakiye bilgisi yok"), None);
    }
}
