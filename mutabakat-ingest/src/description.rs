//! Description cleanup and counterparty extraction.

use mutabakat_core::RuleTable;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::clean::collapse_whitespace;

/// Used when nothing descriptive survives normalization.
pub const EMPTY_DESCRIPTION: &str = "İşlem";

/// Institution boilerplate removed from descriptions, applied in order.
static NOISE: Lazy<RuleTable<&'static str>> = Lazy::new(|| {
    RuleTable::from_rows([
        (r"(?i)[İI]nternet\s*-\s*Mobil", " "),
        (r"^\s*(?:Para Gönder|Diğer)\b", " "),
        (r"\bDiğer\b", " "),
        (r"\bŞube\b", " "),
        (r"(?i)Hesaplar\s+Aras[ıi]\s+(?:Virman|Transfer)", " "),
        (r"(?i)Kendi\s+Hesab[ıi]ma", " "),
        (r"(?i)\bVirman\b", " "),
    ])
    .expect("invalid noise rules")
});

static LEADING_DATE_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\d{2}/\d{2}/\d{4}\s*\d{2}:\d{2}:\d{2}").expect("invalid date time regex")
});

static IBAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"TR\d{2}(?:\s?\d{4}){5}\s?\d{2}").expect("invalid iban regex")
});

static IBAN_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"⟦IBAN(\d+)⟧").expect("invalid placeholder regex"));

static LONG_DIGITS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{10,}").expect("invalid digit run regex"));

static REPEATED_DASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-(?:\s*-)+").expect("invalid dash regex"));

static SPACED_DASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+-\s*|\s*-\s+").expect("invalid dash spacing regex"));

static REPEATED_PERIOD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.{2,}").expect("invalid period regex"));

static TRANSFER_COUNTERPARTY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:G[İIi]DEN|GELEN)\s+(?:FAST|EFT|HAVALE)\s*-\s*(?P<name>[^-]+?)(?:\s+TR\d{2}[\d\s]{20,}|\s*-|$)",
    )
    .expect("invalid counterparty regex")
});

/// Counterparty details recoverable from a description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counterparty {
    pub name: Option<String>,
    pub iban: Option<String>,
}

fn compact_iban(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

/// First IBAN in the text, spaces removed.
pub fn extract_iban(text: &str) -> Option<String> {
    IBAN.find(text).map(|m| compact_iban(m.as_str()))
}

/// Normalize the raw head text of a record into a display description.
pub fn normalize(head: &str) -> String {
    let text = LEADING_DATE_TIME.replace(head, "");
    let text = NOISE.replace_all(&text);

    // IBANs carry 24 digits and would be eaten by the digit-run strip.
    let mut ibans = Vec::new();
    let text = IBAN.replace_all(&text, |caps: &regex::Captures| {
        ibans.push(compact_iban(&caps[0]));
        format!("⟦IBAN{}⟧", ibans.len() - 1)
    });
    let text = LONG_DIGITS.replace_all(&text, "");
    let text = IBAN_PLACEHOLDER.replace_all(&text, |caps: &regex::Captures| {
        caps[1]
            .parse::<usize>()
            .ok()
            .and_then(|i| ibans.get(i).cloned())
            .unwrap_or_default()
    });

    let text = collapse_whitespace(&text);
    let text = REPEATED_DASH.replace_all(&text, "-");
    let text = SPACED_DASH.replace_all(&text, " - ");
    let text = REPEATED_PERIOD.replace_all(&text, ".");
    let text = text.trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | ',' | ';' | ':' | '/'));

    if text.trim().is_empty() {
        EMPTY_DESCRIPTION.to_string()
    } else {
        collapse_whitespace(text)
    }
}

/// Counterparty name and IBAN from a normalized description.
///
/// A one-character name is never returned.
pub fn extract_counterparty(description: &str) -> Counterparty {
    let iban = extract_iban(description);

    if let Some(caps) = TRANSFER_COUNTERPARTY.captures(description) {
        let name = caps["name"].trim();
        if name.chars().count() >= 2 {
            return Counterparty {
                name: Some(name.to_string()),
                iban,
            };
        }
    }

    let segments: Vec<&str> = description
        .split(" - ")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    let name = segments
        .get(1)
        .filter(|s| s.chars().count() >= 2)
        .map(|s| s.to_string());

    Counterparty { name, iban }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IBAN_SAMPLE: &str = "TR120006200000000123456789";

    #[test]
    fn test_full_normalization() {
        let head = format!(
            "12/03/2024 14:22:01 Internet - Mobil Para Gönder GİDEN FAST - AHMET YILMAZ - 20240312001234 Kira {IBAN_SAMPLE}"
        );
        assert_eq!(
            normalize(&head),
            format!("GİDEN FAST - AHMET YILMAZ - Kira {IBAN_SAMPLE}")
        );
    }

    #[test]
    fn test_spaced_iban_survives_digit_strip() {
        let desc = normalize("Havale TR12 0006 2000 0000 0123 4567 89 ref 99887766554433");
        assert_eq!(desc, format!("Havale {IBAN_SAMPLE} ref"));
    }

    #[test]
    fn test_dash_and_period_cleanup() {
        assert_eq!(normalize("Şube EFT-  ALİ VELİ.... ödeme"), "EFT - ALİ VELİ. ödeme");
        assert_eq!(normalize("Diğer - - market"), "market");
    }

    #[test]
    fn test_empty_becomes_placeholder() {
        assert_eq!(normalize("Diğer Şube 1234567890123"), EMPTY_DESCRIPTION);
        assert_eq!(normalize("   "), EMPTY_DESCRIPTION);
    }

    #[test]
    fn test_counterparty_from_transfer_pattern() {
        let cp = extract_counterparty(&format!("GELEN FAST - MEHMET DEMİR - Aidat {IBAN_SAMPLE}"));
        assert_eq!(cp.name.as_deref(), Some("MEHMET DEMİR"));
        assert_eq!(cp.iban.as_deref(), Some(IBAN_SAMPLE));

        let cp = extract_counterparty("giden havale - Ayşe Kaya");
        assert_eq!(cp.name.as_deref(), Some("Ayşe Kaya"));
    }

    #[test]
    fn test_counterparty_name_stops_before_iban() {
        let cp = extract_counterparty(&format!("GİDEN FAST - AHMET YILMAZ {IBAN_SAMPLE}"));
        assert_eq!(cp.name.as_deref(), Some("AHMET YILMAZ"));
        assert_eq!(cp.iban.as_deref(), Some(IBAN_SAMPLE));

        let cp = extract_counterparty(&format!("GELEN EFT - ALİ VELİ {IBAN_SAMPLE} - Kira"));
        assert_eq!(cp.name.as_deref(), Some("ALİ VELİ"));
    }

    #[test]
    fn test_counterparty_from_second_segment() {
        let cp = extract_counterparty("Fatura - TÜRK TELEKOM - Mart");
        assert_eq!(cp.name.as_deref(), Some("TÜRK TELEKOM"));
        assert_eq!(cp.iban, None);
    }

    #[test]
    fn test_single_char_name_is_not_guessed() {
        assert_eq!(extract_counterparty("POS - X").name, None);
        assert_eq!(extract_counterparty("İşlem").name, None);
    }
}
