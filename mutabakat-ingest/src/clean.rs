//! Line cleaning for PDF-extracted statement text.

use once_cell::sync::Lazy;
use regex::Regex;

/// Header labels consumed by account info extraction, never by row parsing.
const HEADER_LABELS: &[&str] = &[
    "Tarih Aralığı:",
    "Müşteri Adı:",
    "IBAN/Hesap No:",
    "Kullanılabilir Bakiye:",
    "Hesap Hareketleri",
    "Tarih Açıklama Tutar Bakiye",
    "TarihAçıklamaTutarBakiye",
];

static PAGINATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\s*/\s*\d+$").expect("invalid pagination regex"));

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("invalid whitespace regex"));

static HYPHEN_WRAP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\p{L})-\s+(\p{L})").expect("invalid hyphen regex"));

/// Collapse every whitespace run to a single space and trim.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s.trim(), " ").into_owned()
}

/// Rejoin words the PDF extractor split with a trailing hyphen:
/// `"kelime- devam"` becomes `"kelimedevam"`.
pub fn rejoin_hyphenated(s: &str) -> String {
    HYPHEN_WRAP.replace_all(s, "$1$2").into_owned()
}

pub fn is_header_label(line: &str) -> bool {
    HEADER_LABELS.iter().any(|label| line == *label)
}

/// Clean one line. `None` means the line carries no record content.
pub fn clean_line(line: &str) -> Option<String> {
    let line = collapse_whitespace(line);
    if line.is_empty() || PAGINATION.is_match(&line) || is_header_label(&line) {
        return None;
    }
    Some(rejoin_hyphenated(&line))
}

/// Split text into non-empty cleaned lines.
pub fn clean_lines(text: &str) -> Vec<String> {
    text.lines().filter_map(clean_line).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drops_pagination_and_labels() {
        let text = "Müşteri Adı:\nAYŞE KAYA\n 1/3 \n\nKullanılabilir Bakiye:\n12/34\nsatır";
        assert_eq!(clean_lines(text), vec!["AYŞE KAYA", "satır"]);
    }

    #[test]
    fn test_label_with_value_is_kept() {
        assert_eq!(
            clean_line("Müşteri Adı: AYŞE KAYA").as_deref(),
            Some("Müşteri Adı: AYŞE KAYA")
        );
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(clean_line("  GELEN   FAST\t-  AHMET ").as_deref(), Some("GELEN FAST - AHMET"));
    }

    #[test]
    fn test_rejoins_hyphenated_words() {
        assert_eq!(rejoin_hyphenated("kelime- devam"), "kelimedevam");
        assert_eq!(rejoin_hyphenated("Internet - Mobil"), "Internet - Mobil");
        assert_eq!(clean_line("Elektronik Fon Trans- feri").as_deref(), Some("Elektronik Fon Transferi"));
    }
}
