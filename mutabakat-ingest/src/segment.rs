//! Record segmentation.
//!
//! PDF extraction loses table cell boundaries, so the `dd/mm/yyyy HH:MM:SS`
//! prefix is the only reliable per-row anchor.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::RecordGroup;

static RECORD_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{2}/\d{2}/\d{4}\s*\d{2}:\d{2}:\d{2}").expect("invalid record start regex")
});

pub fn is_record_start(line: &str) -> bool {
    RECORD_START.is_match(line)
}

/// Group cleaned lines into per-record spans. Lines before the first record
/// start are dropped.
pub fn segment(lines: &[String]) -> Vec<RecordGroup> {
    let mut groups = Vec::new();
    let mut current: Option<RecordGroup> = None;

    for (idx, line) in lines.iter().enumerate() {
        if is_record_start(line) {
            if let Some(done) = current.take() {
                groups.push(done);
            }
            current = Some(RecordGroup {
                start_line: idx + 1,
                lines: vec![line.clone()],
            });
        } else if let Some(group) = current.as_mut() {
            group.lines.push(line.clone());
        }
    }

    if let Some(done) = current {
        groups.push(done);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_one_group_per_timestamp_line() {
        let input = lines(
            "Hesap Özeti\n\
             01/03/2024 10:00:00 GELEN FAST\n\
             - AHMET 100,00 TL 1.100,00 TL\n\
             02/03/202411:30:15 POS harcama\n\
             devam satırı\n\
             03/03/2024 09:00:00 BSMV -1,50 TL 1.098,50 TL",
        );
        let groups = segment(&input);
        let starts = input.iter().filter(|l| is_record_start(l)).count();
        assert_eq!(groups.len(), starts);
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].start_line, 2);
        assert_eq!(groups[0].lines.len(), 2);
        assert_eq!(groups[1].lines, vec!["02/03/202411:30:15 POS harcama", "devam satırı"]);
    }

    #[test]
    fn test_preamble_only_yields_nothing() {
        assert!(segment(&lines("başlık\nalt başlık")).is_empty());
    }

    #[test]
    fn test_date_without_time_is_not_a_start() {
        assert!(!is_record_start("01/03/2024 GELEN FAST"));
        assert!(is_record_start("01/03/2024 10:00:00"));
    }
}
