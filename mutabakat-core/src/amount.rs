//! Turkish-locale amount parsing.
//!
//! Statements and notifications print money as `1.234,56` (dot grouping,
//! comma decimal), sometimes with a space as the grouping separator and a
//! currency tag glued on either side.

/// Parse a Turkish-formatted amount into a signed float.
///
/// Never fails: anything unusable yields `0.0`. Callers treat `0.0` as
/// "no usable amount", since bank data does not carry zero-value movements.
pub fn parse_amount(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | ' '))
        .collect();

    let Some(first_digit) = cleaned.find(|c: char| c.is_ascii_digit()) else {
        return 0.0;
    };
    let negative = cleaned[..first_digit].contains('-');
    let body = cleaned[first_digit..].trim_end_matches(|c: char| !c.is_ascii_digit());

    let (int_part, frac_part) = match body.rsplit_once(',') {
        Some((int, frac)) if (1..=2).contains(&frac.len()) && frac.chars().all(|c| c.is_ascii_digit()) => {
            (int, frac)
        }
        _ => (body, ""),
    };

    let digits: String = int_part
        .chars()
        .filter(|c| !matches!(c, '.' | ' ' | ','))
        .collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return 0.0;
    }

    let literal = if frac_part.is_empty() {
        digits
    } else {
        format!("{digits}.{frac_part}")
    };

    match literal.parse::<f64>() {
        Ok(v) if negative => -v,
        Ok(v) => v,
        Err(_) => 0.0,
    }
}

/// Round to whole kuruş (two decimals).
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
