//! Keyword matching helpers for Turkish text.

/// Lowercase for keyword matching.
///
/// All Turkish `i` variants (`I`, `İ`, `ı`, `i`) fold to ASCII `i`, so
/// patterns are written with a plain `i` and match text printed in any case.
pub fn fold(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            'I' | 'İ' | 'ı' => out.push('i'),
            other => out.extend(other.to_lowercase()),
        }
    }
    out
}
