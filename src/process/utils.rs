/// Trim whitespace; an empty cell is a missing value.
pub fn clean_cell(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Comma-decimal locale → point-decimal. `"12,5"` → `"12.5"`.
pub fn normalize_decimal(s: &str) -> String {
    s.replace(',', ".")
}

/// Parse a measurement in either decimal locale. Unparseable or non-finite → None.
pub fn parse_float(raw: &str) -> Option<f64> {
    let cleaned = clean_cell(raw)?;
    normalize_decimal(cleaned)
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Parse a year exactly: plain digits, optionally followed by a point-decimal zero
/// fraction (`"2006"`, `"2006.0"`). Signs, exponents and comma decimals are rejected.
pub fn parse_year(raw: &str) -> Option<i64> {
    let cleaned = clean_cell(raw)?;
    let digits = match cleaned.split_once('.') {
        Some((int, frac)) if !frac.is_empty() && frac.bytes().all(|b| b == b'0') => int,
        Some(_) => return None,
        None => cleaned,
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<i64>().ok()
}
