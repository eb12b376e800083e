use chrono::{DateTime, NaiveDate};

/// Format a quantity with thousands separators: 1,234 units
pub fn units(val: i64) -> String {
    let digits = val.unsigned_abs().to_string();
    let mut with_commas = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if val < 0 {
        format!("-{with_commas}")
    } else {
        with_commas
    }
}

/// Render a stored date as a short US-style date: `Jan 5, 2025`.
/// Accepts plain `YYYY-MM-DD` and RFC 3339 timestamps; anything else is
/// returned unchanged.
pub fn short_date(raw: &str) -> String {
    let trimmed = raw.trim();
    let date = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(trimmed).ok().map(|d| d.date_naive()))
        .or_else(|| {
            trimmed
                .get(..10)
                .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
        });
    match date {
        Some(d) => d.format("%b %-d, %Y").to_string(),
        None => raw.to_string(),
    }
}
