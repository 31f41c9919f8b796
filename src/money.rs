//! Conversion between integer cents and display strings.
//!
//! All monetary values in the crate are stored as whole minor-currency units
//! (cents) to avoid floating-point drift. Display formatting follows the
//! Brazilian convention: `.` for thousands grouping, `,` as the decimal
//! separator.

use regex::Regex;
use std::sync::OnceLock;

fn amount_token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{1,6})(?:[.,](\d{1,2}))?").unwrap())
}

/// Formats cents as a display amount, e.g. `1870` -> `"18,70"`.
///
/// Never fails: zero and negative inputs still produce a string. The sign is
/// carried by the whole part only; the fractional part is always the absolute
/// two-digit remainder.
pub fn cents_to_display(cents: i64) -> String {
    let abs = cents.unsigned_abs();
    let whole = abs / 100;
    let frac = abs % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if cents < 0 { "-" } else { "" };
    format!("{}{},{:02}", sign, grouped, frac)
}

/// Extracts the first monetary token from free text as cents.
///
/// Matches a 1-6 digit integer part optionally followed by `,` or `.` and a
/// 1-2 digit fraction. A missing fraction reads as `,00`; a single fraction
/// digit is tenths. Returns `None` when no numeric token is present.
///
/// This is a fallback for when the extraction model is bypassed; the primary
/// path lets the model produce `amount_cents` directly.
pub fn parse_amount_from_text(text: &str) -> Option<i64> {
    let caps = amount_token_re().captures(text)?;

    let whole: i64 = caps.get(1)?.as_str().parse().ok()?;
    let frac = match caps.get(2) {
        Some(m) => {
            let raw = m.as_str();
            let value: i64 = raw.parse().ok()?;
            if raw.len() == 1 {
                value * 10
            } else {
                value
            }
        }
        None => 0,
    };

    Some(whole * 100 + frac)
}
