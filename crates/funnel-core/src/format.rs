#![forbid(unsafe_code)]

//! Display formatting helpers.
//!
//! All functions are pure. Currency output follows US locale conventions:
//! dollar sign, comma grouping, no decimal places.

use std::fmt::Display;

/// Maximum digits kept by [`format_phone_input`].
pub const PHONE_DIGITS: usize = 10;

/// Format a dollar amount as `$X,XXX` with no decimal places.
///
/// Rounds half away from zero. Negative amounts render as `-$X`.
/// Non-finite input renders as `$NaN` or `$∞`.
#[must_use]
pub fn format_currency(amount: f64) -> String {
    if amount.is_nan() {
        return "$NaN".to_string();
    }
    let sign = if amount.is_sign_negative() && amount.round() != 0.0 {
        "-"
    } else {
        ""
    };
    if amount.is_infinite() {
        return format!("{sign}$∞");
    }
    let whole = format!("{:.0}", amount.abs().round());
    format!("{sign}${}", group_thousands(&whole))
}

/// Format a value as a percentage: `value%`.
#[must_use]
pub fn format_percent(value: impl Display) -> String {
    format!("{value}%")
}

/// Mask a phone field as the user types.
///
/// Non-digits are dropped, at most [`PHONE_DIGITS`] digits are kept, and
/// punctuation is re-inserted as digits accumulate:
///
/// | digits | output            |
/// |--------|-------------------|
/// | 0      | ``                |
/// | 1–3    | `(ddd`            |
/// | 4–6    | `(ddd) ddd`       |
/// | 7–10   | `(ddd) ddd-dddd`  |
///
/// Re-applying the mask to its own output is a no-op.
#[must_use]
pub fn format_phone_input(raw: &str) -> String {
    let digits = digits_only(raw);
    let digits = &digits[..digits.len().min(PHONE_DIGITS)];
    match digits.len() {
        0 => String::new(),
        1..=3 => format!("({digits}"),
        4..=6 => format!("({}) {}", &digits[..3], &digits[3..]),
        _ => format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..]),
    }
}

/// Keep only ASCII digits.
#[must_use]
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
