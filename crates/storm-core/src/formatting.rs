//! Number formatting for chart labels and summaries.

use crate::models::Measure;

/// Suffixes used by [`format_compact_dollars`], largest first.
const COMPACT_UNITS: &[(f64, &str)] = &[
    (1_000_000_000_000.0, "T"),
    (1_000_000_000.0, "B"),
    (1_000_000.0, "M"),
    (1_000.0, "K"),
];

/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use storm_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5, 1), "1,234.5");
/// assert_eq!(format_number(15935016000.0, 0), "15,935,016,000");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut out = String::with_capacity(fixed.len() + fixed.len() / 3 + 1);
    // "-0" is not a useful label.
    if value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0') {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Format a whole count with thousands separators.
///
/// ```
/// use storm_core::formatting::format_count;
///
/// assert_eq!(format_count(5633), "5,633");
/// assert_eq!(format_count(7), "7");
/// ```
pub fn format_count(value: u64) -> String {
    group_thousands(&value.to_string())
}

/// Format a dollar amount with a magnitude suffix, one decimal place.
///
/// Amounts under a thousand dollars are shown in full.
///
/// ```
/// use storm_core::formatting::format_compact_dollars;
///
/// assert_eq!(format_compact_dollars(144_657_709_807.0), "$144.7B");
/// assert_eq!(format_compact_dollars(3_000_000.0), "$3.0M");
/// assert_eq!(format_compact_dollars(10_000.0), "$10.0K");
/// assert_eq!(format_compact_dollars(250.0), "$250");
/// ```
pub fn format_compact_dollars(amount: f64) -> String {
    let abs = amount.abs();
    let sign = if amount < 0.0 { "-" } else { "" };
    for &(threshold, suffix) in COMPACT_UNITS {
        // Bump to the larger unit when rounding would print "1000.0".
        if abs >= threshold * 0.99995 {
            return format!("{}${:.1}{}", sign, abs / threshold, suffix);
        }
    }
    format!("{}${}", sign, format_number(abs, 0))
}

/// Short label for a value of `measure`, as drawn next to a chart bar.
pub fn format_measure(measure: Measure, value: f64) -> String {
    match measure {
        Measure::Fatalities => format_count(value.round().max(0.0) as u64),
        Measure::Damage => format_compact_dollars(value),
    }
}

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ── Tests ──────────────────────────────────────────────────────────────────────
