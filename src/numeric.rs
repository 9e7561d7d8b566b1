//! Number and duration parsing shared by the output parsers.
//!
//! Utilities print latencies as decimal milliseconds (`10.123`). Parsing them
//! through `f64` would turn `10.1` into `10.099999ms`, so the conversion to
//! [`Duration`] is done on the decimal digits directly.

use std::time::Duration;

const NANOS_PER_MILLI: u64 = 1_000_000;
/// Digits after the decimal point that still fit nanosecond precision.
const MAX_FRACTION_DIGITS: usize = 6;

/// Parses a non-negative decimal millisecond value such as `11.2` or `0.045`.
///
/// Digits beyond nanosecond precision are truncated.
pub fn parse_millis(text: &str) -> Option<Duration> {
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (text, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let whole_ms: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let kept = &fraction[..fraction.len().min(MAX_FRACTION_DIGITS)];
    let mut fraction_nanos: u64 = if kept.is_empty() { 0 } else { kept.parse().ok()? };
    for _ in kept.len()..MAX_FRACTION_DIGITS {
        fraction_nanos *= 10;
    }

    let nanos = whole_ms.checked_mul(NANOS_PER_MILLI)?.checked_add(fraction_nanos)?;
    Some(Duration::from_nanos(nanos))
}

/// Parses a percentage token (`0`, `100`, `33.3`) into a fraction of one.
///
/// Returns `None` when the text is not a plain non-negative number.
pub fn parse_percentage(text: &str) -> Option<f64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return None;
    }
    if let Ok(whole) = text.parse::<u32>() {
        return Some(f64::from(whole) / 100.0);
    }
    text.parse::<f64>().ok().map(|value| value / 100.0)
}

/// Serializes a [`Duration`] as fractional milliseconds.
pub mod millis {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(value.as_secs_f64() * 1000.0)
    }
}
