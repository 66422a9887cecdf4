//! Go-style duration syntax.
//!
//! Durations are written as a sequence of decimal numbers, each with an
//! optional fraction and a mandatory unit suffix: `300ms`, `1.5h`,
//! `2h45m`, `-10s`. Valid units are `ns`, `us` (or `µs`/`μs`), `ms`, `s`,
//! `m`, and `h`. The bare string `0` is also accepted.
//!
//! Values are limited to the range of a signed 64-bit nanosecond count.

use std::fmt::Write as _;
use std::time::Duration;

use crate::error::TypeError;

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Parse a Go-style duration string into a signed nanosecond count.
pub fn parse_nanos(input: &str) -> Result<i128, TypeError> {
    let (negative, mut rest) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        Some(_) => (false, input),
        None => return Err(TypeError::invalid(input, "empty string")),
    };

    if rest == "0" {
        return Ok(0);
    }
    if rest.is_empty() {
        return Err(TypeError::invalid(input, "missing value"));
    }

    let mut total: i128 = 0;
    while !rest.is_empty() {
        let int_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let int_part = &rest[..int_end];
        rest = &rest[int_end..];

        let mut frac_part = "";
        if let Some(after_dot) = rest.strip_prefix('.') {
            let frac_end = after_dot
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(after_dot.len());
            frac_part = &after_dot[..frac_end];
            rest = &after_dot[frac_end..];
        }
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(TypeError::invalid(input, "expected a number"));
        }

        let unit_end = rest
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        rest = &rest[unit_end..];

        let scale: i128 = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => NANOS_PER_MICRO as i128,
            "ms" => NANOS_PER_MILLI as i128,
            "s" => NANOS_PER_SEC as i128,
            "m" => 60 * NANOS_PER_SEC as i128,
            "h" => 3_600 * NANOS_PER_SEC as i128,
            "" => return Err(TypeError::invalid(input, "missing unit")),
            other => return Err(TypeError::invalid(input, format!("unknown unit {other:?}"))),
        };

        // Anything longer than this cannot fit in an i64 nanosecond count.
        if int_part.len() > 20 {
            return Err(TypeError::DurationOverflow(input.to_string()));
        }
        let whole: i128 = if int_part.is_empty() {
            0
        } else {
            int_part
                .parse()
                .map_err(|_| TypeError::DurationOverflow(input.to_string()))?
        };

        let mut value = whole
            .checked_mul(scale)
            .ok_or_else(|| TypeError::DurationOverflow(input.to_string()))?;
        let mut place = scale;
        for digit in frac_part.bytes() {
            place /= 10;
            if place == 0 {
                break;
            }
            value += i128::from(digit - b'0') * place;
        }

        total += value;
        if total > i128::from(i64::MAX) {
            return Err(TypeError::DurationOverflow(input.to_string()));
        }
    }

    Ok(if negative { -total } else { total })
}

/// Parse a Go-style duration string, rejecting negative values.
pub fn parse_duration(input: &str) -> Result<Duration, TypeError> {
    let nanos = parse_nanos(input)?;
    if nanos < 0 {
        return Err(TypeError::NegativeDuration(input.to_string()));
    }
    // parse_nanos caps the magnitude at i64::MAX, which always fits in u64.
    Ok(Duration::from_nanos(nanos as u64))
}

/// Format a duration the way Go prints one: `0s`, `1.5ms`, `1m30s`, `2h0m0s`.
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < NANOS_PER_MICRO {
        return format!("{nanos}ns");
    }
    if nanos < NANOS_PER_MILLI {
        return format!("{}µs", fractional(nanos, NANOS_PER_MICRO));
    }
    if nanos < NANOS_PER_SEC {
        return format!("{}ms", fractional(nanos, NANOS_PER_MILLI));
    }

    let total_secs = duration.as_secs();
    let hours = total_secs / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = u128::from(total_secs % 60) * NANOS_PER_SEC + u128::from(duration.subsec_nanos());

    let mut out = String::new();
    if hours > 0 {
        let _ = write!(out, "{hours}h");
    }
    if hours > 0 || minutes > 0 {
        let _ = write!(out, "{minutes}m");
    }
    let _ = write!(out, "{}s", fractional(seconds, NANOS_PER_SEC));
    out
}

fn fractional(value: u128, unit: u128) -> String {
    let whole = value / unit;
    let frac = value % unit;
    if frac == 0 {
        return whole.to_string();
    }
    let width = unit.to_string().len() - 1;
    let digits = format!("{frac:0width$}");
    format!("{whole}.{}", digits.trim_end_matches('0'))
}

/// Serde adapter for `Duration` fields written as Go-style strings.
///
/// ```ignore
/// #[serde(with = "cachet_types::duration::serde_text")]
/// pub cleanup_interval: Duration,
/// ```
pub mod serde_text {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_duration(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}
