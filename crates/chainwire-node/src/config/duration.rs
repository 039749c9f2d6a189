use chainwire_types::{ChainwireError, ChainwireResult};
use std::time::Duration;

/// Parses durations in the `time.ParseDuration` notation:
/// a sequence of decimal numbers with unit suffixes, e.g. `300ms`, `20s`,
/// `1m30s`, `1.5h`. A bare `0` is accepted.
pub fn parse_duration(input: &str) -> ChainwireResult<Duration> {
    let s = input.trim();
    if s.is_empty() {
        return Err(invalid(input, "empty string"));
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }
    if s.starts_with('-') {
        return Err(invalid(input, "negative durations are not allowed"));
    }

    let mut total_nanos: f64 = 0.0;
    let mut rest = s.trim_start_matches('+');

    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| invalid(input, "missing unit"))?;
        if number_len == 0 {
            return Err(invalid(input, "expected a number"));
        }
        let value: f64 = rest[..number_len]
            .parse()
            .map_err(|_| invalid(input, "malformed number"))?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60.0 * 1e9,
            "h" => 3600.0 * 1e9,
            other => return Err(invalid(input, &format!("unknown unit {:?}", other))),
        };
        rest = &rest[unit_len..];
        total_nanos += value * scale;
    }

    if !total_nanos.is_finite() || total_nanos > u64::MAX as f64 {
        return Err(invalid(input, "out of range"));
    }

    Ok(Duration::from_nanos(total_nanos.round() as u64))
}

fn invalid(input: &str, reason: &str) -> ChainwireError {
    ChainwireError::InvalidDuration(format!("{:?}: {}", input, reason))
}
