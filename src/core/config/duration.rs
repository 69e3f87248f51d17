//! Duration strings as they appear in settings files: `"300ms"`, `"30s"`,
//! `"1m30s"`, `"1.5h"`. A bare `"0"` is accepted as zero.

use std::time::Duration;

/// Parse a duration string made of one or more `<number><unit>` segments.
/// Units: `ns`, `us`/`µs`, `ms`, `s`, `m`, `h`. Returns `None` on anything
/// else, including negative values.
pub fn parse_duration(input: &str) -> Option<Duration> {
    let raw = input.trim();
    if raw.is_empty() {
        return None;
    }
    if raw == "0" {
        return Some(Duration::ZERO);
    }

    let mut rest = raw;
    let mut total_nanos: f64 = 0.0;

    while !rest.is_empty() {
        let split_at = rest
            .find(|ch: char| !(ch.is_ascii_digit() || ch == '.'))
            .unwrap_or(rest.len());
        if split_at == 0 {
            return None;
        }
        let amount = rest[..split_at].parse::<f64>().ok()?;
        rest = &rest[split_at..];

        let unit_len = rest
            .find(|ch: char| ch.is_ascii_digit() || ch == '.')
            .unwrap_or(rest.len());
        let multiplier = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60.0 * 1e9,
            "h" => 3600.0 * 1e9,
            _ => return None,
        };
        rest = &rest[unit_len..];
        total_nanos += amount * multiplier;
    }

    if !total_nanos.is_finite() || total_nanos > u64::MAX as f64 {
        return None;
    }
    Some(Duration::from_nanos(total_nanos.round() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_units() {
        assert_eq!(parse_duration("30s"), Some(Duration::from_secs(30)));
        assert_eq!(parse_duration("300ms"), Some(Duration::from_millis(300)));
        assert_eq!(parse_duration("5m"), Some(Duration::from_secs(300)));
        assert_eq!(parse_duration("1h"), Some(Duration::from_secs(3600)));
        assert_eq!(parse_duration("250us"), Some(Duration::from_micros(250)));
        assert_eq!(parse_duration("10ns"), Some(Duration::from_nanos(10)));
    }

    #[test]
    fn compound_and_fractional() {
        assert_eq!(parse_duration("1m30s"), Some(Duration::from_secs(90)));
        assert_eq!(parse_duration("1.5h"), Some(Duration::from_secs(5400)));
        assert_eq!(parse_duration("2h45m"), Some(Duration::from_secs(9900)));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("30"), None);
        assert_eq!(parse_duration("s"), None);
        assert_eq!(parse_duration("10 days"), None);
        assert_eq!(parse_duration("-5s"), None);
        assert_eq!(parse_duration("1d"), None);
    }

    #[test]
    fn zero() {
        assert_eq!(parse_duration("0"), Some(Duration::ZERO));
        assert_eq!(parse_duration("0s"), Some(Duration::ZERO));
    }
}
