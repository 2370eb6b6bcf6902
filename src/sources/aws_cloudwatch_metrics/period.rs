use std::{sync::LazyLock, time::Duration};

use regex::Regex;
use snafu::Snafu;

const NANOS_PER_MINUTE: u128 = 60 * 1_000_000_000;

// An optional sign followed by one or more `<number><unit>` pairs, or a bare `0`.
static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[-+]?(?:(?:(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+)(?:ns|us|µs|μs|ms|s|m|h))+|0)$")
        .expect("invalid regex")
});

static COMPONENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]+(?:\.[0-9]*)?|\.[0-9]+)(ns|us|µs|μs|ms|s|m|h)").expect("invalid regex")
});

#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum PeriodError {
    #[snafu(display("invalid duration {:?}", input))]
    Malformed { input: String },
    #[snafu(display("duration {:?} must be positive", input))]
    NotPositive { input: String },
    #[snafu(display("duration {:?} is not a whole number of minutes", input))]
    NotWholeMinutes { input: String },
    #[snafu(display("duration {:?} is too long", input))]
    TooLong { input: String },
}

fn unit_nanos(unit: &str) -> f64 {
    match unit {
        "ns" => 1.0,
        "us" | "µs" | "μs" => 1e3,
        "ms" => 1e6,
        "s" => 1e9,
        "m" => 60e9,
        _ => 3600e9,
    }
}

/// Parses an aggregation period such as `"1m"`, `"300s"` or `"1h30m"`.
///
/// Accepts the `<number><unit>` sequences understood by Go's `time.ParseDuration`. The result
/// must be positive, a whole number of minutes, and fit the API's 32-bit period field.
pub fn parse_period(input: &str) -> Result<Duration, PeriodError> {
    if !DURATION.is_match(input) {
        return MalformedSnafu { input }.fail();
    }

    let nanos: f64 = COMPONENT
        .captures_iter(input)
        .map(|caps| {
            let value: f64 = caps[1].parse().unwrap_or(f64::INFINITY);
            value * unit_nanos(&caps[2])
        })
        .sum();

    if !nanos.is_finite() || nanos > i64::MAX as f64 {
        return MalformedSnafu { input }.fail();
    }
    if input.starts_with('-') || nanos < 1.0 {
        return NotPositiveSnafu { input }.fail();
    }

    let nanos = nanos.round() as u128;
    if nanos % NANOS_PER_MINUTE != 0 {
        return NotWholeMinutesSnafu { input }.fail();
    }

    let secs = (nanos / 1_000_000_000) as u64;
    if secs > i32::MAX as u64 {
        return TooLongSnafu { input }.fail();
    }

    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_go_durations() {
        let cases = [
            ("1m", 60),
            ("5m", 300),
            ("60s", 60),
            ("1h", 3600),
            ("1h30m", 5400),
            ("1.5h", 5400),
            (".5h", 1800),
            ("+1m", 60),
            ("120000ms", 120),
        ];

        for (input, secs) in cases {
            assert_eq!(parse_period(input), Ok(Duration::from_secs(secs)), "{input}");
        }
    }

    #[test]
    fn rejects_malformed() {
        for input in ["1mins", "", "m", "1", "1 m", "1M", "one minute", "1m-"] {
            assert_eq!(
                parse_period(input),
                Err(PeriodError::Malformed {
                    input: input.to_string()
                }),
                "{input}"
            );
        }
    }

    #[test]
    fn rejects_non_positive() {
        for input in ["0", "0s", "-1m"] {
            assert!(
                matches!(parse_period(input), Err(PeriodError::NotPositive { .. })),
                "{input}"
            );
        }
    }

    #[test]
    fn rejects_partial_minutes() {
        for input in ["30s", "90s", "1.5m", "1m1s"] {
            assert!(
                matches!(parse_period(input), Err(PeriodError::NotWholeMinutes { .. })),
                "{input}"
            );
        }
    }

    #[test]
    fn rejects_too_long() {
        assert!(matches!(
            parse_period("1000000h"),
            Err(PeriodError::TooLong { .. })
        ));
    }
}
