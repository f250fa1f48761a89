//! # Run configuration.
//!
//! [`Config`] is the fully-validated configuration object the CLI layer hands
//! to the engine: the immutable [`RetryPolicy`] plus the target [`Command`].
//! It also hosts the value parsers shared by flags and environment variables.
//!
//! # Example
//! ```
//! use std::time::Duration;
//! use retry::{Command, Config, RetryPolicy, parse_duration};
//!
//! let mut policy = RetryPolicy::default();
//! policy.backoff.first = parse_duration("25ms").unwrap();
//!
//! let cfg = Config::new(policy, Command::new("false", Vec::<String>::new())).unwrap();
//! assert_eq!(cfg.policy.backoff.first, Duration::from_millis(25));
//! ```

use std::time::Duration;

use crate::command::Command;
use crate::error::RetryError;
use crate::policies::RetryPolicy;

/// Environment variable overriding the attempt budget.
pub const ENV_ATTEMPTS: &str = "RETRY_ATTEMPTS";
/// Environment variable overriding the initial delay.
pub const ENV_DELAY: &str = "RETRY_DELAY";
/// Environment variable overriding the delay cap.
pub const ENV_MAX_DELAY: &str = "RETRY_MAX_DELAY";
/// Environment variable selecting the backoff strategy.
pub const ENV_BACKOFF: &str = "RETRY_BACKOFF";
/// Environment variable enabling quiet mode.
pub const ENV_QUIET: &str = "RETRY_BEQUIET";
/// Environment variable holding the `tracing` filter.
pub const ENV_LOG: &str = "RETRY_LOG";

/// Validated configuration for one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// How often and how patiently to retry.
    pub policy: RetryPolicy,
    /// What to run.
    pub command: Command,
}

impl Config {
    /// Bundles `policy` and `command`, rejecting an invalid policy.
    pub fn new(policy: RetryPolicy, command: Command) -> Result<Self, RetryError> {
        policy.validate()?;
        Ok(Self { policy, command })
    }
}

/// Parses a duration such as `25ms`, `2s`, `1.5s`, `+1m30s`.
///
/// Units: `ns`, `us`/`µs`, `ms`, `s`, `m`, `h`. A unit is required on every
/// number except a bare `0`. A leading `+` is allowed; negative durations are
/// rejected. Nanoseconds are summed as integers, so long spans stay exact.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let err = || format!("cannot parse {s:?} as time duration");

    let text = s.trim();
    let text = text.strip_prefix('+').unwrap_or(text);
    if text == "0" {
        return Ok(Duration::ZERO);
    }
    if text.is_empty() {
        return Err(err());
    }

    let mut total: u64 = 0;
    let mut rest = text;
    while !rest.is_empty() {
        let (whole, tail) = split_digits(rest);
        let (frac, tail) = match tail.strip_prefix('.') {
            Some(tail) => split_digits(tail),
            None => ("", tail),
        };
        if whole.is_empty() && frac.is_empty() {
            return Err(err());
        }

        let split = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, next) = tail.split_at(split);
        let scale: u64 = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60_000_000_000,
            "h" => 3_600_000_000_000,
            _ => return Err(err()),
        };

        let whole: u64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| err())?
        };
        let nanos = whole
            .checked_mul(scale)
            .and_then(|n| n.checked_add(fraction_nanos(frac, scale)))
            .ok_or_else(err)?;
        total = total.checked_add(nanos).ok_or_else(err)?;
        rest = next;
    }

    Ok(Duration::from_nanos(total))
}

fn split_digits(s: &str) -> (&str, &str) {
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(split)
}

/// `0.<frac>` of `scale` nanoseconds, truncated. Digits past `u64` precision are dropped.
fn fraction_nanos(frac: &str, scale: u64) -> u64 {
    let mut value: u64 = 0;
    let mut div: u64 = 1;
    for digit in frac.bytes().map(|b| u64::from(b - b'0')) {
        if value > (u64::MAX - 9) / 10 || div > u64::MAX / 10 {
            break;
        }
        value = value * 10 + digit;
        div *= 10;
    }
    (u128::from(value) * u128::from(scale) / u128::from(div)) as u64
}

/// Parses an attempt count.
pub fn parse_attempts(s: &str) -> Result<u32, String> {
    s.trim()
        .parse::<u32>()
        .map_err(|_| format!("cannot parse {s:?} as a number"))
}

/// Parses a boolean: `1 t T TRUE true True` or `0 f F FALSE false False`.
pub fn parse_bool(s: &str) -> Result<bool, String> {
    match s.trim() {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(format!("cannot parse {s:?} as boolean")),
    }
}
