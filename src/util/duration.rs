use std::time::Duration;
use thiserror::Error;

/// Errors from [`parse_duration`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DurationError {
    #[error("Empty duration string")]
    Empty,
    #[error("Invalid duration {0:?}: expected forms like \"30s\", \"1m\" or \"1h30m\"")]
    Invalid(String),
    #[error("Duration must be greater than zero")]
    Zero,
}

/// Parse an interval string like `"30s"`, `"1m"` or `"1h30m"`.
///
/// The grammar is a sequence of `<integer><unit>` components with units
/// `ms`, `s`, `m`, `h`. Components are summed, so `"1h30m"` and `"90m"`
/// are equivalent. A zero total is rejected: a polling interval of zero
/// would spin the scheduler.
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(DurationError::Empty);
    }

    let invalid = || DurationError::Invalid(input.to_string());
    let bytes = s.as_bytes();
    let mut total = Duration::ZERO;
    let mut i = 0;

    while i < bytes.len() {
        let digits_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == digits_start {
            return Err(invalid());
        }
        let value: u64 = s[digits_start..i].parse().map_err(|_| invalid())?;

        let unit_start = i;
        while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
            i += 1;
        }
        let component = match &s[unit_start..i] {
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(value.checked_mul(60).ok_or_else(invalid)?),
            "h" => Duration::from_secs(value.checked_mul(3600).ok_or_else(invalid)?),
            _ => return Err(invalid()),
        };

        total = total.checked_add(component).ok_or_else(invalid)?;
    }

    if total.is_zero() {
        return Err(DurationError::Zero);
    }
    Ok(total)
}
