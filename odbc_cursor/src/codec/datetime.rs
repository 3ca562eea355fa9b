//! Lenient date, time and timestamp parsing plus canonical formatting.
//!
//! Input is split into runs of ASCII digits; whatever separates them is
//! ignored, so `2025-02-13`, `2025/02/13` and `20250213` parse the same.
//! A single compact run is read positionally as `YYYYMMDDHHMMSS`, with 6
//! and 12 digit forms carrying a two-digit year.

use crate::error::{DriverError, Result, Warning};
use crate::protocol::types::{Date, Time, Timestamp};
use std::time::{SystemTime, UNIX_EPOCH};

/// Two-digit years up to this value land in the 2000s.
const YEAR_PIVOT: u32 = 69;
const NANOS_DIGITS: usize = 9;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateOptions {
    /// Locale fractional-seconds separator accepted alongside `.`.
    pub decimal_separator: Option<char>,
    /// Coerce a zero month or day to 1 instead of failing.
    pub coerce_invalid: bool,
}

#[derive(Debug, Clone, Copy)]
struct Run<'a> {
    digits: &'a str,
    /// Non-digit character right before the run, if any.
    preceded_by: Option<char>,
}

fn digit_runs(text: &str) -> Vec<Run<'_>> {
    let mut runs = Vec::new();
    let mut start = None;
    let mut prev = None;
    let mut run_prefix = None;
    for (i, ch) in text.char_indices() {
        if ch.is_ascii_digit() {
            if start.is_none() {
                start = Some(i);
                run_prefix = prev;
            }
        } else {
            if let Some(s) = start.take() {
                runs.push(Run {
                    digits: &text[s..i],
                    preceded_by: run_prefix,
                });
            }
            prev = Some(ch);
        }
    }
    if let Some(s) = start {
        runs.push(Run {
            digits: &text[s..],
            preceded_by: run_prefix,
        });
    }
    runs
}

fn is_fraction_mark(ch: Option<char>, options: &DateOptions) -> bool {
    matches!(ch, Some('.')) || (ch.is_some() && ch == options.decimal_separator)
}

/// Splits a trailing fractional-seconds run off the component runs. A run
/// only counts as a fraction when it follows the seconds.
fn split_fraction<'a>(
    mut runs: Vec<Run<'a>>,
    options: &DateOptions,
) -> (Vec<Run<'a>>, Option<&'a str>) {
    let after_seconds = match runs.len() {
        0 | 1 => false,
        2 => runs[0].digits.len() >= 12,
        n => n > 6,
    };
    let fraction = match runs.last() {
        Some(last) if after_seconds && is_fraction_mark(last.preceded_by, options) => {
            Some(last.digits)
        }
        _ => None,
    };
    if fraction.is_some() {
        runs.pop();
    }
    (runs, fraction)
}

/// Digit run value, saturating instead of overflowing.
fn value(digits: &str) -> u32 {
    digits.bytes().fold(0u32, |acc, d| {
        acc.saturating_mul(10).saturating_add(u32::from(d - b'0'))
    })
}

fn expand_year(digits: &str) -> u32 {
    let y = value(digits);
    if digits.len() > 2 {
        y
    } else if y <= YEAR_PIVOT {
        2000 + y
    } else {
        1900 + y
    }
}

/// Nanoseconds from a fractional-seconds digit run.
fn nanos(digits: &str, warnings: &mut Vec<Warning>) -> u32 {
    let kept = &digits[..digits.len().min(NANOS_DIGITS)];
    if digits[kept.len()..].bytes().any(|b| b != b'0') {
        warnings.push(Warning::fractional_truncation(format!(
            "Fractional seconds .{} truncated to nanoseconds",
            digits
        )));
    }
    value(kept) * 10u32.pow((NANOS_DIGITS - kept.len()) as u32)
}

fn invalid(text: &str, what: &str) -> DriverError {
    DriverError::InvalidDatetime(format!("Invalid {} in '{}'", what, text))
}

/// Parses a timestamp. Dates without a time part get midnight.
pub fn parse_timestamp(text: &str, options: &DateOptions) -> Result<(Timestamp, Vec<Warning>)> {
    let (runs, fraction) = split_fraction(digit_runs(text), options);
    if runs.is_empty() {
        return Err(invalid(text, "timestamp"));
    }

    // year, month, day, hour, minute, second
    let mut parts = [0u32; 6];
    if let [only] = runs.as_slice() {
        let d = only.digits;
        let (year_len, canonical) = match d.len() {
            6 | 12 => (2, format!("{:0<12}", d)),
            _ => {
                let mut c = format!("{:0<14}", d);
                c.truncate(14);
                (4, c)
            }
        };
        let (year, rest) = canonical.split_at(year_len);
        parts[0] = expand_year(year);
        for (slot, chunk) in parts[1..].iter_mut().zip(rest.as_bytes().chunks(2)) {
            *slot = chunk
                .iter()
                .fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0'));
        }
    } else {
        for (slot, run) in parts.iter_mut().zip(runs.iter()) {
            *slot = value(run.digits);
        }
        parts[0] = expand_year(runs[0].digits);
    }

    let [year, mut month, mut day, hour, minute, second] = parts;
    if month == 0 || day == 0 {
        if !options.coerce_invalid {
            return Err(invalid(text, "month or day"));
        }
        month = month.max(1);
        day = day.max(1);
    }
    if year > i16::MAX as u32 {
        return Err(invalid(text, "year"));
    }
    if month > 12 || day > 31 {
        return Err(invalid(text, "month or day"));
    }
    if hour > 23 || minute > 59 || second > 59 {
        return Err(invalid(text, "time of day"));
    }

    let mut warnings = Vec::new();
    let fraction = fraction.map_or(0, |f| nanos(f, &mut warnings));
    let ts = Timestamp {
        year: year as i16,
        month: month as u16,
        day: day as u16,
        hour: hour as u16,
        minute: minute as u16,
        second: second as u16,
        fraction,
    };
    Ok((ts, warnings))
}

/// Parses a date; a non-zero time part is dropped with a warning.
pub fn parse_date(text: &str, options: &DateOptions) -> Result<(Date, Vec<Warning>)> {
    let (ts, mut warnings) = parse_timestamp(text, options)?;
    if ts.time() != Time::default() || ts.fraction != 0 {
        warnings.push(Warning::fractional_truncation(format!(
            "Time part of '{}' discarded",
            text.trim()
        )));
    }
    Ok((ts.date(), warnings))
}

/// Parses a time of day. Up to three runs are read as hour, minute and
/// second; overflowing seconds and minutes carry upward and the hour
/// saturates. Anything that looks like a full timestamp goes through
/// [`parse_timestamp`].
pub fn parse_time(text: &str, options: &DateOptions) -> Result<(Time, Vec<Warning>)> {
    let all_runs = digit_runs(text);
    let looks_like_timestamp = match all_runs.as_slice() {
        [] => return Err(invalid(text, "time")),
        [only] => only.digits.len() > 6,
        [first, ..] => all_runs.len() > 4 || (first.digits.len() == 4 && all_runs.len() >= 3),
    };
    if looks_like_timestamp {
        let (ts, mut warnings) = parse_timestamp(text, options)?;
        if ts.fraction != 0 {
            warnings.push(Warning::fractional_truncation(format!(
                "Fractional seconds of '{}' discarded",
                text.trim()
            )));
        }
        return Ok((ts.time(), warnings));
    }

    let mut warnings = Vec::new();
    let mut runs = all_runs;
    if runs.len() == 4 && is_fraction_mark(runs[3].preceded_by, options) {
        if let Some(f) = runs.pop() {
            if f.digits.bytes().any(|b| b != b'0') {
                warnings.push(Warning::fractional_truncation(format!(
                    "Fractional seconds of '{}' discarded",
                    text.trim()
                )));
            }
        }
    }

    let mut hms = [0u32; 3];
    if let [only] = runs.as_slice() {
        // compact HH, HHMM or HHMMSS
        let padded = format!("{:0<6}", only.digits);
        for (slot, chunk) in hms.iter_mut().zip(padded.as_bytes().chunks(2)) {
            *slot = chunk
                .iter()
                .fold(0u32, |acc, b| acc * 10 + u32::from(b - b'0'));
        }
    } else {
        for (slot, run) in hms.iter_mut().zip(runs.iter()) {
            *slot = value(run.digits);
        }
    }

    let [mut hour, mut minute, mut second] = hms;
    if second >= 60 {
        minute = minute.saturating_add(second / 60);
        second %= 60;
    }
    if minute >= 60 {
        hour = hour.saturating_add(minute / 60);
        minute %= 60;
    }
    let time = Time {
        hour: u16::try_from(hour).unwrap_or(u16::MAX),
        minute: minute as u16,
        second: second as u16,
    };
    Ok((time, warnings))
}

pub fn format_date(d: &Date) -> String {
    format!("{:04}-{:02}-{:02}", d.year, d.month, d.day)
}

pub fn format_time(t: &Time) -> String {
    format!("{:02}:{:02}:{:02}", t.hour, t.minute, t.second)
}

/// `YYYY-MM-DD HH:MM:SS[.fffffffff]` with trailing fraction zeros trimmed.
pub fn format_timestamp(ts: &Timestamp) -> String {
    let mut out = format!("{} {}", format_date(&ts.date()), format_time(&ts.time()));
    if ts.fraction != 0 {
        let frac = format!("{:09}", ts.fraction);
        out.push('.');
        out.push_str(frac.trim_end_matches('0'));
    }
    out
}

/// Current UTC date.
pub fn today() -> Date {
    let days = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() / 86_400)
        .unwrap_or(0) as i64;
    civil_from_days(days)
}

/// Days since 1970-01-01 to a proleptic Gregorian date.
fn civil_from_days(days: i64) -> Date {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);
    Date {
        year: year as i16,
        month: month as u16,
        day: day as u16,
    }
}
