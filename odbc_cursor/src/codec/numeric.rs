//! Fixed-width numeric parsing from cell text.

use crate::error::{DriverError, Result, Warning};

/// Parses an integer, accepting a decimal or exponent form whose fractional
/// part is dropped with a warning.
pub fn parse_integer(text: &str) -> Result<(i128, Vec<Warning>)> {
    let t = text.trim();
    if let Ok(v) = t.parse::<i128>() {
        return Ok((v, Vec::new()));
    }

    let v = parse_f64(t)?;
    let whole = v.trunc();
    if whole < i128::MIN as f64 || whole >= i128::MAX as f64 {
        return Err(DriverError::Overflow(format!(
            "Numeric value out of range: {}",
            t
        )));
    }
    let mut warnings = Vec::new();
    if whole != v {
        warnings.push(Warning::fractional_truncation(format!(
            "Fractional part of {} discarded",
            t
        )));
    }
    Ok((whole as i128, warnings))
}

/// Parses and narrows to `T`, failing instead of clamping.
pub fn to_integer<T>(text: &str, target: &str) -> Result<(T, Vec<Warning>)>
where
    T: TryFrom<i128>,
{
    let (v, warnings) = parse_integer(text)?;
    let narrowed = T::try_from(v).map_err(|_| {
        DriverError::Overflow(format!("Value {} does not fit in {}", v, target))
    })?;
    Ok((narrowed, warnings))
}

pub fn parse_f64(text: &str) -> Result<f64> {
    let t = text.trim();
    let v = t
        .parse::<f64>()
        .map_err(|_| DriverError::InvalidValue(format!("Not a number: '{}'", t)))?;
    if v.is_nan() {
        return Err(DriverError::InvalidValue(format!("Not a number: '{}'", t)));
    }
    if v.is_infinite() {
        return Err(DriverError::Overflow(format!(
            "Numeric value out of range: {}",
            t
        )));
    }
    Ok(v)
}

pub fn parse_f32(text: &str) -> Result<f32> {
    let v = parse_f64(text)?;
    if v.abs() > f64::from(f32::MAX) {
        return Err(DriverError::Overflow(format!(
            "Value {} does not fit in FLOAT",
            text.trim()
        )));
    }
    Ok(v as f32)
}

/// Bit values are 0 or 1; anything strictly between becomes 1 with a warning.
pub fn parse_bit(text: &str) -> Result<(u8, Vec<Warning>)> {
    let t = text.trim();
    if t.eq_ignore_ascii_case("true") {
        return Ok((1, Vec::new()));
    }
    if t.eq_ignore_ascii_case("false") {
        return Ok((0, Vec::new()));
    }
    let v = parse_f64(t)?;
    if v == 0.0 {
        Ok((0, Vec::new()))
    } else if v == 1.0 {
        Ok((1, Vec::new()))
    } else if v > 0.0 && v < 2.0 {
        Ok((
            1,
            vec![Warning::fractional_truncation(format!(
                "Bit value {} truncated to 1",
                t
            ))],
        ))
    } else {
        Err(DriverError::Overflow(format!("Value {} is not a bit", t)))
    }
}
