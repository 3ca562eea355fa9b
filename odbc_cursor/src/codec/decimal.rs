//! Packed decimal codec for the 128-bit `Numeric` struct.
//!
//! The magnitude is held as eight 16-bit little-endian limbs. Text is folded
//! in four digits at a time; rescaling multiplies or divides the whole limb
//! array by ten.
//!
//! # Truncation
//!
//! Dropping non-zero fractional digits is a warning (01S07). Dropping
//! non-zero whole-number digits, or needing more digits than the requested
//! precision, fails with [`DriverError::Overflow`].

use crate::error::{DriverError, Result, Warning};
use crate::protocol::types::{Numeric, MAX_NUMERIC_LEN};

const LIMBS: usize = MAX_NUMERIC_LEN / 2;

/// Largest precision a 128-bit magnitude can always hold.
pub const MAX_PRECISION: u8 = 38;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Magnitude([u16; LIMBS]);

impl Magnitude {
    /// `self = self * mul + add`. Returns false on overflow.
    fn mul_add(&mut self, mul: u32, add: u32) -> bool {
        let mut carry = add;
        for limb in self.0.iter_mut() {
            let v = u32::from(*limb) * mul + carry;
            *limb = (v & 0xFFFF) as u16;
            carry = v >> 16;
        }
        carry == 0
    }

    /// `self /= div`, returning the remainder. Borrows run from the most
    /// significant limb down.
    fn div_rem(&mut self, div: u32) -> u32 {
        let mut rem = 0u32;
        for limb in self.0.iter_mut().rev() {
            let cur = (rem << 16) | u32::from(*limb);
            *limb = (cur / div) as u16;
            rem = cur % div;
        }
        rem
    }

    fn is_zero(&self) -> bool {
        self.0.iter().all(|&l| l == 0)
    }

    fn digit_count(&self) -> usize {
        let mut m = *self;
        let mut count = 0;
        while !m.is_zero() {
            m.div_rem(10);
            count += 1;
        }
        count
    }

    fn to_bytes(self) -> [u8; MAX_NUMERIC_LEN] {
        let mut out = [0u8; MAX_NUMERIC_LEN];
        for (i, limb) in self.0.iter().enumerate() {
            out[2 * i..2 * i + 2].copy_from_slice(&limb.to_le_bytes());
        }
        out
    }

    fn from_bytes(bytes: &[u8; MAX_NUMERIC_LEN]) -> Self {
        let mut m = Magnitude::default();
        for (i, limb) in m.0.iter_mut().enumerate() {
            *limb = u16::from_le_bytes([bytes[2 * i], bytes[2 * i + 1]]);
        }
        m
    }

    fn to_digits(self) -> String {
        if self.is_zero() {
            return "0".to_string();
        }
        let mut m = self;
        let mut digits = Vec::new();
        while !m.is_zero() {
            let d = m.div_rem(10);
            digits.push(b'0' + d as u8);
        }
        digits.reverse();
        String::from_utf8(digits).unwrap_or_default()
    }
}

fn overflow(text: &str) -> DriverError {
    DriverError::Overflow(format!("Numeric value out of range: {}", text))
}

/// Encodes decimal text at the requested precision and scale.
///
/// A precision of 0 means [`MAX_PRECISION`]. Exponent notation is accepted
/// and expanded first.
pub fn text_to_numeric(text: &str, precision: u8, scale: i8) -> Result<(Numeric, Vec<Warning>)> {
    let trimmed = text.trim();
    if trimmed.contains(['e', 'E']) {
        let v: f64 = trimmed
            .parse()
            .map_err(|_| DriverError::InvalidValue(format!("Not a number: '{}'", trimmed)))?;
        if !v.is_finite() {
            return Err(overflow(trimmed));
        }
        return text_to_numeric(&format!("{}", v), precision, scale);
    }

    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let (whole, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if (whole.is_empty() && frac.is_empty())
        || !whole.bytes().all(|b| b.is_ascii_digit())
        || !frac.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(DriverError::InvalidValue(format!(
            "Not a number: '{}'",
            trimmed
        )));
    }

    let precision = if precision == 0 { MAX_PRECISION } else { precision };
    let mut warnings = Vec::new();

    // fractional digits past the requested scale never reach the limbs
    let keep = usize::try_from(scale.max(0)).unwrap_or(0).min(frac.len());
    let (frac, dropped) = frac.split_at(keep);
    if dropped.bytes().any(|b| b != b'0') {
        warnings.push(Warning::fractional_truncation(format!(
            "Fractional digits of {} beyond scale {} discarded",
            trimmed, scale
        )));
    }

    let mut m = Magnitude::default();
    for digits in [whole, frac] {
        for group in digits.as_bytes().chunks(4) {
            let value = group
                .iter()
                .fold(0u32, |acc, d| acc * 10 + u32::from(d - b'0'));
            if !m.mul_add(10u32.pow(group.len() as u32), value) {
                return Err(overflow(trimmed));
            }
        }
    }

    let natural_scale = frac.len() as i32;
    let target_scale = i32::from(scale);
    if target_scale > natural_scale {
        for _ in natural_scale..target_scale {
            if !m.mul_add(10, 0) {
                return Err(overflow(trimmed));
            }
        }
    } else {
        // only reachable for a negative scale: whole digits are being removed
        for _ in target_scale..natural_scale {
            if m.div_rem(10) != 0 {
                return Err(DriverError::Overflow(format!(
                    "Whole-number digits of {} lost at scale {}",
                    trimmed, scale
                )));
            }
        }
    }

    let digits = m.digit_count();
    if digits > usize::from(precision) {
        return Err(DriverError::Overflow(format!(
            "{} needs {} digits, precision is {}",
            trimmed, digits, precision
        )));
    }

    let numeric = Numeric {
        precision,
        scale,
        sign: if negative && !m.is_zero() { 0 } else { 1 },
        val: m.to_bytes(),
    };
    Ok((numeric, warnings))
}

/// Renders a `Numeric` exactly, using its own scale.
pub fn numeric_to_text(numeric: &Numeric) -> String {
    let m = Magnitude::from_bytes(&numeric.val);
    let mut digits = m.to_digits();

    let scale = i32::from(numeric.scale);
    if scale < 0 {
        if !m.is_zero() {
            digits.push_str(&"0".repeat(scale.unsigned_abs() as usize));
        }
    } else if scale > 0 {
        let scale = scale as usize;
        if digits.len() <= scale {
            let pad = scale + 1 - digits.len();
            digits.insert_str(0, &"0".repeat(pad));
        }
        digits.insert(digits.len() - scale, '.');
    }

    if numeric.sign == 0 && !m.is_zero() {
        digits.insert(0, '-');
    }
    digits
}

/// Re-applies precision and scale limits to decimal text, as the encoder
/// would, and renders the result.
pub fn rescale_text(text: &str, precision: u8, scale: i8) -> Result<(String, Vec<Warning>)> {
    let (numeric, warnings) = text_to_numeric(text, precision, scale)?;
    Ok((numeric_to_text(&numeric), warnings))
}
