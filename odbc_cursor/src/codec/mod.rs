//! Conversion of text cells into caller buffers, and the pieces used for the
//! reverse direction.
//!
//! [`decode`] is the single entry point on the read path: every [`Target`]
//! variant is matched exhaustively, so a new buffer shape has to be handled
//! here before the crate compiles.

pub mod binary;
pub mod charset;
pub mod datetime;
pub mod decimal;
pub mod numeric;
pub mod target;
pub mod text;

pub use charset::Charset;
pub use target::Target;

use crate::engine::transfer::ChunkedTransfer;
use crate::error::{DriverError, Result, Status, Warning};
use crate::protocol::types::{ColumnDescriptor, SqlType};
use datetime::DateOptions;
use std::borrow::Cow;

/// Value written to the caller's length/indicator slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Indicator {
    Null,
    /// Bytes available before this call, untruncated.
    Length(usize),
}

impl Indicator {
    /// `SQL_NULL_DATA` is -1.
    pub fn to_raw(self) -> isize {
        match self {
            Indicator::Null => -1,
            Indicator::Length(n) => isize::try_from(n).unwrap_or(isize::MAX),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CodecOptions {
    pub charset: Charset,
    pub decimal_separator: Option<char>,
    pub coerce_invalid_dates: bool,
}

impl CodecOptions {
    pub fn date_options(&self) -> DateOptions {
        DateOptions {
            decimal_separator: self.decimal_separator,
            coerce_invalid: self.coerce_invalid_dates,
        }
    }
}

/// Outcome of one successful delivery into a caller buffer.
#[derive(Clone, Debug, PartialEq)]
pub struct Conversion {
    pub indicator: Indicator,
    pub warnings: Vec<Warning>,
}

impl Conversion {
    fn new(indicator: Indicator, warnings: Vec<Warning>) -> Self {
        Self {
            indicator,
            warnings,
        }
    }

    pub fn status(&self) -> Status {
        Status::from_warnings(self.warnings.clone())
    }
}

/// Cell bytes as text in the given character set.
pub fn cell_text(bytes: &[u8], charset: Charset) -> Result<Cow<'_, str>> {
    match charset {
        Charset::Utf8 => std::str::from_utf8(bytes)
            .map(Cow::Borrowed)
            .map_err(|e| DriverError::InvalidValue(format!("Cell is not valid UTF-8: {}", e))),
        Charset::Latin1 => Ok(Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect())),
    }
}

/// Renders one cell into `target`.
///
/// `transfer` must already be positioned on this cell's column. Returns
/// `Ok(None)` when nothing could be delivered (a bit rendered as text into
/// a buffer too small to hold it); the cell is not consumed in that case.
/// On error nothing has been written to `target`.
pub fn decode(
    cell: Option<&[u8]>,
    column: &ColumnDescriptor,
    target: &mut Target<'_>,
    transfer: &mut ChunkedTransfer,
    options: &CodecOptions,
) -> Result<Option<Conversion>> {
    let Some(bytes) = cell else {
        transfer.finish();
        return Ok(Some(Conversion::new(Indicator::Null, Vec::new())));
    };

    let source = column.sql_type;
    if source.is_binary() && !target.is_variable_length() {
        return Err(DriverError::RestrictedConversion(format!(
            "Binary column '{}' cannot be read as {:?}",
            column.name,
            target.c_type()
        )));
    }

    let fixed_len = target.buffer_len();
    let conversion = match target {
        Target::Char(buf) => {
            if source.is_binary() {
                let (ind, w) = binary::deliver_hex(bytes, &mut buf[..], transfer);
                Conversion::new(ind, w)
            } else if source == SqlType::Bit {
                let (bit, w) = numeric::parse_bit(&cell_text(bytes, options.charset)?)?;
                match binary::deliver_bit_char(bit == 1, &mut buf[..]) {
                    Some(ind) => {
                        transfer.finish();
                        Conversion::new(ind, w)
                    }
                    None => return Ok(None),
                }
            } else {
                let (ind, w) = text::deliver_char(bytes, buf, transfer, options.charset);
                Conversion::new(ind, w)
            }
        }
        Target::WChar(buf) => {
            if source.is_binary() {
                let (ind, w) = binary::deliver_hex(bytes, &mut buf[..], transfer);
                Conversion::new(ind, w)
            } else if source == SqlType::Bit {
                let (bit, w) = numeric::parse_bit(&cell_text(bytes, options.charset)?)?;
                match binary::deliver_bit_char(bit == 1, &mut buf[..]) {
                    Some(ind) => {
                        transfer.finish();
                        Conversion::new(ind, w)
                    }
                    None => return Ok(None),
                }
            } else {
                let (ind, w) = text::deliver_wchar(bytes, buf, transfer, options.charset);
                Conversion::new(ind, w)
            }
        }
        Target::Binary(buf) => {
            let (ind, w) = binary::deliver_binary(bytes, buf, transfer);
            Conversion::new(ind, w)
        }
        Target::Bit(out) => {
            let (v, w) = numeric::parse_bit(&cell_text(bytes, options.charset)?)?;
            **out = v;
            Conversion::new(Indicator::Length(fixed_len), w)
        }
        Target::STinyInt(out) => {
            let (v, w) = numeric::to_integer(&cell_text(bytes, options.charset)?, "TINYINT")?;
            **out = v;
            Conversion::new(Indicator::Length(fixed_len), w)
        }
        Target::UTinyInt(out) => {
            let (v, w) = numeric::to_integer(&cell_text(bytes, options.charset)?, "UTINYINT")?;
            **out = v;
            Conversion::new(Indicator::Length(fixed_len), w)
        }
        Target::SShort(out) => {
            let (v, w) = numeric::to_integer(&cell_text(bytes, options.charset)?, "SMALLINT")?;
            **out = v;
            Conversion::new(Indicator::Length(fixed_len), w)
        }
        Target::UShort(out) => {
            let (v, w) = numeric::to_integer(&cell_text(bytes, options.charset)?, "USMALLINT")?;
            **out = v;
            Conversion::new(Indicator::Length(fixed_len), w)
        }
        Target::SLong(out) => {
            let (v, w) = numeric::to_integer(&cell_text(bytes, options.charset)?, "INTEGER")?;
            **out = v;
            Conversion::new(Indicator::Length(fixed_len), w)
        }
        Target::ULong(out) => {
            let (v, w) = numeric::to_integer(&cell_text(bytes, options.charset)?, "UINTEGER")?;
            **out = v;
            Conversion::new(Indicator::Length(fixed_len), w)
        }
        Target::SBigInt(out) => {
            let (v, w) = numeric::to_integer(&cell_text(bytes, options.charset)?, "BIGINT")?;
            **out = v;
            Conversion::new(Indicator::Length(fixed_len), w)
        }
        Target::UBigInt(out) => {
            let (v, w) = numeric::to_integer(&cell_text(bytes, options.charset)?, "UBIGINT")?;
            **out = v;
            Conversion::new(Indicator::Length(fixed_len), w)
        }
        Target::Float(out) => {
            **out = numeric::parse_f32(&cell_text(bytes, options.charset)?)?;
            Conversion::new(Indicator::Length(fixed_len), Vec::new())
        }
        Target::Double(out) => {
            **out = numeric::parse_f64(&cell_text(bytes, options.charset)?)?;
            Conversion::new(Indicator::Length(fixed_len), Vec::new())
        }
        Target::Numeric {
            out,
            precision,
            scale,
        } => {
            let (n, w) =
                decimal::text_to_numeric(&cell_text(bytes, options.charset)?, *precision, *scale)?;
            **out = n;
            Conversion::new(Indicator::Length(fixed_len), w)
        }
        Target::Date(out) => {
            if source == SqlType::Time {
                return Err(restricted(column, "DATE"));
            }
            let (d, w) =
                datetime::parse_date(&cell_text(bytes, options.charset)?, &options.date_options())?;
            **out = d;
            Conversion::new(Indicator::Length(fixed_len), w)
        }
        Target::Time(out) => {
            if source == SqlType::Date {
                return Err(restricted(column, "TIME"));
            }
            let (t, w) =
                datetime::parse_time(&cell_text(bytes, options.charset)?, &options.date_options())?;
            **out = t;
            Conversion::new(Indicator::Length(fixed_len), w)
        }
        Target::Timestamp(out) => {
            let text = cell_text(bytes, options.charset)?;
            let (ts, w) = if source == SqlType::Time {
                let (t, w) = datetime::parse_time(&text, &options.date_options())?;
                let d = datetime::today();
                let ts = crate::protocol::types::Timestamp {
                    year: d.year,
                    month: d.month,
                    day: d.day,
                    hour: t.hour,
                    minute: t.minute,
                    second: t.second,
                    fraction: 0,
                };
                (ts, w)
            } else {
                datetime::parse_timestamp(&text, &options.date_options())?
            };
            **out = ts;
            Conversion::new(Indicator::Length(fixed_len), w)
        }
    };

    if !target.is_variable_length() {
        transfer.finish();
    }
    Ok(Some(conversion))
}

fn restricted(column: &ColumnDescriptor, target: &str) -> DriverError {
    DriverError::RestrictedConversion(format!(
        "Column '{}' of type {:?} cannot be read as {}",
        column.name, column.sql_type, target
    ))
}
