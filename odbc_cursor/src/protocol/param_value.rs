use crate::codec::{binary, datetime, decimal, Charset, CodecOptions};
use crate::error::{DriverError, Result, Warning};
use crate::protocol::types::{ColumnDescriptor, Date, Numeric, SqlType, Time, Timestamp};
use rayon::prelude::*;
use std::borrow::Cow;

/// A value supplied by the caller for an insert or update.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Null,
    Text(String),
    /// UTF-16 code units, as bound from a wide character buffer.
    WideText(Vec<u16>),
    Binary(Vec<u8>),
    Bit(bool),
    Integer(i64),
    UnsignedInteger(u64),
    Float(f32),
    Double(f64),
    Numeric(Numeric),
    Date(Date),
    Time(Time),
    Timestamp(Timestamp),
}

/// One row of values in wire text form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedRow {
    pub values: Vec<Option<String>>,
    pub warnings: Vec<Warning>,
}

impl ParamValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ParamValue::Null)
    }

    /// Renders the value as cell text for `column`. `None` is SQL NULL.
    pub fn render(
        &self,
        column: &ColumnDescriptor,
        options: &CodecOptions,
    ) -> Result<(Option<String>, Vec<Warning>)> {
        let mut warnings = Vec::new();
        let text = match self {
            ParamValue::Null => return Ok((None, warnings)),
            ParamValue::Text(s) => s.clone(),
            ParamValue::WideText(units) => String::from_utf16(units).unwrap_or_else(|_| {
                warnings.push(Warning::conversion(format!(
                    "Unpaired surrogate in value for column '{}'",
                    column.name
                )));
                String::from_utf16_lossy(units)
            }),
            ParamValue::Binary(bytes) => {
                if column.sql_type.is_binary() {
                    binary::to_hex(bytes)
                } else {
                    let (text, lossy) = match options.charset {
                        Charset::Utf8 => {
                            let s = String::from_utf8_lossy(bytes);
                            let lossy = matches!(s, Cow::Owned(_));
                            (s.into_owned(), lossy)
                        }
                        Charset::Latin1 => {
                            (bytes.iter().map(|&b| char::from(b)).collect(), false)
                        }
                    };
                    if lossy {
                        warnings.push(Warning::conversion(format!(
                            "Invalid bytes replaced in value for column '{}'",
                            column.name
                        )));
                    }
                    text
                }
            }
            ParamValue::Bit(b) => (if *b { "1" } else { "0" }).to_string(),
            ParamValue::Integer(n) => n.to_string(),
            ParamValue::UnsignedInteger(n) => n.to_string(),
            ParamValue::Float(f) => float_text(f64::from(*f), column, &mut warnings)?,
            ParamValue::Double(f) => float_text(*f, column, &mut warnings)?,
            ParamValue::Numeric(n) => decimal::numeric_to_text(n),
            ParamValue::Date(d) => {
                if column.sql_type == SqlType::Time {
                    return Err(restricted(self, column));
                }
                datetime::format_date(d)
            }
            ParamValue::Time(t) => {
                if column.sql_type == SqlType::Date {
                    return Err(restricted(self, column));
                }
                datetime::format_time(t)
            }
            ParamValue::Timestamp(ts) => match column.sql_type {
                SqlType::Date => {
                    if ts.time() != Time::default() || ts.fraction != 0 {
                        warnings.push(Warning::fractional_truncation(format!(
                            "Time part dropped for DATE column '{}'",
                            column.name
                        )));
                    }
                    datetime::format_date(&ts.date())
                }
                SqlType::Time => {
                    if ts.fraction != 0 {
                        warnings.push(Warning::fractional_truncation(format!(
                            "Fractional seconds dropped for TIME column '{}'",
                            column.name
                        )));
                    }
                    datetime::format_time(&ts.time())
                }
                _ => datetime::format_timestamp(ts),
            },
        };

        let text = match (column.sql_type, column.precision) {
            (SqlType::Decimal, Some(p)) => {
                let (t, w) = decimal::rescale_text(&text, p, column.scale.unwrap_or(0))?;
                warnings.extend(w);
                t
            }
            _ => text,
        };
        Ok((Some(text), warnings))
    }
}

fn float_text(v: f64, column: &ColumnDescriptor, warnings: &mut Vec<Warning>) -> Result<String> {
    if !v.is_finite() {
        return Err(DriverError::InvalidValue(format!(
            "Non-finite value for column '{}'",
            column.name
        )));
    }
    let integral = matches!(
        column.sql_type,
        SqlType::TinyInt | SqlType::SmallInt | SqlType::Integer | SqlType::BigInt
    );
    if integral && v.fract() != 0.0 {
        warnings.push(Warning::fractional_truncation(format!(
            "Fractional part of {} dropped for column '{}'",
            v, column.name
        )));
        return Ok(format!("{}", v.trunc()));
    }
    Ok(format!("{}", v))
}

fn restricted(value: &ParamValue, column: &ColumnDescriptor) -> DriverError {
    DriverError::RestrictedConversion(format!(
        "{:?} cannot be stored in column '{}' of type {:?}",
        value, column.name, column.sql_type
    ))
}

/// Renders one row of values against its columns.
pub fn render_row(
    values: &[ParamValue],
    columns: &[ColumnDescriptor],
    options: &CodecOptions,
) -> Result<RenderedRow> {
    if values.len() != columns.len() {
        return Err(DriverError::InvalidArgument(format!(
            "Expected {} values, got {}",
            columns.len(),
            values.len()
        )));
    }
    let mut row = RenderedRow::default();
    for (value, column) in values.iter().zip(columns) {
        let (text, warnings) = value.render(column, options)?;
        row.values.push(text);
        row.warnings.extend(warnings);
    }
    Ok(row)
}

/// Renders many rows in parallel; each row succeeds or fails on its own.
pub fn render_rows(
    rows: &[Vec<ParamValue>],
    columns: &[ColumnDescriptor],
    options: &CodecOptions,
) -> Vec<Result<RenderedRow>> {
    rows.par_iter()
        .map(|values| render_row(values, columns, options))
        .collect()
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Text(s)
    }
}

impl From<i64> for ParamValue {
    fn from(n: i64) -> Self {
        ParamValue::Integer(n)
    }
}

impl From<i32> for ParamValue {
    fn from(n: i32) -> Self {
        ParamValue::Integer(i64::from(n))
    }
}

impl From<f64> for ParamValue {
    fn from(f: f64) -> Self {
        ParamValue::Double(f)
    }
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bit(b)
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(ParamValue::Null, Into::into)
    }
}
