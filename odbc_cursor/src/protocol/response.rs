//! Text form of result sets and of the SQL the driver sends back.
//!
//! A reply with a result set is line oriented:
//!
//! ```text
//! id\tname\tprice
//! INTEGER KEY\tVARCHAR(20)\tDECIMAL(10,2)
//! 1\tWidget\t9.99
//! 2\t\N\t12.50
//! ```
//!
//! Fields are separated by TAB and backslash-escaped (`\\`, `\t`, `\n`,
//! `\r`, `\0`); a field of exactly `\N` is NULL. Binary columns carry hex.
//! A type name may be followed by `KEY` and/or `NOT NULL` flags. An empty
//! reply has no result set.

use crate::codec::binary::{parse_hex, to_hex};
use crate::codec::Charset;
use crate::error::{DriverError, Result};
use crate::protocol::types::{ColumnDescriptor, SqlType};

const NULL_FIELD: &str = "\\N";

/// A materialised reply: column descriptors plus cell bytes per row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultText {
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<Vec<Option<Vec<u8>>>>,
}

impl ResultText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_column(&mut self, column: ColumnDescriptor) {
        self.columns.push(column);
    }

    pub fn add_row(&mut self, row: Vec<Option<Vec<u8>>>) {
        self.rows.push(row);
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn parse(text: &str, charset: Charset) -> Result<Self> {
        let mut out = Self::new();
        let mut lines = text.lines();
        let Some(header) = lines.next().filter(|l| !l.trim().is_empty()) else {
            return Ok(out);
        };
        let types = lines.next().ok_or_else(|| malformed("missing type line"))?;

        let names: Vec<&str> = header.split('\t').collect();
        let type_names: Vec<&str> = types.split('\t').collect();
        if names.len() != type_names.len() {
            return Err(malformed(&format!(
                "{} column names but {} types",
                names.len(),
                type_names.len()
            )));
        }
        for (name, type_name) in names.iter().zip(type_names) {
            out.add_column(parse_column(&unescape_text(name), type_name));
        }

        for (i, line) in lines.enumerate() {
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != out.column_count() {
                return Err(malformed(&format!(
                    "row {} has {} fields, expected {}",
                    i + 1,
                    fields.len(),
                    out.column_count()
                )));
            }
            let row = fields
                .iter()
                .zip(&out.columns)
                .map(|(field, column)| {
                    if *field == NULL_FIELD {
                        None
                    } else {
                        Some(text_to_cell(&unescape_text(field), column.sql_type, charset))
                    }
                })
                .collect();
            out.add_row(row);
        }
        Ok(out)
    }

    /// Inverse of [`ResultText::parse`].
    pub fn to_text(&self, charset: Charset) -> String {
        if self.columns.is_empty() {
            return String::new();
        }
        let mut lines = Vec::with_capacity(self.rows.len() + 2);
        lines.push(
            self.columns
                .iter()
                .map(|c| escape_text(&c.name))
                .collect::<Vec<_>>()
                .join("\t"),
        );
        lines.push(
            self.columns
                .iter()
                .map(column_type_text)
                .collect::<Vec<_>>()
                .join("\t"),
        );
        for row in &self.rows {
            lines.push(
                row.iter()
                    .zip(&self.columns)
                    .map(|(cell, column)| match cell {
                        None => NULL_FIELD.to_string(),
                        Some(bytes) => escape_text(&cell_to_text(bytes, column.sql_type, charset)),
                    })
                    .collect::<Vec<_>>()
                    .join("\t"),
            );
        }
        lines.join("\n")
    }
}

fn malformed(detail: &str) -> DriverError {
    DriverError::Backend {
        status: 0,
        message: format!("Malformed result reply: {}", detail),
    }
}

fn parse_column(name: &str, type_text: &str) -> ColumnDescriptor {
    let mut base = type_text.trim().to_string();
    let mut key = false;
    let mut nullable = true;
    loop {
        let upper = base.to_ascii_uppercase();
        if let Some(stripped) = upper.strip_suffix(" NOT NULL") {
            nullable = false;
            base.truncate(stripped.len());
        } else if let Some(stripped) = upper.strip_suffix(" PRIMARY KEY") {
            key = true;
            base.truncate(stripped.len());
        } else if let Some(stripped) = upper.strip_suffix(" KEY") {
            key = true;
            base.truncate(stripped.len());
        } else {
            break;
        }
    }
    ColumnDescriptor::from_type_name(name, base.trim_end())
        .with_key(key)
        .with_nullable(nullable)
}

fn column_type_text(column: &ColumnDescriptor) -> String {
    let mut t = if column.type_name.is_empty() {
        format!("{:?}", column.sql_type).to_ascii_uppercase()
    } else {
        column.type_name.clone()
    };
    if column.key {
        t.push_str(" KEY");
    }
    if !column.nullable {
        t.push_str(" NOT NULL");
    }
    t
}

/// Cell bytes for a value in wire text form.
pub fn text_to_cell(text: &str, sql_type: SqlType, charset: Charset) -> Vec<u8> {
    if sql_type.is_binary() {
        if let Some(bytes) = parse_hex(text) {
            return bytes;
        }
    }
    charset.encode(text).0
}

/// Wire text form of cell bytes.
pub fn cell_to_text(bytes: &[u8], sql_type: SqlType, charset: Charset) -> String {
    if sql_type.is_binary() {
        return to_hex(bytes);
    }
    match charset {
        Charset::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        Charset::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out
}

pub fn unescape_text(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut chars = field.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// SQL literal for a cell of `column`.
pub fn quote_literal(cell: Option<&[u8]>, column: &ColumnDescriptor, charset: Charset) -> String {
    let Some(bytes) = cell else {
        return "NULL".to_string();
    };
    if column.sql_type.is_binary() {
        return format!("X'{}'", to_hex(bytes));
    }
    let text = cell_to_text(bytes, column.sql_type, charset);
    if column.sql_type.is_numeric() && text.trim().parse::<f64>().is_ok() {
        return text.trim().to_string();
    }
    format!("'{}'", text.replace('\'', "''"))
}

/// Identifiers are emitted bare when they are plain words, quoted otherwise.
pub fn quote_identifier(name: &str) -> String {
    let plain = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

/// The single table a `SELECT ... FROM <table>` reads from. Joins and
/// comma-separated table lists yield `None`.
pub fn detect_table(sql: &str) -> Option<String> {
    let tokens: Vec<&str> = sql
        .split(|c: char| c.is_whitespace() || c == ';')
        .filter(|t| !t.is_empty())
        .collect();
    let from = tokens.iter().position(|t| t.eq_ignore_ascii_case("FROM"))?;
    let table = tokens.get(from + 1)?;
    if table.starts_with('(') || table.ends_with(',') {
        return None;
    }
    let rest = &tokens[from + 2..];
    let joined = rest.iter().take_while(|t| {
        !["WHERE", "ORDER", "GROUP", "LIMIT", "HAVING", "UNION"]
            .iter()
            .any(|kw| t.eq_ignore_ascii_case(kw))
    });
    for t in joined {
        if t.starts_with(',') || t.eq_ignore_ascii_case("JOIN") {
            return None;
        }
    }
    Some(table.trim_matches('"').to_string())
}
