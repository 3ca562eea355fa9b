use crate::error::{DriverError, Result};

/// Semantic type of a result column, as declared by the backend engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SqlType {
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Decimal,
    Bit,
    Char,
    Varchar,
    LongVarchar,
    WChar,
    WVarchar,
    WLongVarchar,
    Binary,
    VarBinary,
    LongVarBinary,
    Date,
    Time,
    Timestamp,
}

impl SqlType {
    pub fn from_sql_type_code(code: i16) -> Self {
        match code {
            -6 => Self::TinyInt,
            5 => Self::SmallInt,
            4 => Self::Integer,
            -5 => Self::BigInt,
            7 => Self::Real,
            6 | 8 => Self::Double,
            2 | 3 => Self::Decimal,
            -7 => Self::Bit,
            1 => Self::Char,
            -1 => Self::LongVarchar,
            -8 => Self::WChar,
            -9 => Self::WVarchar,
            -10 => Self::WLongVarchar,
            -2 => Self::Binary,
            -3 => Self::VarBinary,
            -4 => Self::LongVarBinary,
            9 | 91 => Self::Date,
            10 | 92 => Self::Time,
            11 | 93 => Self::Timestamp,
            _ => Self::Varchar,
        }
    }

    pub fn sql_type_code(self) -> i16 {
        match self {
            Self::TinyInt => -6,
            Self::SmallInt => 5,
            Self::Integer => 4,
            Self::BigInt => -5,
            Self::Real => 7,
            Self::Double => 8,
            Self::Decimal => 3,
            Self::Bit => -7,
            Self::Char => 1,
            Self::Varchar => 12,
            Self::LongVarchar => -1,
            Self::WChar => -8,
            Self::WVarchar => -9,
            Self::WLongVarchar => -10,
            Self::Binary => -2,
            Self::VarBinary => -3,
            Self::LongVarBinary => -4,
            Self::Date => 91,
            Self::Time => 92,
            Self::Timestamp => 93,
        }
    }

    /// Maps an engine-reported type name (`VARCHAR(20)`, `unsigned bigint`,
    /// `DATETIME`, ...) onto a semantic type. Unknown names are character data.
    pub fn from_type_name(type_name: &str) -> Self {
        let name = type_name.to_ascii_uppercase();
        let base = name.split('(').next().unwrap_or("").trim();

        if base.contains("BIGINT") || base.contains("INT8") {
            Self::BigInt
        } else if base.contains("TINYINT") {
            Self::TinyInt
        } else if base.contains("SMALLINT") || base.contains("INT2") {
            Self::SmallInt
        } else if base.contains("INT") {
            Self::Integer
        } else if base.contains("BOOL") || base == "BIT" {
            Self::Bit
        } else if base.contains("REAL") || base.contains("FLOAT4") {
            Self::Real
        } else if base.contains("DOUBLE") || base.contains("FLOAT") {
            Self::Double
        } else if base.contains("DECIMAL") || base.contains("NUMERIC") || base == "NUMBER" {
            Self::Decimal
        } else if base.contains("TIMESTAMP") || base.contains("DATETIME") {
            Self::Timestamp
        } else if base.contains("DATE") {
            Self::Date
        } else if base.contains("TIME") {
            Self::Time
        } else if base.contains("BLOB")
            || base.contains("BYTEA")
            || base.contains("LONGVARBINARY")
        {
            Self::LongVarBinary
        } else if base.contains("VARBINARY") {
            Self::VarBinary
        } else if base.contains("BINARY") {
            Self::Binary
        } else if base.contains("NTEXT") {
            Self::WLongVarchar
        } else if base.contains("NVARCHAR") {
            Self::WVarchar
        } else if base.contains("NCHAR") {
            Self::WChar
        } else if base.contains("VARCHAR") {
            Self::Varchar
        } else if base.contains("CHAR") {
            Self::Char
        } else if base.contains("TEXT") || base.contains("CLOB") {
            Self::LongVarchar
        } else {
            Self::Varchar
        }
    }

    pub fn is_binary(self) -> bool {
        matches!(self, Self::Binary | Self::VarBinary | Self::LongVarBinary)
    }

    pub fn is_wide(self) -> bool {
        matches!(self, Self::WChar | Self::WVarchar | Self::WLongVarchar)
    }

    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::TinyInt
                | Self::SmallInt
                | Self::Integer
                | Self::BigInt
                | Self::Real
                | Self::Double
                | Self::Decimal
                | Self::Bit
        )
    }

    fn default_column_size(self) -> usize {
        match self {
            Self::TinyInt => 3,
            Self::SmallInt => 5,
            Self::Integer => 10,
            Self::BigInt => 19,
            Self::Real => 7,
            Self::Double => 15,
            Self::Decimal => 38,
            Self::Bit => 1,
            Self::Date => 10,
            Self::Time => 8,
            Self::Timestamp => 29,
            Self::Char | Self::WChar | Self::Binary => 255,
            Self::Varchar | Self::WVarchar | Self::VarBinary => 255,
            Self::LongVarchar | Self::WLongVarchar | Self::LongVarBinary => 65536,
        }
    }
}

/// Describes one result column for the lifetime of the current result set.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub sql_type: SqlType,
    /// Declared length in characters (or bytes for binary columns).
    pub length: usize,
    pub precision: Option<u8>,
    pub scale: Option<i8>,
    pub nullable: bool,
    /// The type name reported by the backend engine, verbatim.
    pub type_name: String,
    /// Column participates in the row identity used by positioned mutations.
    pub key: bool,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            length: sql_type.default_column_size(),
            precision: None,
            scale: None,
            nullable: true,
            type_name: String::new(),
            key: false,
        }
    }

    /// Builds a descriptor from an engine type name, picking up `(length)` or
    /// `(precision, scale)` suffixes.
    pub fn from_type_name(name: impl Into<String>, type_name: &str) -> Self {
        let sql_type = SqlType::from_type_name(type_name);
        let mut desc = Self::new(name, sql_type);
        desc.type_name = type_name.to_string();

        let args: Vec<usize> = type_name
            .split_once('(')
            .and_then(|(_, rest)| rest.split_once(')'))
            .map(|(inner, _)| {
                inner
                    .split(',')
                    .filter_map(|part| part.trim().parse::<usize>().ok())
                    .collect()
            })
            .unwrap_or_default();

        match (sql_type, args.as_slice()) {
            (SqlType::Decimal, [p]) => {
                desc.precision = u8::try_from(*p).ok();
                desc.scale = Some(0);
            }
            (SqlType::Decimal, [p, s, ..]) => {
                desc.precision = u8::try_from(*p).ok();
                desc.scale = i8::try_from(*s).ok();
            }
            (_, [len, ..]) => desc.length = *len,
            _ => {}
        }
        if let Some(p) = desc.precision {
            desc.length = p as usize;
        }
        desc
    }

    pub fn with_key(mut self, key: bool) -> Self {
        self.key = key;
        self
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_precision(mut self, precision: u8, scale: i8) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self.length = precision as usize;
        self
    }
}

/// C data type tags of the caller-facing buffer interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CType {
    Default,
    Char,
    WChar,
    Binary,
    Bit,
    STinyInt,
    UTinyInt,
    SShort,
    UShort,
    SLong,
    ULong,
    SBigInt,
    UBigInt,
    Float,
    Double,
    Numeric,
    Date,
    Time,
    Timestamp,
}

impl CType {
    pub fn from_raw(code: i16) -> Result<Self> {
        let c_type = match code {
            99 => Self::Default,
            1 => Self::Char,
            -8 => Self::WChar,
            -2 => Self::Binary,
            -7 => Self::Bit,
            -6 | -26 => Self::STinyInt,
            -28 => Self::UTinyInt,
            5 | -15 => Self::SShort,
            -17 => Self::UShort,
            4 | -16 => Self::SLong,
            -18 => Self::ULong,
            -25 => Self::SBigInt,
            -27 => Self::UBigInt,
            7 => Self::Float,
            8 => Self::Double,
            2 => Self::Numeric,
            9 | 91 => Self::Date,
            10 | 92 => Self::Time,
            11 | 93 => Self::Timestamp,
            other => {
                return Err(DriverError::InvalidArgument(format!(
                    "Unknown C data type: {}",
                    other
                )))
            }
        };
        Ok(c_type)
    }

    pub fn raw(self) -> i16 {
        match self {
            Self::Default => 99,
            Self::Char => 1,
            Self::WChar => -8,
            Self::Binary => -2,
            Self::Bit => -7,
            Self::STinyInt => -26,
            Self::UTinyInt => -28,
            Self::SShort => -15,
            Self::UShort => -17,
            Self::SLong => -16,
            Self::ULong => -18,
            Self::SBigInt => -25,
            Self::UBigInt => -27,
            Self::Float => 7,
            Self::Double => 8,
            Self::Numeric => 2,
            Self::Date => 91,
            Self::Time => 92,
            Self::Timestamp => 93,
        }
    }

    /// Resolves `Default` to the natural C type of a column.
    pub fn resolve(self, sql_type: SqlType) -> Self {
        if self != Self::Default {
            return self;
        }
        match sql_type {
            SqlType::TinyInt => Self::STinyInt,
            SqlType::SmallInt => Self::SShort,
            SqlType::Integer => Self::SLong,
            SqlType::BigInt => Self::SBigInt,
            SqlType::Real => Self::Float,
            SqlType::Double => Self::Double,
            SqlType::Bit => Self::Bit,
            SqlType::Binary | SqlType::VarBinary | SqlType::LongVarBinary => Self::Binary,
            SqlType::WChar | SqlType::WVarchar | SqlType::WLongVarchar => Self::WChar,
            SqlType::Date => Self::Date,
            SqlType::Time => Self::Time,
            SqlType::Timestamp => Self::Timestamp,
            SqlType::Decimal | SqlType::Char | SqlType::Varchar | SqlType::LongVarchar => {
                Self::Char
            }
        }
    }
}

/// `SQL_DATE_STRUCT`
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Date {
    pub year: i16,
    pub month: u16,
    pub day: u16,
}

/// `SQL_TIME_STRUCT`
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Time {
    pub hour: u16,
    pub minute: u16,
    pub second: u16,
}

/// `SQL_TIMESTAMP_STRUCT`; `fraction` is in nanoseconds.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Timestamp {
    pub year: i16,
    pub month: u16,
    pub day: u16,
    pub hour: u16,
    pub minute: u16,
    pub second: u16,
    pub fraction: u32,
}

pub const MAX_NUMERIC_LEN: usize = 16;

/// `SQL_NUMERIC_STRUCT`: `sign` is 1 for positive, 0 for negative and `val`
/// holds the scaled magnitude as a 128-bit little-endian integer.
#[repr(C)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Numeric {
    pub precision: u8,
    pub scale: i8,
    pub sign: u8,
    pub val: [u8; MAX_NUMERIC_LEN],
}

impl Timestamp {
    pub fn date(&self) -> Date {
        Date {
            year: self.year,
            month: self.month,
            day: self.day,
        }
    }

    pub fn time(&self) -> Time {
        Time {
            hour: self.hour,
            minute: self.minute,
            second: self.second,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_struct_layouts_match_c_abi() {
        assert_eq!(std::mem::size_of::<Date>(), 6);
        assert_eq!(std::mem::size_of::<Time>(), 6);
        assert_eq!(std::mem::size_of::<Timestamp>(), 16);
        assert_eq!(std::mem::size_of::<Numeric>(), 19);
    }

    #[test]
    fn test_from_sql_type_code_roundtrip() {
        let types = [
            SqlType::TinyInt,
            SqlType::Integer,
            SqlType::BigInt,
            SqlType::Decimal,
            SqlType::Varchar,
            SqlType::WVarchar,
            SqlType::VarBinary,
            SqlType::Date,
            SqlType::Timestamp,
        ];
        for sql_type in types {
            assert_eq!(SqlType::from_sql_type_code(sql_type.sql_type_code()), sql_type);
        }
    }

    #[test]
    fn test_from_sql_type_code_unknown_defaults_to_varchar() {
        assert_eq!(SqlType::from_sql_type_code(999), SqlType::Varchar);
        assert_eq!(SqlType::from_sql_type_code(0), SqlType::Varchar);
    }

    #[test]
    fn test_from_type_name() {
        assert_eq!(SqlType::from_type_name("integer"), SqlType::Integer);
        assert_eq!(SqlType::from_type_name("UNSIGNED BIGINT"), SqlType::BigInt);
        assert_eq!(SqlType::from_type_name("varchar(20)"), SqlType::Varchar);
        assert_eq!(SqlType::from_type_name("NVARCHAR(10)"), SqlType::WVarchar);
        assert_eq!(SqlType::from_type_name("DATETIME"), SqlType::Timestamp);
        assert_eq!(SqlType::from_type_name("date"), SqlType::Date);
        assert_eq!(SqlType::from_type_name("time"), SqlType::Time);
        assert_eq!(SqlType::from_type_name("blob"), SqlType::LongVarBinary);
        assert_eq!(SqlType::from_type_name("boolean"), SqlType::Bit);
        assert_eq!(SqlType::from_type_name("text"), SqlType::LongVarchar);
        assert_eq!(SqlType::from_type_name("whatever"), SqlType::Varchar);
    }

    #[test]
    fn test_descriptor_from_type_name_arguments() {
        let d = ColumnDescriptor::from_type_name("price", "DECIMAL(10,2)");
        assert_eq!(d.sql_type, SqlType::Decimal);
        assert_eq!(d.precision, Some(10));
        assert_eq!(d.scale, Some(2));
        assert_eq!(d.length, 10);
        assert_eq!(d.type_name, "DECIMAL(10,2)");

        let d = ColumnDescriptor::from_type_name("name", "VARCHAR(20)");
        assert_eq!(d.length, 20);
        assert_eq!(d.precision, None);

        let d = ColumnDescriptor::from_type_name("n", "numeric");
        assert_eq!(d.precision, None);
        assert_eq!(d.scale, None);
    }

    #[test]
    fn test_c_type_from_raw() {
        assert_eq!(CType::from_raw(1).unwrap(), CType::Char);
        assert_eq!(CType::from_raw(-8).unwrap(), CType::WChar);
        assert_eq!(CType::from_raw(93).unwrap(), CType::Timestamp);
        assert_eq!(CType::from_raw(11).unwrap(), CType::Timestamp);
        assert_eq!(CType::from_raw(4).unwrap(), CType::SLong);

        match CType::from_raw(12345) {
            Err(DriverError::InvalidArgument(_)) => (),
            other => panic!("Expected InvalidArgument, got {:?}", other),
        }
    }

    #[test]
    fn test_c_type_default_resolution() {
        assert_eq!(CType::Default.resolve(SqlType::Integer), CType::SLong);
        assert_eq!(CType::Default.resolve(SqlType::Decimal), CType::Char);
        assert_eq!(CType::Default.resolve(SqlType::WVarchar), CType::WChar);
        assert_eq!(CType::Default.resolve(SqlType::LongVarBinary), CType::Binary);
        assert_eq!(CType::Double.resolve(SqlType::Integer), CType::Double);
    }
}
