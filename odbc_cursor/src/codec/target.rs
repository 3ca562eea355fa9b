use crate::protocol::types::{CType, Date, Numeric, Time, Timestamp};

/// A caller-supplied output buffer, tagged by the C type it holds.
///
/// Character and binary buffers carry their capacity in the slice length;
/// `WChar` capacity is counted in 16-bit code units.
#[derive(Debug)]
pub enum Target<'a> {
    Char(&'a mut [u8]),
    WChar(&'a mut [u16]),
    Binary(&'a mut [u8]),
    Bit(&'a mut u8),
    STinyInt(&'a mut i8),
    UTinyInt(&'a mut u8),
    SShort(&'a mut i16),
    UShort(&'a mut u16),
    SLong(&'a mut i32),
    ULong(&'a mut u32),
    SBigInt(&'a mut i64),
    UBigInt(&'a mut u64),
    Float(&'a mut f32),
    Double(&'a mut f64),
    /// Packed decimal with the precision and scale the caller asked for.
    Numeric {
        out: &'a mut Numeric,
        precision: u8,
        scale: i8,
    },
    Date(&'a mut Date),
    Time(&'a mut Time),
    Timestamp(&'a mut Timestamp),
}

impl Target<'_> {
    pub fn c_type(&self) -> CType {
        match self {
            Target::Char(_) => CType::Char,
            Target::WChar(_) => CType::WChar,
            Target::Binary(_) => CType::Binary,
            Target::Bit(_) => CType::Bit,
            Target::STinyInt(_) => CType::STinyInt,
            Target::UTinyInt(_) => CType::UTinyInt,
            Target::SShort(_) => CType::SShort,
            Target::UShort(_) => CType::UShort,
            Target::SLong(_) => CType::SLong,
            Target::ULong(_) => CType::ULong,
            Target::SBigInt(_) => CType::SBigInt,
            Target::UBigInt(_) => CType::UBigInt,
            Target::Float(_) => CType::Float,
            Target::Double(_) => CType::Double,
            Target::Numeric { .. } => CType::Numeric,
            Target::Date(_) => CType::Date,
            Target::Time(_) => CType::Time,
            Target::Timestamp(_) => CType::Timestamp,
        }
    }

    /// Capacity of the buffer in bytes.
    pub fn buffer_len(&self) -> usize {
        match self {
            Target::Char(b) | Target::Binary(b) => b.len(),
            Target::WChar(b) => b.len() * 2,
            Target::Bit(_) | Target::STinyInt(_) | Target::UTinyInt(_) => 1,
            Target::SShort(_) | Target::UShort(_) => 2,
            Target::SLong(_) | Target::ULong(_) | Target::Float(_) => 4,
            Target::SBigInt(_) | Target::UBigInt(_) | Target::Double(_) => 8,
            Target::Numeric { .. } => std::mem::size_of::<Numeric>(),
            Target::Date(_) => std::mem::size_of::<Date>(),
            Target::Time(_) => std::mem::size_of::<Time>(),
            Target::Timestamp(_) => std::mem::size_of::<Timestamp>(),
        }
    }

    /// Variable-length targets may be drained over several calls.
    pub fn is_variable_length(&self) -> bool {
        matches!(self, Target::Char(_) | Target::WChar(_) | Target::Binary(_))
    }
}
