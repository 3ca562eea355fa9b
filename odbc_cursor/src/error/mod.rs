use std::fmt;
use thiserror::Error;

/// Error category for decision-making (retry, abort, fix the call)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Transient error - retry may resolve
    Transient,
    /// Fatal error - should abort operation
    Fatal,
    /// Validation error - invalid caller input
    Validation,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DriverError {
    #[error("Index out of range: {0}")]
    OutOfRange(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Function sequence error: {0}")]
    InvalidSequence(String),

    #[error("Numeric value out of range: {0}")]
    Overflow(String),

    #[error("Connection busy: {0}")]
    Busy(String),

    #[error("Invalid character value for cast: {0}")]
    InvalidValue(String),

    #[error("Invalid datetime format: {0}")]
    InvalidDatetime(String),

    #[error("Restricted data type conversion: {0}")]
    RestrictedConversion(String),

    #[error("Backend error {status}: {message}")]
    Backend { status: i32, message: String },

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DriverError {
    pub fn sqlstate(&self) -> [u8; 5] {
        let state: &[u8; 5] = match self {
            DriverError::OutOfRange(_) => b"07009",
            DriverError::InvalidArgument(_) => b"HY024",
            DriverError::InvalidSequence(_) => b"HY010",
            DriverError::Overflow(_) => b"22003",
            DriverError::Busy(_) => b"HYT00",
            DriverError::InvalidValue(_) => b"22018",
            DriverError::InvalidDatetime(_) => b"22007",
            DriverError::RestrictedConversion(_) => b"07006",
            DriverError::Backend { .. } => b"HY000",
            DriverError::InternalError(_) => b"HY000",
        };
        *state
    }

    pub fn native_code(&self) -> i32 {
        match self {
            DriverError::Backend { status, .. } => *status,
            _ => 0,
        }
    }

    /// Returns true if the operation may succeed when simply retried
    pub fn is_retryable(&self) -> bool {
        matches!(self, DriverError::Busy(_))
    }

    /// Returns the error category for decision-making
    pub fn error_category(&self) -> ErrorCategory {
        match self {
            DriverError::OutOfRange(_)
            | DriverError::InvalidArgument(_)
            | DriverError::InvalidSequence(_)
            | DriverError::RestrictedConversion(_) => ErrorCategory::Validation,
            _ if self.is_retryable() => ErrorCategory::Transient,
            _ => ErrorCategory::Fatal,
        }
    }
}

pub type Result<T> = std::result::Result<T, DriverError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// String or binary data did not fit the caller's buffer.
    Truncated,
    /// Digits after the decimal point (or time parts) were discarded.
    FractionalTruncation,
    /// Invalid source bytes were replaced while converting characters.
    ConversionError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn truncated(message: impl Into<String>) -> Self {
        Self::new(WarningKind::Truncated, message)
    }

    pub fn fractional_truncation(message: impl Into<String>) -> Self {
        Self::new(WarningKind::FractionalTruncation, message)
    }

    pub fn conversion(message: impl Into<String>) -> Self {
        Self::new(WarningKind::ConversionError, message)
    }

    pub fn sqlstate(&self) -> [u8; 5] {
        let state: &[u8; 5] = match self.kind {
            WarningKind::Truncated => b"01004",
            WarningKind::FractionalTruncation => b"01S07",
            WarningKind::ConversionError => b"01000",
        };
        *state
    }

    /// Both flavours of truncation are reported to callers as "data truncated".
    pub fn is_truncation(&self) -> bool {
        matches!(
            self.kind,
            WarningKind::Truncated | WarningKind::FractionalTruncation
        )
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}",
            String::from_utf8_lossy(&self.sqlstate()),
            self.message
        )
    }
}

/// Outcome of an operation that did not fail hard.
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Success,
    SuccessWithInfo(Vec<Warning>),
    NoData,
}

impl Status {
    pub fn from_warnings(warnings: Vec<Warning>) -> Self {
        if warnings.is_empty() {
            Status::Success
        } else {
            Status::SuccessWithInfo(warnings)
        }
    }

    pub fn warnings(&self) -> &[Warning] {
        match self {
            Status::SuccessWithInfo(w) => w,
            _ => &[],
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Status::NoData)
    }

    pub fn has_truncation(&self) -> bool {
        self.warnings().iter().any(Warning::is_truncation)
    }
}
