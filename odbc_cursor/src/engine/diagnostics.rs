use crate::error::{DriverError, Warning};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// Receives every warning and error a statement raises. Implementations must
/// not fail or block the caller.
pub trait Diagnostics: Send + Sync {
    fn report(&self, severity: Severity, sqlstate: &str, message: &str);
}

/// Default sink: forwards to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn report(&self, severity: Severity, sqlstate: &str, message: &str) {
        match severity {
            Severity::Warning => log::warn!("[{}] {}", sqlstate, message),
            Severity::Error => log::error!("[{}] {}", sqlstate, message),
        }
    }
}

pub type SharedDiagnostics = Arc<dyn Diagnostics>;

pub(crate) fn report_warnings(sink: &dyn Diagnostics, warnings: &[Warning]) {
    for w in warnings {
        sink.report(
            Severity::Warning,
            std::str::from_utf8(&w.sqlstate()).unwrap_or("01000"),
            &w.message,
        );
    }
}

pub(crate) fn report_error(sink: &dyn Diagnostics, error: &DriverError) {
    let state = error.sqlstate();
    sink.report(
        Severity::Error,
        std::str::from_utf8(&state).unwrap_or("HY000"),
        &error.to_string(),
    );
}
