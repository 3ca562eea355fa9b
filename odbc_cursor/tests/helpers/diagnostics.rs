use odbc_cursor::{Diagnostics, Severity};
use std::sync::Mutex;

/// Keeps every report so tests can assert on SQLSTATEs.
#[derive(Default)]
pub struct RecordingDiagnostics {
    reports: Mutex<Vec<(Severity, String, String)>>,
}

#[allow(dead_code)]
impl RecordingDiagnostics {
    pub fn states(&self) -> Vec<String> {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .map(|(_, state, _)| state.clone())
            .collect()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _, _)| *s == severity)
            .count()
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn report(&self, severity: Severity, sqlstate: &str, message: &str) {
        self.reports
            .lock()
            .unwrap()
            .push((severity, sqlstate.to_string(), message.to_string()));
    }
}
