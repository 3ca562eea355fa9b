use log::Level;

/// Formats driver events as a message followed by `, key=value` pairs.
#[derive(Debug, Clone, Copy)]
pub struct StructuredLogger {
    enabled: bool,
}

fn with_metadata(mut message: String, metadata: &[(&str, String)]) -> String {
    for (key, value) in metadata {
        message.push_str(&format!(", {}={}", key, value));
    }
    message
}

impl StructuredLogger {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn log_fetch(&self, orientation: &str, position: i64, delivered: usize, row_count: usize) {
        if !self.enabled {
            return;
        }
        log::debug!(
            "{}",
            with_metadata(
                format!("Fetch {}", orientation),
                &[
                    ("position", position.to_string()),
                    ("delivered", delivered.to_string()),
                    ("rows", row_count.to_string()),
                ],
            )
        );
    }

    pub fn log_exchange(&self, level: Level, command: &str, metadata: &[(&str, String)]) {
        if !self.enabled {
            return;
        }
        log::log!(level, "{}", with_metadata(format!("Exchange: {}", command), metadata));
    }

    pub fn log_mutation(&self, operation: &str, metadata: &[(&str, String)]) {
        if !self.enabled {
            return;
        }
        log::info!("{}", with_metadata(format!("Mutation {}", operation), metadata));
    }

    pub fn log_connection(&self, level: Level, user: &str, action: &str) {
        if !self.enabled {
            return;
        }
        log::log!(level, "Connection {}: user={}", action, user);
    }

    pub fn log_error(&self, error: &str, metadata: &[(&str, String)]) {
        if !self.enabled {
            return;
        }
        log::error!("{}", with_metadata(format!("Error: {}", error), metadata));
    }
}

impl Default for StructuredLogger {
    fn default() -> Self {
        Self::new(true)
    }
}
