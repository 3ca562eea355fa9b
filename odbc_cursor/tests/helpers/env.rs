//! Helper functions for reading environment variables in tests

use odbc_cursor::DriverConfig;

/// Driver config from the ODBC_CURSOR_TEST_CONFIG JSON document.
/// Returns None if not set or not valid.
#[allow(dead_code)]
pub fn get_test_config() -> Option<DriverConfig> {
    odbc_cursor::test_helpers::load_dotenv();
    std::env::var("ODBC_CURSOR_TEST_CONFIG")
        .ok()
        .filter(|s| !s.is_empty())
        .and_then(|json| DriverConfig::from_json(&json).ok())
}
