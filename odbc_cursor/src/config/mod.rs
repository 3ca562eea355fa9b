//! Driver settings and the per-connection context that carries them.

use crate::codec::{Charset, CodecOptions};
use crate::error::{DriverError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

const ENV_PREFIX: &str = "ODBC_CURSOR_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Rows delivered per fetch.
    pub rowset_size: usize,
    /// Character set of cell text coming from the engine.
    pub charset: Charset,
    /// Locale separator accepted before fractional seconds, besides `.`.
    pub decimal_separator: Option<char>,
    /// Read a zero month or day as 1 instead of rejecting the value.
    pub coerce_invalid_dates: bool,
    /// Expose column 0 as the row bookmark.
    pub use_bookmarks: bool,
    pub logging: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            rowset_size: 1,
            charset: Charset::Utf8,
            decimal_separator: None,
            coerce_invalid_dates: false,
            use_bookmarks: false,
            logging: true,
        }
    }
}

impl DriverConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| DriverError::InvalidArgument(format!("Invalid driver config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `ODBC_CURSOR_*` variables over the defaults.
    pub fn from_env() -> Result<Self> {
        #[cfg(feature = "test-helpers")]
        crate::test_helpers::load_dotenv();

        let mut config = Self::default();
        if let Some(v) = env_var("ROWSET_SIZE") {
            config.rowset_size = v.parse().map_err(|_| invalid_env("ROWSET_SIZE", &v))?;
        }
        if let Some(v) = env_var("CHARSET") {
            config.charset = match v.to_ascii_lowercase().as_str() {
                "utf8" | "utf-8" => Charset::Utf8,
                "latin1" | "iso-8859-1" => Charset::Latin1,
                _ => return Err(invalid_env("CHARSET", &v)),
            };
        }
        if let Some(v) = env_var("DECIMAL_SEPARATOR") {
            let mut chars = v.chars();
            config.decimal_separator = match (chars.next(), chars.next()) {
                (Some(c), None) => Some(c),
                _ => return Err(invalid_env("DECIMAL_SEPARATOR", &v)),
            };
        }
        if let Some(v) = env_var("COERCE_INVALID_DATES") {
            config.coerce_invalid_dates = parse_flag("COERCE_INVALID_DATES", &v)?;
        }
        if let Some(v) = env_var("USE_BOOKMARKS") {
            config.use_bookmarks = parse_flag("USE_BOOKMARKS", &v)?;
        }
        if let Some(v) = env_var("LOGGING") {
            config.logging = parse_flag("LOGGING", &v)?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.rowset_size == 0 {
            return Err(DriverError::InvalidArgument(
                "rowset_size must be at least 1".to_string(),
            ));
        }
        if matches!(self.decimal_separator, Some(c) if c.is_ascii_digit()) {
            return Err(DriverError::InvalidArgument(
                "decimal_separator cannot be a digit".to_string(),
            ));
        }
        Ok(())
    }

    pub fn codec_options(&self) -> CodecOptions {
        CodecOptions {
            charset: self.charset,
            decimal_separator: self.decimal_separator,
            coerce_invalid_dates: self.coerce_invalid_dates,
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(format!("{}{}", ENV_PREFIX, name))
        .ok()
        .filter(|s| !s.is_empty())
}

fn invalid_env(name: &str, value: &str) -> DriverError {
    DriverError::InvalidArgument(format!("Invalid {}{}: '{}'", ENV_PREFIX, name, value))
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid_env(name, value)),
    }
}

/// Login handed to the transport once per connection. The password is wiped
/// from memory when dropped.
#[derive(Clone, Default)]
pub struct Credentials {
    pub user: String,
    password: Zeroizing<String>,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: Zeroizing::new(password.into()),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

/// Everything a connection needs that would otherwise live in process-wide
/// state.
#[derive(Debug, Clone, Default)]
pub struct DriverContext {
    pub config: DriverConfig,
    pub credentials: Credentials,
}

impl DriverContext {
    pub fn new(config: DriverConfig, credentials: Credentials) -> Self {
        Self {
            config,
            credentials,
        }
    }
}
