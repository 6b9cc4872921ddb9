//! Core runtime configuration.
//!
//! # Invariants
//! - Timeouts are strictly positive.
//! - Missing fields fall back to defaults, so `{}` is a valid config.

use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Default deadline for client-facing accessors and layout bootstrap.
pub const DEFAULT_TIMEOUT_MS: u64 = 2_000;

#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    ZeroTimeout(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid core config: {err}"),
            Self::ZeroTimeout(field) => write!(f, "`{field}` must be greater than zero"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::ZeroTimeout(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub accessor_timeout_ms: u64,
    pub bootstrap_timeout_ms: u64,
    pub log_level: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            accessor_timeout_ms: DEFAULT_TIMEOUT_MS,
            bootstrap_timeout_ms: DEFAULT_TIMEOUT_MS,
            log_level: default_log_level().to_string(),
        }
    }
}

impl CoreConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(input).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.accessor_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("accessor_timeout_ms"));
        }
        if self.bootstrap_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("bootstrap_timeout_ms"));
        }
        Ok(())
    }

    pub fn accessor_timeout(&self) -> Duration {
        Duration::from_millis(self.accessor_timeout_ms)
    }

    pub fn bootstrap_timeout(&self) -> Duration {
        Duration::from_millis(self.bootstrap_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, DEFAULT_TIMEOUT_MS};
    use std::time::Duration;

    #[test]
    fn empty_document_uses_defaults() {
        let config = CoreConfig::from_json_str("{}").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(
            config.accessor_timeout(),
            Duration::from_millis(DEFAULT_TIMEOUT_MS)
        );
    }

    #[test]
    fn partial_document_overrides_fields() {
        let config = CoreConfig::from_json_str(r#"{"bootstrap_timeout_ms": 500}"#).unwrap();
        assert_eq!(config.bootstrap_timeout(), Duration::from_millis(500));
        assert_eq!(config.accessor_timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = CoreConfig::from_json_str(r#"{"accessor_timeout_ms": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroTimeout("accessor_timeout_ms")));
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let err = CoreConfig::from_json_str("not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
