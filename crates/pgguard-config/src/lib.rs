//! Shared configuration for the pgguard toolchain.
//!
//! Configuration is layered by `ortho_config`: built-in defaults are
//! overridden by a TOML file (`--config-path` or `PGGUARD_CONFIG_PATH`), then
//! by `PGGUARD_*` environment variables, and finally by command-line flags.

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

mod defaults;
mod logging;

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_SCHEMA, default_log_filter, default_log_filter_string,
    default_log_format, default_schema_string,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved configuration for a pgguard run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "PGGUARD")]
pub struct Config {
    /// Filter expression handed to the tracing subscriber.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format of diagnostic logs.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Schema whose policies, triggers and tables receive guards.
    #[ortho_config(default = default_schema_string())]
    pub schema: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            schema: default_schema_string(),
        }
    }
}

impl Config {
    /// Returns the configured log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Returns the configured log format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Returns the schema guards are generated for.
    #[must_use]
    pub fn schema(&self) -> &str {
        &self.schema
    }
}
