use crate::logging::LogFormat;

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Default schema targeted by generated guards.
pub const DEFAULT_SCHEMA: &str = "public";

/// Default log filter expression used by the binaries.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

/// Owned schema value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_schema_string() -> String {
    DEFAULT_SCHEMA.to_owned()
}
