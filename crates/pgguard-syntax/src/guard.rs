//! Guard modes, options, and the SQL envelopes they render.
//!
//! Two envelopes exist. The policy-exists guard consults `pg_policy` so a
//! `CREATE POLICY` is skipped once the policy is present. The table-exists
//! guard consults `information_schema.tables` so a `DO` block is skipped
//! while its target table has not been created yet.

use std::fmt;

use crate::error::GuardError;

/// Schema targeted when none is configured.
pub const DEFAULT_SCHEMA: &str = "public";

/// Selects which statements are located and which guard they receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GuardMode {
    /// Wrap bare `CREATE POLICY` statements in a `pg_policy` existence check.
    PolicyExists,
    /// Wrap policy and trigger `DO` blocks in a table existence check.
    TableExists,
}

impl fmt::Display for GuardMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PolicyExists => f.write_str("policy-exists"),
            Self::TableExists => f.write_str("table-exists"),
        }
    }
}

/// Options controlling a guard pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardOptions {
    mode: GuardMode,
    schema: String,
}

impl GuardOptions {
    /// Creates options for `mode` targeting the [`DEFAULT_SCHEMA`].
    #[must_use]
    pub fn new(mode: GuardMode) -> Self {
        Self {
            mode,
            schema: DEFAULT_SCHEMA.to_owned(),
        }
    }

    /// Targets `schema` instead of the default.
    ///
    /// # Errors
    ///
    /// Returns [`GuardError::InvalidSchema`] when the name is empty or
    /// contains quotes or whitespace, none of which survive interpolation into
    /// both quoted identifiers and string literals.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Result<Self, GuardError> {
        let schema_name = schema.into();
        if schema_name.is_empty() {
            return Err(GuardError::invalid_schema(schema_name, "must not be empty"));
        }
        if schema_name
            .chars()
            .any(|ch| ch == '"' || ch == '\'' || ch.is_whitespace())
        {
            return Err(GuardError::invalid_schema(
                schema_name,
                "must not contain quotes or whitespace",
            ));
        }
        self.schema = schema_name;
        Ok(self)
    }

    /// Returns the guard mode.
    #[must_use]
    pub const fn mode(&self) -> GuardMode {
        self.mode
    }

    /// Returns the targeted schema.
    #[must_use]
    pub fn schema(&self) -> &str {
        &self.schema
    }
}

/// Escapes a value for use inside a single-quoted SQL literal.
pub(crate) fn sql_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Condition fragment identifying the `pg_policy` check for one policy.
pub(crate) fn policy_check_markers(name: &str, table: &str) -> [String; 2] {
    [
        format!("p.polname = '{}'", sql_literal(name)),
        format!("c.relname = '{}'", sql_literal(table)),
    ]
}

/// Condition fragment identifying the table existence check for one table.
pub(crate) fn table_check_marker(schema: &str, table: &str) -> String {
    format!(
        "table_schema='{}' AND table_name = '{}'",
        sql_literal(schema),
        sql_literal(table)
    )
}

/// Wraps a bare policy statement in a `pg_policy` existence check.
pub(crate) fn render_policy_guard(schema: &str, name: &str, table: &str, statement: &str) -> String {
    format!(
        "DO $$\nBEGIN\n  IF NOT EXISTS (SELECT 1 FROM pg_policy p \
         JOIN pg_class c ON p.polrelid = c.oid \
         JOIN pg_namespace n ON c.relnamespace = n.oid \
         WHERE p.polname = '{name}' AND n.nspname = '{schema}' AND c.relname = '{table}') THEN\n    \
         {statement}\n  END IF;\nEND\n$$;",
        name = sql_literal(name),
        schema = sql_literal(schema),
        table = sql_literal(table),
        statement = statement.trim(),
    )
}

/// Wraps a `DO` block body in a table existence check.
pub(crate) fn render_table_guard(schema: &str, table: &str, body: &str) -> String {
    format!(
        "DO $$\nBEGIN\n  IF EXISTS (SELECT 1 FROM information_schema.tables WHERE {marker}) THEN\n\
         {body}\n  END IF;\nEND\n$$;",
        marker = table_check_marker(schema, table),
    )
}
