//! Regular expressions recognising guardable statements.

/// An unconditional `DO $$ BEGIN ... END $$;` block, capturing the body.
///
/// The body is matched lazily so the first `END $$;` closes the block, and
/// surrounding whitespace is left outside the capture.
pub(super) const DO_BLOCK: &str = r"(?s)DO \$\$\s*BEGIN\s*(.*?)\s*END\s*\$\$;";

/// The head of a bare `create policy "name" ON "schema"."table" AS` statement.
pub(super) fn policy_head(schema: &str) -> String {
    format!(
        r#"(?i)create policy "(?P<name>[^"]+)"\s+ON\s+"{}"\."(?P<table>[^"]+)"\s+AS"#,
        regex::escape(schema)
    )
}

/// The quoted `ON "schema"."table"` target of a policy inside a block.
pub(super) fn policy_table(schema: &str) -> String {
    format!(r#"ON\s+"{}"\."(\w+)""#, regex::escape(schema))
}

/// The unquoted `ON schema.table` target of a trigger inside a block.
pub(super) fn trigger_table(schema: &str) -> String {
    format!(r"ON\s+{}\.(\w+)", regex::escape(schema))
}
