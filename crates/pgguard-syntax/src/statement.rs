//! Located SQL statements and the outcome of guarding them.

use std::fmt;
use std::ops::Range;

/// The kind of DDL statement a candidate contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    /// A `CREATE POLICY` statement.
    Policy,
    /// A `CREATE TRIGGER` statement.
    Trigger,
}

impl StatementKind {
    /// Returns the lowercase name used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Policy => "policy",
            Self::Trigger => "trigger",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The textual shape a candidate was recognised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementShape {
    /// A bare `create policy "name" ON "schema"."table" AS ...` statement
    /// running up to the next blank line.
    BarePolicy,
    /// An unconditional `DO $$ BEGIN ... END $$;` block wrapping a policy or
    /// trigger definition.
    DoBlock,
}

/// A statement located in a source document.
///
/// Spans are byte ranges into the document the statement was scanned from.
/// For [`StatementShape::BarePolicy`] the body is the statement itself; for
/// [`StatementShape::DoBlock`] it is the text between `BEGIN` and `END`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementMatch {
    kind: StatementKind,
    shape: StatementShape,
    name: Option<String>,
    table: String,
    span: Range<usize>,
    body: Range<usize>,
}

impl StatementMatch {
    pub(crate) const fn new(
        kind: StatementKind,
        shape: StatementShape,
        name: Option<String>,
        table: String,
        span: Range<usize>,
        body: Range<usize>,
    ) -> Self {
        Self {
            kind,
            shape,
            name,
            table,
            span,
            body,
        }
    }

    /// Returns the statement kind.
    #[must_use]
    pub const fn kind(&self) -> StatementKind {
        self.kind
    }

    /// Returns the shape the statement was recognised in.
    #[must_use]
    pub const fn shape(&self) -> StatementShape {
        self.shape
    }

    /// Returns the policy name, when the shape carries one.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the unqualified table the statement targets.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the byte range of the whole statement.
    #[must_use]
    pub fn byte_range(&self) -> Range<usize> {
        self.span.clone()
    }

    /// Returns the byte range of the statement body.
    #[must_use]
    pub fn body_range(&self) -> Range<usize> {
        self.body.clone()
    }

    /// Returns the statement text within `source`.
    #[must_use]
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.byte_range()).unwrap_or_default()
    }

    /// Returns the body text within `source`.
    #[must_use]
    pub fn body<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.body_range()).unwrap_or_default()
    }
}

/// Why a located statement was left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The statement already sits behind the guard this mode would add.
    AlreadyGuarded,
    /// The bare policy sits inside some other `DO $$` block, where a nested
    /// dollar-quoted block would terminate the outer body.
    InsideDoBlock,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyGuarded => f.write_str("already guarded"),
            Self::InsideDoBlock => f.write_str("inside an unrelated DO block"),
        }
    }
}

/// A statement that was wrapped in a guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardedStatement {
    kind: StatementKind,
    name: Option<String>,
    table: String,
    line: u32,
    text: String,
}

impl GuardedStatement {
    pub(crate) fn new(statement: &StatementMatch, line: u32, text: String) -> Self {
        Self {
            kind: statement.kind,
            name: statement.name.clone(),
            table: statement.table.clone(),
            line,
            text,
        }
    }

    /// Returns the statement kind.
    #[must_use]
    pub const fn kind(&self) -> StatementKind {
        self.kind
    }

    /// Returns the policy name, when known.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the target table.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the one-based line the original statement started on.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// Returns the guarded replacement text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for GuardedStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.line, self.kind)?;
        if let Some(name) = &self.name {
            write!(f, " \"{name}\"")?;
        }
        write!(f, " on {}", self.table)
    }
}

/// A statement that was located but not rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedStatement {
    kind: StatementKind,
    table: String,
    line: u32,
    reason: SkipReason,
}

impl SkippedStatement {
    pub(crate) fn new(statement: &StatementMatch, line: u32, reason: SkipReason) -> Self {
        Self {
            kind: statement.kind,
            table: statement.table.clone(),
            line,
            reason,
        }
    }

    /// Returns the statement kind.
    #[must_use]
    pub const fn kind(&self) -> StatementKind {
        self.kind
    }

    /// Returns the target table.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the one-based line the statement starts on.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// Returns why the statement was skipped.
    #[must_use]
    pub const fn reason(&self) -> SkipReason {
        self.reason
    }
}
