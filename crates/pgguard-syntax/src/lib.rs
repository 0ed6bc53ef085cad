//! Idempotency guards for PostgreSQL migration text.
//!
//! This crate locates DDL statements in migration files that fail when a
//! migration is applied twice, or before the tables they reference exist,
//! and wraps them in conditional `DO` blocks:
//!
//! - **Policy guards** via [`GuardMode::PolicyExists`] wrap bare
//!   `create policy "name" ON "public"."table" AS ...` statements in an
//!   `IF NOT EXISTS` check against `pg_policy`
//! - **Table guards** via [`GuardMode::TableExists`] wrap `DO $$ BEGIN ... END
//!   $$;` blocks that create a policy or trigger in an `IF EXISTS` check
//!   against `information_schema.tables`
//!
//! Both passes are idempotent: statements already carrying their guard are
//! reported as skipped and left byte-for-byte intact.
//!
//! The crate performs no I/O. [`GuardRewriter::apply`] returns the rewritten
//! document in a [`GuardReport`] and the caller decides what to persist.
//!
//! # Example
//!
//! ```
//! use pgguard_syntax::{GuardMode, GuardOptions, GuardRewriter};
//!
//! let source = "create policy \"read\" ON \"public\".\"orders\" AS permissive\n\
//!               for select to authenticated using (true);\n";
//!
//! let rewriter = GuardRewriter::new(GuardOptions::new(GuardMode::PolicyExists));
//! let report = rewriter.apply(source)?;
//!
//! assert!(report.has_changes());
//! assert!(report.output().contains("p.polname = 'read'"));
//! # Ok::<(), pgguard_syntax::GuardError>(())
//! ```

mod error;
mod guard;
mod position;
mod rewriter;
mod scanner;
mod statement;

pub use error::GuardError;
pub use guard::{DEFAULT_SCHEMA, GuardMode, GuardOptions};
pub use rewriter::{GuardReport, GuardRewriter};
pub use statement::{
    GuardedStatement, SkipReason, SkippedStatement, StatementKind, StatementMatch,
    StatementShape,
};

#[cfg(test)]
mod tests;
