//! Guard rewrite engine.
//!
//! A pass scans the document once, decides for every located statement
//! whether it needs a guard, and then splices all guards into a copy of the
//! source by byte span. Replacing by span rather than by text means two
//! byte-identical statements are each wrapped exactly once.

use std::ops::Range;

use tracing::debug;

use crate::error::GuardError;
use crate::guard::{
    GuardMode, GuardOptions, policy_check_markers, render_policy_guard, render_table_guard,
    table_check_marker,
};
use crate::position::line_at;
use crate::scanner::{DoBlock, PolicyCandidate, Scanner};
use crate::statement::{GuardedStatement, SkipReason, SkippedStatement, StatementMatch};

/// Engine for applying guards to migration text.
#[derive(Debug, Clone)]
pub struct GuardRewriter {
    options: GuardOptions,
}

impl GuardRewriter {
    /// Creates a rewriter for the given options.
    #[must_use]
    pub const fn new(options: GuardOptions) -> Self {
        Self { options }
    }

    /// Returns the options this rewriter applies.
    #[must_use]
    pub const fn options(&self) -> &GuardOptions {
        &self.options
    }

    /// Applies the configured guard to every unguarded statement in `source`.
    ///
    /// The source is never modified; the transformed document is returned in
    /// the report together with the statements that were wrapped or skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the statement patterns fail to compile for the
    /// configured schema, or if the rewrite plan is internally inconsistent.
    pub fn apply(&self, source: &str) -> Result<GuardReport, GuardError> {
        let scanner = Scanner::new(self.options.schema())?;
        let blocks = scanner.do_blocks(source);

        let mut plan = RewritePlan::default();
        match self.options.mode() {
            GuardMode::PolicyExists => {
                for candidate in scanner.bare_policies(source, &blocks) {
                    self.plan_policy(source, &candidate, &mut plan);
                }
            }
            GuardMode::TableExists => {
                for statement in scanner.guardable_blocks(source, &blocks) {
                    self.plan_block(source, &statement, &mut plan);
                }
            }
        }

        if plan.wrapped.is_empty() {
            return Ok(GuardReport {
                output: source.to_owned(),
                wrapped: Vec::new(),
                skipped: plan.skipped,
            });
        }

        let output = apply_replacements(source, &plan.replacements)?;
        Ok(GuardReport {
            output,
            wrapped: plan.wrapped,
            skipped: plan.skipped,
        })
    }

    fn plan_policy(&self, source: &str, candidate: &PolicyCandidate, plan: &mut RewritePlan) {
        let statement = &candidate.statement;
        let line = line_at(source, statement.byte_range().start);

        if let Some(block) = &candidate.enclosing {
            let reason = policy_skip_reason(source, statement, block);
            debug!(
                kind = %statement.kind(),
                table = statement.table(),
                line,
                reason = %reason,
                "skipping statement"
            );
            plan.skipped
                .push(SkippedStatement::new(statement, line, reason));
            return;
        }

        let text = render_policy_guard(
            self.options.schema(),
            statement.name().unwrap_or_default(),
            statement.table(),
            statement.text(source),
        );
        plan.push(statement, line, text);
    }

    fn plan_block(&self, source: &str, statement: &StatementMatch, plan: &mut RewritePlan) {
        let line = line_at(source, statement.byte_range().start);
        let marker = table_check_marker(self.options.schema(), statement.table());

        if statement.body(source).contains(&marker) {
            debug!(
                kind = %statement.kind(),
                table = statement.table(),
                line,
                "skipping guarded block"
            );
            plan.skipped.push(SkippedStatement::new(
                statement,
                line,
                SkipReason::AlreadyGuarded,
            ));
            return;
        }

        let text = render_table_guard(
            self.options.schema(),
            statement.table(),
            statement.body(source),
        );
        plan.push(statement, line, text);
    }
}

/// Decides why a policy inside a `DO` block is left alone.
fn policy_skip_reason(source: &str, statement: &StatementMatch, block: &DoBlock) -> SkipReason {
    let body = source.get(block.body.clone()).unwrap_or_default();
    let markers = policy_check_markers(statement.name().unwrap_or_default(), statement.table());
    if markers.iter().all(|marker| body.contains(marker.as_str())) {
        SkipReason::AlreadyGuarded
    } else {
        SkipReason::InsideDoBlock
    }
}

#[derive(Debug, Default)]
struct RewritePlan {
    replacements: Vec<Replacement>,
    wrapped: Vec<GuardedStatement>,
    skipped: Vec<SkippedStatement>,
}

impl RewritePlan {
    fn push(&mut self, statement: &StatementMatch, line: u32, text: String) {
        debug!(
            kind = %statement.kind(),
            table = statement.table(),
            line,
            "wrapping statement"
        );
        self.replacements.push(Replacement {
            range: statement.byte_range(),
            text: text.clone(),
        });
        self.wrapped
            .push(GuardedStatement::new(statement, line, text));
    }
}

#[derive(Debug)]
struct Replacement {
    range: Range<usize>,
    text: String,
}

/// Splices replacements into `source` from the end towards the start so
/// earlier offsets stay valid.
fn apply_replacements(source: &str, replacements: &[Replacement]) -> Result<String, GuardError> {
    let mut sorted: Vec<&Replacement> = replacements.iter().collect();
    sorted.sort_by(|a, b| b.range.start.cmp(&a.range.start));

    for pair in sorted.windows(2) {
        if let [later, earlier] = pair {
            if earlier.range.end > later.range.start {
                return Err(GuardError::overlapping_spans(
                    earlier.range.clone(),
                    later.range.clone(),
                ));
            }
        }
    }

    let mut result = source.to_owned();
    for replacement in sorted {
        let range = replacement.range.clone();
        if range.start > range.end || range.end > result.len() {
            return Err(GuardError::internal_error(format!(
                "rewrite span {range:?} is outside the document"
            )));
        }
        if !result.is_char_boundary(range.start) || !result.is_char_boundary(range.end) {
            return Err(GuardError::internal_error(
                "rewrite span is not on a UTF-8 boundary",
            ));
        }
        result.replace_range(range, &replacement.text);
    }

    Ok(result)
}

/// Result of a guard pass.
#[derive(Debug, Clone)]
pub struct GuardReport {
    output: String,
    wrapped: Vec<GuardedStatement>,
    skipped: Vec<SkippedStatement>,
}

impl GuardReport {
    /// Returns the transformed document.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Consumes the report, returning the transformed document.
    #[must_use]
    pub fn into_output(self) -> String {
        self.output
    }

    /// Returns the statements that were wrapped, in document order.
    #[must_use]
    pub fn wrapped(&self) -> &[GuardedStatement] {
        &self.wrapped
    }

    /// Returns the statements that were located but left untouched.
    #[must_use]
    pub fn skipped(&self) -> &[SkippedStatement] {
        &self.skipped
    }

    /// Returns the number of replacements made.
    #[must_use]
    pub fn num_replacements(&self) -> usize {
        self.wrapped.len()
    }

    /// Returns whether any statement was wrapped.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.wrapped.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replacement(range: Range<usize>, text: &str) -> Replacement {
        Replacement {
            range,
            text: text.to_owned(),
        }
    }

    #[test]
    fn replacements_apply_from_the_end() {
        let source = "aaa bbb ccc";
        let output = apply_replacements(
            source,
            &[replacement(0..3, "X"), replacement(8..11, "ZZZZ")],
        )
        .unwrap_or_else(|err| panic!("rewrite: {err}"));

        assert_eq!(output, "X bbb ZZZZ");
    }

    #[test]
    fn overlapping_replacements_are_rejected() {
        let result = apply_replacements("abcdef", &[replacement(0..4, "x"), replacement(2..6, "y")]);
        assert!(matches!(result, Err(GuardError::OverlappingSpans { .. })));
    }

    #[test]
    fn non_boundary_spans_are_rejected() {
        let result = apply_replacements("é", &[replacement(1..2, "e")]);
        assert!(matches!(result, Err(GuardError::InternalError { .. })));
    }

    #[test]
    fn documents_without_statements_pass_through() {
        let rewriter = GuardRewriter::new(GuardOptions::new(GuardMode::TableExists));
        let report = rewriter
            .apply("select 1;\n")
            .unwrap_or_else(|err| panic!("rewrite: {err}"));

        assert!(!report.has_changes());
        assert_eq!(report.num_replacements(), 0);
        assert_eq!(report.output(), "select 1;\n");
    }
}
