//! End-to-end tests for pgguard-syntax using insta for snapshot testing.
//!
//! These tests run whole migration files through the public API and pin the
//! rendered guards with snapshots.

use insta::assert_snapshot;
use rstest::rstest;

use pgguard_syntax::{GuardError, GuardMode, GuardOptions, GuardReport, GuardRewriter};

const POLICIES: &str = include_str!("fixtures/policies.sql");
const BLOCKS: &str = include_str!("fixtures/blocks.sql");

fn guard(mode: GuardMode, source: &str) -> GuardReport {
    GuardRewriter::new(GuardOptions::new(mode))
        .apply(source)
        .unwrap_or_else(|err| panic!("rewrite: {err}"))
}

// =============================================================================
// Happy Path: Snapshots
// =============================================================================

#[test]
fn policy_guards_for_migration() {
    let report = guard(GuardMode::PolicyExists, POLICIES);
    assert_eq!(report.num_replacements(), 2);
    assert_snapshot!(report.output());
}

#[test]
fn table_guards_for_migration() {
    let report = guard(GuardMode::TableExists, BLOCKS);
    assert_eq!(report.num_replacements(), 2);
    assert_snapshot!(report.output());
}

// =============================================================================
// Idempotence
// =============================================================================

#[rstest]
#[case(GuardMode::PolicyExists, POLICIES)]
#[case(GuardMode::TableExists, BLOCKS)]
fn second_pass_changes_nothing(#[case] mode: GuardMode, #[case] source: &str) {
    let first = guard(mode, source);
    assert!(first.has_changes());

    let second = guard(mode, first.output());
    assert!(!second.has_changes(), "second pass rewrote: {:?}", second.wrapped());
    assert_eq!(second.output(), first.output());
    assert_eq!(second.skipped().len(), first.wrapped().len());
}

#[rstest]
#[case(GuardMode::PolicyExists)]
#[case(GuardMode::TableExists)]
fn text_outside_guards_is_preserved(#[case] mode: GuardMode) {
    let source = "-- header\nselect 1;\n";
    let report = guard(mode, source);
    assert!(!report.has_changes());
    assert_eq!(report.into_output(), source);
}

// =============================================================================
// Unhappy Path
// =============================================================================

#[test]
fn invalid_schema_is_reported() {
    let error = GuardOptions::new(GuardMode::TableExists)
        .with_schema("bad schema")
        .expect_err("whitespace must be rejected");

    assert!(matches!(error, GuardError::InvalidSchema { .. }));
    assert_eq!(
        error.to_string(),
        "invalid schema name \"bad schema\": must not contain quotes or whitespace"
    );
}
