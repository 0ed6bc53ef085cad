//! Status lines written to stdout after a guard pass.

use std::io::{self, Write};
use std::path::Path;

use pgguard_syntax::GuardReport;

use crate::command::Outcome;

/// Writes the status for `outcome` against the file at `path`.
pub(crate) fn write_outcome<W: Write>(
    out: &mut W,
    path: &Path,
    outcome: &Outcome,
) -> io::Result<()> {
    let file = path.display();
    match outcome {
        Outcome::Unchanged => writeln!(out, "no changes needed for {file}"),
        Outcome::Written { report, backup } => writeln!(
            out,
            "wrapped {} in {file}; backup written to {}",
            statements(report),
            backup.display()
        ),
        Outcome::Pending { report } => {
            writeln!(out, "would wrap {} in {file}", statements(report))?;
            for statement in report.wrapped() {
                writeln!(out, "  {statement}")?;
            }
            Ok(())
        }
    }
}

fn statements(report: &GuardReport) -> String {
    match report.num_replacements() {
        1 => "1 statement".to_owned(),
        count => format!("{count} statements"),
    }
}
