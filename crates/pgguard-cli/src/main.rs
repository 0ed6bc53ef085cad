//! CLI entrypoint for the pgguard migration guard tool.
//!
//! The binary delegates to [`pgguard_cli::run`], which loads configuration,
//! parses the subcommand, rewrites the target migration, and reports the
//! outcome.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    pgguard_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
