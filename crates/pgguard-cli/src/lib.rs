//! Command-line runtime for pgguard.
//!
//! One invocation guards one migration file: configuration flags in front of
//! the subcommand are loaded through `ortho_config`, the subcommand is parsed
//! by clap, telemetry is installed, and the file goes through the read,
//! rewrite and persist cycle. The runtime writes to caller-supplied streams
//! so tests can drive it in-process with a substitute configuration loader.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;

mod cli;
mod command;
mod config;
mod errors;
mod output;
mod persist;
mod telemetry;

use cli::Cli;
use command::{GuardRequest, Outcome, RunAction, execute};
use config::{ConfigLoader, OrthoConfigLoader, split_config_arguments};
pub(crate) use errors::AppError;

/// Output sinks for one CLI run.
pub(crate) struct IoStreams<'a, W: Write, E: Write> {
    pub(crate) stdout: &'a mut W,
    pub(crate) stderr: &'a mut E,
}

impl<W: Write, E: Write> IoStreams<'_, W, E> {
    /// Maps the result of a run to an exit code, reporting errors on the way.
    ///
    /// Help and version requests reach this point as clap errors that belong
    /// on stdout with a success status.
    fn finish(&mut self, result: Result<ExitCode, AppError>) -> ExitCode {
        match result {
            Ok(exit_code) => exit_code,
            Err(AppError::CliUsage(error)) if !error.use_stderr() => {
                let _ = write!(self.stdout, "{error}");
                ExitCode::SUCCESS
            }
            Err(error) => {
                let _ = writeln!(self.stderr, "{error}");
                ExitCode::FAILURE
            }
        }
    }
}

/// Runs the CLI using the provided arguments and IO handles.
///
/// Status lines are written to `stdout`; errors are written to `stderr` and
/// yield a failure exit code.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let mut io = IoStreams { stdout, stderr };
    run_with_loader(args, &mut io, &OrthoConfigLoader)
}

/// Runs the CLI with a custom configuration loader.
pub(crate) fn run_with_loader<I, W, E, L>(
    args: I,
    io: &mut IoStreams<'_, W, E>,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    let args: Vec<OsString> = args.into_iter().collect();
    let result = guard_file(&args, &mut *io.stdout, loader);
    io.finish(result)
}

fn guard_file<W: Write, L: ConfigLoader>(
    args: &[OsString],
    stdout: &mut W,
    loader: &L,
) -> Result<ExitCode, AppError> {
    let split = split_config_arguments(args);
    let cli = Cli::try_parse_from(&split.command_arguments).map_err(AppError::CliUsage)?;
    let config = loader.load(&split.config_arguments)?;
    telemetry::initialise(&config)?;

    let request = GuardRequest::from(cli.command);
    let outcome = execute(&request, config.schema())?;
    output::write_outcome(stdout, &request.path, &outcome).map_err(AppError::WriteReport)?;

    Ok(exit_code(request.action, &outcome))
}

/// `--check` fails when the file still has unguarded statements.
fn exit_code(action: RunAction, outcome: &Outcome) -> ExitCode {
    match (action, outcome) {
        (RunAction::Check, Outcome::Pending { .. }) => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    }
}
