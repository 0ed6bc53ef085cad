//! CLI argument definitions for pgguard.
//!
//! Configuration flags (`--log-filter`, `--schema`, ...) are not declared
//! here: they are split off the argument vector and handed to the
//! configuration loader before clap sees the remaining tokens.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use pgguard_syntax::GuardMode;

/// Command-line interface for the pgguard migration guard tool.
#[derive(Parser, Debug)]
#[command(
    name = "pgguard",
    version,
    about = "Wraps PostgreSQL migration DDL in idempotency guards",
    disable_help_subcommand = true
)]
pub(crate) struct Cli {
    /// The guard pass to run.
    #[command(subcommand)]
    pub(crate) command: GuardCommand,
}

/// Guard passes supported by the CLI.
#[derive(Subcommand, Debug, Clone)]
pub(crate) enum GuardCommand {
    /// Wraps bare CREATE POLICY statements in a pg_policy existence check.
    Policies(GuardArgs),
    /// Wraps policy and trigger DO blocks in a table existence check.
    Tables(GuardArgs),
}

impl GuardCommand {
    /// Returns the guard mode this command runs.
    pub(crate) const fn mode(&self) -> GuardMode {
        match self {
            Self::Policies(_) => GuardMode::PolicyExists,
            Self::Tables(_) => GuardMode::TableExists,
        }
    }

    /// Returns the arguments shared by every pass.
    pub(crate) const fn args(&self) -> &GuardArgs {
        match self {
            Self::Policies(args) | Self::Tables(args) => args,
        }
    }
}

/// Arguments shared by every guard pass.
#[derive(Args, Debug, Clone)]
pub(crate) struct GuardArgs {
    /// Migration file to rewrite in place.
    #[arg(value_name = "FILE")]
    pub(crate) path: PathBuf,
    /// Lists the statements that would be wrapped without writing anything.
    #[arg(long, conflicts_with = "check")]
    pub(crate) dry_run: bool,
    /// Writes nothing and exits with a failure status if any statement is
    /// unguarded.
    #[arg(long)]
    pub(crate) check: bool,
    /// Suffix replacing the file extension to form the backup path.
    #[arg(long, value_name = "SUFFIX")]
    pub(crate) backup_suffix: Option<String>,
}
