//! Error types for the CLI runtime.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use pgguard_syntax::GuardError;
use thiserror::Error;

use crate::persist::PersistError;
use crate::telemetry::TelemetryError;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("failed to load configuration: {0}")]
    LoadConfiguration(Arc<ortho_config::OrthoError>),
    #[error("{0}")]
    CliUsage(clap::Error),
    #[error("failed to initialise logging: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("failed to read {}: {source}", path.display())]
    ReadSource { path: PathBuf, source: io::Error },
    #[error("{}: {source}", path.display())]
    Guard { path: PathBuf, source: GuardError },
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("failed to write report: {0}")]
    WriteReport(io::Error),
}
