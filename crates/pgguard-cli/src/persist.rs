//! Backup-then-write persistence for rewritten migration files.
//!
//! The pristine source is copied to its backup path before the rewritten text
//! replaces it. Both writes go through a temporary sibling file that is
//! fsync'd and renamed into place, so a failed write never leaves a truncated
//! file behind and a failed backup never touches the source.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::Builder;
use thiserror::Error;

/// Errors raised while persisting a rewrite.
#[derive(Debug, Error)]
pub(crate) enum PersistError {
    #[error("backup suffix {suffix:?} is invalid: {message}")]
    InvalidSuffix {
        suffix: String,
        message: &'static str,
    },
    #[error("backup path for {} would overwrite the source itself", path.display())]
    Collision { path: PathBuf },
    #[error("failed to write backup {}: {source}", path.display())]
    Backup { path: PathBuf, source: io::Error },
    #[error("failed to write {}: {source}", path.display())]
    Output { path: PathBuf, source: io::Error },
}

/// Derives the backup path by replacing the final extension with `suffix`.
///
/// `migration.sql` with `.sql.bak` becomes `migration.sql.bak`; a path without
/// an extension has the suffix appended.
pub(crate) fn backup_path(path: &Path, suffix: &str) -> Result<PathBuf, PersistError> {
    let extension = suffix.trim_start_matches('.');
    if extension.is_empty() {
        return Err(PersistError::InvalidSuffix {
            suffix: suffix.to_owned(),
            message: "must not be empty",
        });
    }
    if extension.contains(['/', '\\']) {
        return Err(PersistError::InvalidSuffix {
            suffix: suffix.to_owned(),
            message: "must not contain path separators",
        });
    }

    let backup = path.with_extension(extension);
    if backup == path {
        return Err(PersistError::Collision {
            path: path.to_path_buf(),
        });
    }
    Ok(backup)
}

/// Writes `original` to `backup` and then `rewritten` to `path`.
///
/// The source is only replaced once the backup has been persisted. A
/// symlinked source is resolved first so the link survives and its target
/// receives the rewrite.
pub(crate) fn write_with_backup(
    path: &Path,
    backup: &Path,
    original: &str,
    rewritten: &str,
) -> Result<(), PersistError> {
    let output_error = |source| PersistError::Output {
        path: path.to_path_buf(),
        source,
    };
    let target = fs::canonicalize(path).map_err(output_error)?;
    let permissions = fs::metadata(&target).ok().map(|metadata| metadata.permissions());

    atomic_write(backup, original.as_bytes(), permissions.as_ref()).map_err(|source| {
        PersistError::Backup {
            path: backup.to_path_buf(),
            source,
        }
    })?;
    tracing::info!(
        target: "pgguard::persist",
        backup = %backup.display(),
        "backup written"
    );

    atomic_write(&target, rewritten.as_bytes(), permissions.as_ref()).map_err(output_error)?;
    tracing::info!(
        target: "pgguard::persist",
        path = %path.display(),
        "source rewritten"
    );
    Ok(())
}

/// Writes the bytes to `path` via a temporary sibling and an atomic rename.
fn atomic_write(path: &Path, contents: &[u8], permissions: Option<&fs::Permissions>) -> io::Result<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut builder = Builder::new();
    builder.prefix(
        path.file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("pgguard"),
    );
    if let Some(permissions) = permissions {
        builder.permissions(permissions.clone());
    }

    let mut file = builder.tempfile_in(directory)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|error| error.error)?;
    Ok(())
}
