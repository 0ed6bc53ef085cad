//! Guard command execution: read, rewrite, persist.

use std::fs;
use std::path::{Path, PathBuf};

use pgguard_syntax::{GuardMode, GuardOptions, GuardReport, GuardRewriter};

use crate::AppError;
use crate::cli::GuardCommand;
use crate::persist::{backup_path, write_with_backup};

/// Backup suffix used by the policy-exists pass.
pub(crate) const POLICY_BACKUP_SUFFIX: &str = ".sql.policywrap.bak";
/// Backup suffix used by the table-exists pass.
pub(crate) const TABLE_BACKUP_SUFFIX: &str = ".sql.bak";

/// Returns the default backup suffix for a guard mode.
pub(crate) const fn default_backup_suffix(mode: GuardMode) -> &'static str {
    match mode {
        GuardMode::PolicyExists => POLICY_BACKUP_SUFFIX,
        GuardMode::TableExists => TABLE_BACKUP_SUFFIX,
    }
}

/// What to do with a rewrite once it has been computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunAction {
    /// Persist the backup and the rewritten source.
    Write,
    /// Report pending changes and succeed.
    DryRun,
    /// Report pending changes and fail if there are any.
    Check,
}

/// A fully resolved guard run against one file.
#[derive(Debug, Clone)]
pub(crate) struct GuardRequest {
    pub(crate) mode: GuardMode,
    pub(crate) path: PathBuf,
    pub(crate) action: RunAction,
    pub(crate) backup_suffix: String,
}

impl From<GuardCommand> for GuardRequest {
    fn from(command: GuardCommand) -> Self {
        let mode = command.mode();
        let (GuardCommand::Policies(args) | GuardCommand::Tables(args)) = command;
        let action = if args.check {
            RunAction::Check
        } else if args.dry_run {
            RunAction::DryRun
        } else {
            RunAction::Write
        };
        Self {
            mode,
            path: args.path,
            action,
            backup_suffix: args
                .backup_suffix
                .unwrap_or_else(|| default_backup_suffix(mode).to_owned()),
        }
    }
}

/// Result of running a guard pass.
#[derive(Debug)]
pub(crate) enum Outcome {
    /// Nothing needed wrapping; no file was written.
    Unchanged,
    /// Statements were wrapped and both files persisted.
    Written { report: GuardReport, backup: PathBuf },
    /// Statements need wrapping but the run was not allowed to write.
    Pending { report: GuardReport },
}

/// Runs the request against the file system.
///
/// The source is read and rewritten before anything is written. The backup
/// path is validated up front, so a bad suffix fails even when the file needs
/// no changes.
pub(crate) fn execute(request: &GuardRequest, schema: &str) -> Result<Outcome, AppError> {
    let options = GuardOptions::new(request.mode)
        .with_schema(schema)
        .map_err(|source| guard_error(&request.path, source))?;
    let backup = backup_path(&request.path, &request.backup_suffix)?;

    let original = fs::read_to_string(&request.path).map_err(|source| AppError::ReadSource {
        path: request.path.clone(),
        source,
    })?;

    let report = GuardRewriter::new(options)
        .apply(&original)
        .map_err(|source| guard_error(&request.path, source))?;

    tracing::debug!(
        target: "pgguard::command",
        path = %request.path.display(),
        mode = %request.mode,
        wrapped = report.num_replacements(),
        skipped = report.skipped().len(),
        "guard pass complete"
    );

    if !report.has_changes() {
        return Ok(Outcome::Unchanged);
    }

    match request.action {
        RunAction::Write => {
            write_with_backup(&request.path, &backup, &original, report.output())?;
            Ok(Outcome::Written { report, backup })
        }
        RunAction::DryRun | RunAction::Check => Ok(Outcome::Pending { report }),
    }
}

fn guard_error(path: &Path, source: pgguard_syntax::GuardError) -> AppError {
    AppError::Guard {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use super::*;

    const POLICY: &str =
        "create policy \"p1\" ON \"public\".\"t1\" AS PERMISSIVE FOR SELECT USING (true);\n";

    struct Workspace {
        _dir: TempDir,
        path: PathBuf,
    }

    impl Workspace {
        fn request(&self, mode: GuardMode, action: RunAction) -> GuardRequest {
            GuardRequest {
                mode,
                path: self.path.clone(),
                action,
                backup_suffix: default_backup_suffix(mode).to_owned(),
            }
        }

        fn contents(&self) -> String {
            fs::read_to_string(&self.path).expect("read source")
        }
    }

    #[fixture]
    fn workspace() -> Workspace {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("migration.sql");
        fs::write(&path, POLICY).expect("seed source");
        Workspace { _dir: dir, path }
    }

    #[rstest]
    fn write_persists_backup_and_rewrite(workspace: Workspace) {
        let request = workspace.request(GuardMode::PolicyExists, RunAction::Write);

        let outcome = execute(&request, "public").expect("execute");

        let Outcome::Written { report, backup } = outcome else {
            panic!("expected a write, got {outcome:?}");
        };
        assert_eq!(report.num_replacements(), 1);
        assert_eq!(backup, workspace.path.with_extension("sql.policywrap.bak"));
        assert_eq!(fs::read_to_string(&backup).expect("read backup"), POLICY);
        assert_eq!(workspace.contents(), report.output());
    }

    #[rstest]
    #[case(RunAction::DryRun)]
    #[case(RunAction::Check)]
    fn non_writing_actions_leave_files_alone(workspace: Workspace, #[case] action: RunAction) {
        let request = workspace.request(GuardMode::PolicyExists, action);

        let outcome = execute(&request, "public").expect("execute");

        assert!(matches!(outcome, Outcome::Pending { .. }));
        assert_eq!(workspace.contents(), POLICY);
        assert!(!workspace.path.with_extension("sql.policywrap.bak").exists());
    }

    #[rstest]
    fn other_mode_reports_unchanged(workspace: Workspace) {
        let request = workspace.request(GuardMode::TableExists, RunAction::Write);

        let outcome = execute(&request, "public").expect("execute");

        assert!(matches!(outcome, Outcome::Unchanged));
        assert!(!workspace.path.with_extension("sql.bak").exists());
    }

    #[rstest]
    fn missing_source_is_a_read_error(workspace: Workspace) {
        let mut request = workspace.request(GuardMode::PolicyExists, RunAction::Write);
        request.path = workspace.path.with_file_name("absent.sql");

        let error = execute(&request, "public").expect_err("missing file");

        assert!(matches!(error, AppError::ReadSource { .. }));
    }

    #[rstest]
    fn invalid_schema_fails_before_reading(workspace: Workspace) {
        let request = workspace.request(GuardMode::PolicyExists, RunAction::Write);

        let error = execute(&request, "my'schema").expect_err("bad schema");

        assert!(matches!(error, AppError::Guard { .. }));
        assert_eq!(workspace.contents(), POLICY);
    }
}
