//! Configuration bootstrapping for the pgguard CLI.
//!
//! Configuration flags sit in front of the subcommand
//! (`pgguard --schema app policies m.sql`). They are peeled off into their
//! own argument vector for `ortho_config`, and clap only ever sees the
//! program name followed by the subcommand tokens.

use std::ffi::{OsStr, OsString};

use ortho_config::OrthoConfig;
use pgguard_config::Config;

use crate::AppError;

/// Long flags owned by [`Config`]. Each takes exactly one value, either
/// inline (`--schema=app`) or as the next argument.
///
/// MAINTENANCE: keep in sync with the fields of `pgguard_config::Config`.
const CONFIG_CLI_FLAGS: &[&str] = &["--config-path", "--log-filter", "--log-format", "--schema"];

pub(crate) trait ConfigLoader {
    /// Loads configuration from the configuration half of the arguments.
    ///
    /// `args` starts with the program name and holds only flags listed in
    /// `CONFIG_CLI_FLAGS` together with their values.
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

/// Loads layered configuration through `ortho_config`.
pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_from_iter(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

/// The argument vector split into its configuration and command halves.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ConfigArgumentSplit {
    pub(crate) config_arguments: Vec<OsString>,
    pub(crate) command_arguments: Vec<OsString>,
}

/// Number of arguments a leading configuration flag occupies, or `None` when
/// `argument` is not a configuration flag.
fn config_flag_width(argument: &OsStr) -> Option<usize> {
    let text = argument.to_str()?;
    let (flag, inline) = text
        .split_once('=')
        .map_or((text, false), |(flag, _)| (flag, true));
    CONFIG_CLI_FLAGS
        .contains(&flag)
        .then_some(if inline { 1 } else { 2 })
}

/// Splits `args` at the first argument that is not a configuration flag or
/// one of their values. The program name is kept at the head of both halves.
pub(crate) fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let Some((program, rest)) = args.split_first() else {
        return ConfigArgumentSplit {
            config_arguments: Vec::new(),
            command_arguments: Vec::new(),
        };
    };

    let mut boundary = 0;
    while let Some(width) = rest.get(boundary).and_then(|argument| config_flag_width(argument)) {
        boundary = boundary.saturating_add(width).min(rest.len());
    }
    let (config, command) = rest.split_at(boundary);

    let with_program = |tail: &[OsString]| {
        std::iter::once(program)
            .chain(tail)
            .cloned()
            .collect::<Vec<_>>()
    };
    ConfigArgumentSplit {
        config_arguments: with_program(config),
        command_arguments: with_program(command),
    }
}
