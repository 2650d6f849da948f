// src/cli/args.rs

use crate::cli::Cli;
use crate::constants::ALL_COMMANDS_VERB;
use crate::models::CommandType;
use crate::system::executor::Strategy;
use clap::Parser;
use clap::error::ErrorKind;
use std::ffi::OsString;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning the command line into [`Options`].
#[derive(Error, Debug)]
pub enum CliError {
    /// Rejected by clap, or a `--help`/`--version` request.
    #[error(transparent)]
    Clap(#[from] clap::Error),
    /// None of the verbs names a command type.
    #[error("No valid command given. Expected one or more of: build, test, push, all.")]
    NoValidCommand,
    /// `~` or `$VAR` in the manifest path could not be expanded.
    #[error("Could not expand manifest path '{path}': {reason}")]
    ManifestPath {
        /// The path as given.
        path: String,
        /// Why expansion failed.
        reason: String,
    },
}

impl CliError {
    /// Process exit code for this error: `0` when clap only printed help or
    /// the version, `1` otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Clap(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => 0,
            _ => 1,
        }
    }
}

/// Everything a run needs to know, after normalisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Command types to run, in pipeline order, without duplicates.
    pub commands: Vec<CommandType>,
    /// Restricts the run to one context.
    pub context: Option<String>,
    /// Only set together with `context`.
    pub tags: Option<Vec<String>>,
    /// Manifest path, with `~` and variables expanded.
    pub manifest: PathBuf,
    /// List the commands instead of running them.
    pub dry_run: bool,
    /// How each command is spawned.
    pub strategy: Strategy,
}

impl TryFrom<Cli> for Options {
    type Error = CliError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let commands = normalize_commands(&cli.commands);
        if commands.is_empty() {
            return Err(CliError::NoValidCommand);
        }

        let tags = match (&cli.context, cli.tags.is_empty()) {
            (Some(_), false) => Some(cli.tags),
            (None, false) => {
                log::warn!("Ignoring --tags {:?}: tags are only used with --context.", cli.tags);
                None
            }
            (_, true) => None,
        };

        let manifest = shellexpand::full(&cli.manifest)
            .map_err(|e| CliError::ManifestPath {
                path: cli.manifest.clone(),
                reason: e.to_string(),
            })?
            .into_owned();

        Ok(Self {
            commands,
            context: cli.context,
            tags,
            manifest: PathBuf::from(manifest),
            dry_run: cli.dry_run,
            strategy: if cli.shell {
                Strategy::Shell
            } else {
                Strategy::Direct
            },
        })
    }
}

/// Parses a full argument list (program name first) into [`Options`].
pub fn parse_options<I, T>(args: I) -> Result<Options, CliError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Options::try_from(Cli::try_parse_from(args)?)
}

/// Turns the verbs given on the command line into command types.
///
/// Unknown verbs are dropped, `all` selects every type, and the result is
/// in pipeline order regardless of the order given.
pub fn normalize_commands(verbs: &[String]) -> Vec<CommandType> {
    if verbs.iter().any(|v| v == ALL_COMMANDS_VERB) {
        return CommandType::ALL.to_vec();
    }

    let mut commands: Vec<CommandType> = verbs
        .iter()
        .filter_map(|verb| match verb.parse::<CommandType>() {
            Ok(kind) => Some(kind),
            Err(e) => {
                log::warn!("{} Ignoring it.", e);
                None
            }
        })
        .collect();
    commands.sort();
    commands.dedup();
    commands
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_MANIFEST_PATH;
    use CommandType::{Build, Push, Test};

    fn parse(line: &str) -> Result<Options, CliError> {
        parse_options(std::iter::once("dave").chain(line.split_whitespace()))
    }

    fn verbs(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_commands_returns_commands_passed() {
        assert_eq!(normalize_commands(&verbs("build test")), vec![Build, Test]);
    }

    #[test]
    fn test_commands_filters_invalid() {
        assert_eq!(normalize_commands(&verbs("foo bar baz build")), vec![Build]);
    }

    #[test]
    fn test_commands_sorted_in_execution_order() {
        assert_eq!(normalize_commands(&verbs("build push test")), vec![Build, Test, Push]);
        assert_eq!(normalize_commands(&verbs("push build push")), vec![Build, Push]);
    }

    #[test]
    fn test_all_takes_precedence() {
        assert_eq!(normalize_commands(&verbs("all")), vec![Build, Test, Push]);
        assert_eq!(
            normalize_commands(&verbs("all build template")),
            vec![Build, Test, Push]
        );
    }

    #[test]
    fn test_options_default_manifest() {
        let options = parse("build").unwrap();
        assert_eq!(options.commands, vec![Build]);
        assert_eq!(options.context, None);
        assert_eq!(options.tags, None);
        if std::env::var_os(crate::constants::MANIFEST_ENV_VAR).is_none() {
            assert_eq!(options.manifest, PathBuf::from(DEFAULT_MANIFEST_PATH));
        }
        assert!(!options.dry_run);
        assert_eq!(options.strategy, Strategy::Direct);
    }

    #[test]
    fn test_options_context_and_tags() {
        let options = parse("build --context . --tags 1.0.2 1.0.3").unwrap();
        assert_eq!(options.context.as_deref(), Some("."));
        assert_eq!(options.tags, Some(vec!["1.0.2".to_string(), "1.0.3".to_string()]));
    }

    #[test]
    fn test_numeric_tags_stay_strings() {
        let options = parse("build -c . -t 1.0 1").unwrap();
        assert_eq!(options.tags, Some(vec!["1.0".to_string(), "1".to_string()]));
    }

    #[test]
    fn test_tags_without_context_are_ignored() {
        let options = parse("build --tags 1.0 1").unwrap();
        assert_eq!(options.context, None);
        assert_eq!(options.tags, None);
    }

    #[test]
    fn test_manifest_path_is_used() {
        let options = parse("build --manifest /config/manifest.yaml").unwrap();
        assert_eq!(options.manifest, PathBuf::from("/config/manifest.yaml"));
    }

    #[test]
    fn test_flags_select_mode_and_strategy() {
        let options = parse("all --dry-run --shell").unwrap();
        assert!(options.dry_run);
        assert_eq!(options.strategy, Strategy::Shell);
    }

    #[test]
    fn test_only_invalid_verbs_is_an_error() {
        assert!(matches!(parse("deploy"), Err(CliError::NoValidCommand)));
    }

    #[test]
    fn test_missing_verb_is_a_clap_error() {
        assert!(matches!(parse(""), Err(CliError::Clap(_))));
    }

    #[test]
    fn test_usage_errors_exit_with_one() {
        assert_eq!(parse("").unwrap_err().exit_code(), 1);
        assert_eq!(parse("build --no-such-flag").unwrap_err().exit_code(), 1);
        assert_eq!(parse("deploy").unwrap_err().exit_code(), 1);
    }

    #[test]
    fn test_help_and_version_exit_with_zero() {
        for line in ["--help", "-h", "--version", "-V", "build --help"] {
            let error = parse(line).unwrap_err();
            assert!(matches!(error, CliError::Clap(_)), "line: {}", line);
            assert_eq!(error.exit_code(), 0, "line: {}", line);
        }
    }
}
