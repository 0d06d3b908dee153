// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{CommandFactory, FromArgMatches, Parser};

use crate::app::types::MismatchPolicy;

#[derive(Parser, Debug)]
#[command(
    name = "fitbatch",
    version,
    about,
    long_about = None,
    after_help = "Submits one scheduler job per subject data file found in the source directory.\n\
\n\
Configuration precedence: defaults < config file < command-line flags.\n\
Config path precedence: defaults < FITBATCH_CONFIG_PATH < command-line flags.\n\
If --config is omitted, fitbatch tries FITBATCH_CONFIG_PATH, then the default config file location; missing default config is OK.\n\
Paths in the config file are resolved relative to the config file directory; paths passed as flags are resolved relative to the current working directory."
)]
pub struct Opts {
    #[arg(
        value_name = "RESULTS_DIR",
        help = "Directory for fit results. Created together with a `logs` subdirectory when missing."
    )]
    pub results_dir: PathBuf,
    #[arg(
        short,
        long,
        value_name = "PATH",
        help = "Path to a TOML config file. When omitted, fitbatch uses FITBATCH_CONFIG_PATH if set, otherwise the default config file location if available."
    )]
    pub config: Option<PathBuf>,
    #[arg(
        long,
        value_name = "PATH",
        help = "Directory holding the subject data files. Overrides `source_dir` from the config file."
    )]
    pub source_dir: Option<PathBuf>,
    #[arg(
        long,
        value_name = "PATH",
        help = "Batch script handed to the scheduler. Overrides `submit_script` from the config file."
    )]
    pub submit_script: Option<PathBuf>,
    #[arg(
        long,
        value_name = "CMD",
        help = "Scheduler submit command. Overrides `submit_command` from the config file."
    )]
    pub submit_command: Option<String>,
    #[arg(
        long,
        value_name = "PREFIX",
        help = "Prefix for job names; the subject id is appended. Overrides `job_name_prefix` from the config file."
    )]
    pub job_name_prefix: Option<String>,
    #[arg(
        long,
        value_name = "EXT",
        help = "Only files whose name ends with this suffix are submitted. Overrides `extension` from the config file."
    )]
    pub extension: Option<String>,
    #[arg(
        long,
        value_name = "REGEX",
        help = "Regex with a capture group (or a group named `subject`) that extracts the subject id from a file name. Overrides `subject_pattern` from the config file."
    )]
    pub subject_pattern: Option<String>,
    #[arg(
        long,
        value_name = "POLICY",
        help = "What to do with files that do not match the subject pattern: abort or skip. Overrides `on_mismatch` from the config file."
    )]
    pub on_mismatch: Option<MismatchPolicy>,
    #[arg(
        short,
        long,
        action = clap::ArgAction::SetTrue,
        help = "Enable debug logging. Overrides `verbose` from the config file."
    )]
    pub verbose: bool,
}

#[derive(Debug)]
pub struct ParsedOpts {
    pub opts: Opts,
    pub verbose_override: Option<bool>,
}

pub fn cli_command() -> clap::Command {
    Opts::command()
}

pub fn parse_opts() -> ParsedOpts {
    try_parse_opts(std::env::args_os()).unwrap_or_else(|err| err.exit())
}

pub fn try_parse_opts<I, T>(args: I) -> Result<ParsedOpts, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = cli_command().try_get_matches_from(args)?;
    let verbose_override = if matches.get_flag("verbose") {
        Some(true)
    } else {
        None
    };
    let opts = Opts::from_arg_matches(&matches)?;
    Ok(ParsedOpts {
        opts,
        verbose_override,
    })
}
