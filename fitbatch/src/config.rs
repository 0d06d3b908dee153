// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::adapters::scheduler::DEFAULT_SUBMIT_COMMAND;
use crate::app::services::subject::{DEFAULT_SUBJECT_PATTERN, SubjectPattern};
use crate::app::types::{MismatchPolicy, SubmitSettings};

const APP_DIR_NAME: &str = "fitbatch";
const CONFIG_FILE_NAME: &str = "fitbatch.toml";
const CONFIG_ENV_VAR: &str = "FITBATCH_CONFIG_PATH";
const DEFAULT_SOURCE_DIR: &str =
    "/media/labs/rsmith/lab-members/cgoldman/go_no_go/DDM/processed_behavioral_files_DDM";
const DEFAULT_SUBMIT_SCRIPT: &str =
    "/media/labs/rsmith/lab-members/cgoldman/go_no_go/DDM/RL_DDM_Millner/RL_DDM-CMG/run_RL_DDM.ssub";
const DEFAULT_JOB_NAME_PREFIX: &str = "GNG_RLDDM-fit-";
const DEFAULT_EXTENSION: &str = ".csv";

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    source_dir: Option<String>,
    submit_script: Option<String>,
    submit_command: Option<String>,
    job_name_prefix: Option<String>,
    extension: Option<String>,
    subject_pattern: Option<String>,
    on_mismatch: Option<MismatchPolicy>,
    verbose: Option<bool>,
}

#[derive(Debug)]
pub struct Config {
    pub source_dir: PathBuf,
    pub submit_script: PathBuf,
    pub submit_command: String,
    pub job_name_prefix: String,
    pub extension: String,
    pub subject_pattern: String,
    pub on_mismatch: MismatchPolicy,
    pub verbose: bool,
}

impl Config {
    pub fn submit_settings(&self) -> SubmitSettings {
        SubmitSettings {
            source_dir: self.source_dir.clone(),
            submit_script: self.submit_script.clone(),
            job_name_prefix: self.job_name_prefix.clone(),
            extension: self.extension.clone(),
            subject_pattern: self.subject_pattern.clone(),
            on_mismatch: self.on_mismatch,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Override,
    Env,
    ConfigFile,
    Default,
}

impl ConfigSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigSource::Override => "override",
            ConfigSource::Env => "env",
            ConfigSource::ConfigFile => "config",
            ConfigSource::Default => "default",
        }
    }
}

#[derive(Debug)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

#[derive(Debug)]
pub struct ConfigReport {
    pub config_path: Option<PathBuf>,
    pub config_path_source: Option<ConfigSource>,
    pub config_file_present: bool,
    pub source_dir: ConfigValue<PathBuf>,
    pub submit_script: ConfigValue<PathBuf>,
    pub submit_command: ConfigValue<String>,
    pub job_name_prefix: ConfigValue<String>,
    pub extension: ConfigValue<String>,
    pub subject_pattern: ConfigValue<String>,
    pub on_mismatch: ConfigValue<MismatchPolicy>,
    pub verbose: ConfigValue<bool>,
}

#[derive(Debug)]
pub struct LoadResult {
    pub config: Config,
    pub report: ConfigReport,
}

#[derive(Debug, Default)]
pub struct Overrides {
    pub source_dir: Option<PathBuf>,
    pub submit_script: Option<PathBuf>,
    pub submit_command: Option<String>,
    pub job_name_prefix: Option<String>,
    pub extension: Option<String>,
    pub subject_pattern: Option<String>,
    pub on_mismatch: Option<MismatchPolicy>,
    pub verbose: Option<bool>,
}

#[cfg(test)]
pub fn load(config_path_override: Option<PathBuf>, overrides: Overrides) -> Result<Config> {
    Ok(load_with_report(config_path_override, overrides)?.config)
}

pub fn load_with_report(
    config_path_override: Option<PathBuf>,
    overrides: Overrides,
) -> Result<LoadResult> {
    let (config_path, config_path_source, required) = match config_path_override {
        Some(path) => (Some(expand_path(path)), Some(ConfigSource::Override), true),
        None => match config_path_from_env()? {
            Some(path) => (Some(expand_path(path)), Some(ConfigSource::Env), true),
            None => match default_config_path().ok() {
                Some(path) => (Some(path), Some(ConfigSource::Default), false),
                None => (None, None, false),
            },
        },
    };
    let config_file_present = config_path
        .as_deref()
        .map(|path| path.exists())
        .unwrap_or(false);

    let file_config = match config_path.as_deref() {
        Some(path) => read_config_file(path, required)?,
        None => FileConfig::default(),
    };
    let config_dir = config_path.as_deref().and_then(|path| path.parent());

    let source_dir = pick_path(
        overrides.source_dir,
        file_config.source_dir,
        config_dir,
        DEFAULT_SOURCE_DIR,
    );
    let submit_script = pick_path(
        overrides.submit_script,
        file_config.submit_script,
        config_dir,
        DEFAULT_SUBMIT_SCRIPT,
    );
    let submit_command = pick(
        overrides.submit_command,
        file_config.submit_command,
        DEFAULT_SUBMIT_COMMAND.to_string(),
    );
    if submit_command.value.trim().is_empty() {
        anyhow::bail!("submit_command must not be empty");
    }
    let job_name_prefix = pick(
        overrides.job_name_prefix,
        file_config.job_name_prefix,
        DEFAULT_JOB_NAME_PREFIX.to_string(),
    );
    let extension = pick(
        overrides.extension,
        file_config.extension,
        DEFAULT_EXTENSION.to_string(),
    );
    if extension.value.is_empty() {
        anyhow::bail!("extension must not be empty");
    }
    let subject_pattern = pick(
        overrides.subject_pattern,
        file_config.subject_pattern,
        DEFAULT_SUBJECT_PATTERN.to_string(),
    );
    SubjectPattern::new(&subject_pattern.value).with_context(|| {
        format!(
            "invalid subject_pattern (source={})",
            subject_pattern.source.as_str()
        )
    })?;
    let on_mismatch = pick(
        overrides.on_mismatch,
        file_config.on_mismatch,
        MismatchPolicy::default(),
    );
    let verbose = pick(overrides.verbose, file_config.verbose, false);

    let config = Config {
        source_dir: source_dir.value.clone(),
        submit_script: submit_script.value.clone(),
        submit_command: submit_command.value.clone(),
        job_name_prefix: job_name_prefix.value.clone(),
        extension: extension.value.clone(),
        subject_pattern: subject_pattern.value.clone(),
        on_mismatch: on_mismatch.value,
        verbose: verbose.value,
    };

    let report = ConfigReport {
        config_path,
        config_path_source,
        config_file_present,
        source_dir,
        submit_script,
        submit_command,
        job_name_prefix,
        extension,
        subject_pattern,
        on_mismatch,
        verbose,
    };

    Ok(LoadResult { config, report })
}

fn pick<T>(override_value: Option<T>, file_value: Option<T>, default: T) -> ConfigValue<T> {
    match (override_value, file_value) {
        (Some(value), _) => ConfigValue {
            value,
            source: ConfigSource::Override,
        },
        (None, Some(value)) => ConfigValue {
            value,
            source: ConfigSource::ConfigFile,
        },
        (None, None) => ConfigValue {
            value: default,
            source: ConfigSource::Default,
        },
    }
}

fn pick_path(
    override_value: Option<PathBuf>,
    file_value: Option<String>,
    config_dir: Option<&Path>,
    default: &str,
) -> ConfigValue<PathBuf> {
    pick(
        override_value.map(expand_path),
        file_value.map(|raw| resolve_path(&raw, config_dir)),
        PathBuf::from(default),
    )
}

fn read_config_file(path: &Path, required: bool) -> Result<FileConfig> {
    if !path.exists() {
        if required {
            anyhow::bail!("config file not found at {}", path.display());
        }
        return Ok(FileConfig::default());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

fn resolve_path(raw: &str, base_dir: Option<&Path>) -> PathBuf {
    let expanded = shellexpand::tilde(raw);
    let path = PathBuf::from(expanded.as_ref());
    if path.is_absolute() {
        return path;
    }
    match base_dir {
        Some(dir) => dir.join(path),
        None => path,
    }
}

fn expand_path(path: PathBuf) -> PathBuf {
    let path_string = path.to_string_lossy().to_string();
    let expanded = shellexpand::tilde(&path_string);
    PathBuf::from(expanded.as_ref())
}

fn config_path_from_env() -> Result<Option<PathBuf>> {
    match std::env::var_os(CONFIG_ENV_VAR) {
        Some(value) => {
            if value.is_empty() {
                anyhow::bail!("{CONFIG_ENV_VAR} is set but empty");
            }
            Ok(Some(PathBuf::from(value)))
        }
        None => Ok(None),
    }
}

fn default_config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("failed to resolve config directory")?;
    Ok(base.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}
