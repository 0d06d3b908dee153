// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::ffi::OsString;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

use crate::app::errors::AppError;

/// What to do with a work-list file whose name does not yield a subject id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MismatchPolicy {
    /// Fail the whole run before anything is submitted.
    #[default]
    Abort,
    /// Warn, report the file and carry on with the rest.
    Skip,
}

impl MismatchPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            MismatchPolicy::Abort => "abort",
            MismatchPolicy::Skip => "skip",
        }
    }
}

impl FromStr for MismatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(MismatchPolicy::Abort),
            "skip" => Ok(MismatchPolicy::Skip),
            other => Err(format!("unknown mismatch policy '{other}' (expected abort or skip)")),
        }
    }
}

/// Everything the batch pass needs besides the results directory.
#[derive(Debug, Clone)]
pub struct SubmitSettings {
    pub source_dir: PathBuf,
    pub submit_script: PathBuf,
    pub job_name_prefix: String,
    pub extension: String,
    pub subject_pattern: String,
    pub on_mismatch: MismatchPolicy,
}

/// One input file and the subject id derived from its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectRecord {
    pub source_path: PathBuf,
    pub subject_id: String,
}

/// Arguments handed to the scheduler for a single subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    pub subject_id: String,
    pub job_name: String,
    pub stdout_path: PathBuf,
    pub stderr_path: PathBuf,
    pub submit_script: PathBuf,
    pub input_path: PathBuf,
    pub results_dir: PathBuf,
}

impl JobDescriptor {
    /// Argument vector for the submit command, e.g.
    /// `-J <name> -o <stdout> -e <stderr> <script> <input> <results>`.
    pub fn to_args(&self) -> Vec<OsString> {
        vec![
            OsString::from("-J"),
            OsString::from(&self.job_name),
            OsString::from("-o"),
            self.stdout_path.clone().into_os_string(),
            OsString::from("-e"),
            self.stderr_path.clone().into_os_string(),
            self.submit_script.clone().into_os_string(),
            self.input_path.clone().into_os_string(),
            self.results_dir.clone().into_os_string(),
        ]
    }
}

/// Raw result of running the submit command once.
#[derive(Debug, Clone)]
pub struct SubmitCapture {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: Option<i32>,
}

impl SubmitCapture {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).trim().to_string()
    }
}

#[derive(Debug, Clone)]
pub enum SubmissionStatus {
    /// `scheduler_output` is the submit command's trimmed stdout, shown as is.
    Submitted { scheduler_output: String },
    Failed { detail: String },
}

#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub subject_id: String,
    pub job_name: String,
    pub input_path: PathBuf,
    pub status: SubmissionStatus,
}

impl SubmissionOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self.status, SubmissionStatus::Submitted { .. })
    }
}

#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub error: AppError,
}

/// Summary of one run, used by the caller to pick an exit code.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub created_results_dir: bool,
    pub created_logs_dir: bool,
    pub outcomes: Vec<SubmissionOutcome>,
    pub skipped: Vec<SkippedFile>,
}

impl BatchReport {
    pub fn submitted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_submitted()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.submitted()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}
