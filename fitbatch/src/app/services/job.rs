// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::path::{Path, PathBuf};

use crate::app::types::{JobDescriptor, SubjectRecord, SubmitSettings};

pub const LOGS_DIR_NAME: &str = "logs";
/// Expanded by the scheduler to the job number.
pub const JOB_NUMBER_PLACEHOLDER: &str = "%J";

pub fn logs_dir(results_dir: &Path) -> PathBuf {
    results_dir.join(LOGS_DIR_NAME)
}

pub fn job_name(prefix: &str, subject_id: &str) -> String {
    format!("{prefix}{subject_id}")
}

pub fn log_path(results_dir: &Path, subject_id: &str, stream: &str) -> PathBuf {
    logs_dir(results_dir).join(format!("{subject_id}-{JOB_NUMBER_PLACEHOLDER}.{stream}"))
}

pub fn build_job_descriptor(
    record: &SubjectRecord,
    results_dir: &Path,
    settings: &SubmitSettings,
) -> JobDescriptor {
    JobDescriptor {
        subject_id: record.subject_id.clone(),
        job_name: job_name(&settings.job_name_prefix, &record.subject_id),
        stdout_path: log_path(results_dir, &record.subject_id, "stdout"),
        stderr_path: log_path(results_dir, &record.subject_id, "stderr"),
        submit_script: settings.submit_script.clone(),
        input_path: record.source_path.clone(),
        results_dir: results_dir.to_path_buf(),
    }
}
