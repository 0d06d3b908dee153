// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::app::errors::{AppError, AppErrorKind, AppResult, codes};
use crate::app::ports::SchedulerPort;
use crate::app::types::{JobDescriptor, SubmitCapture};

pub const DEFAULT_SUBMIT_COMMAND: &str = "sbatch";

/// Runs the submit command (normally `sbatch`) directly with an argument
/// vector; no shell is involved, so paths need no quoting.
#[derive(Clone, Debug)]
pub struct SbatchScheduler {
    command: String,
}

impl SbatchScheduler {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for SbatchScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_SUBMIT_COMMAND)
    }
}

#[async_trait]
impl SchedulerPort for SbatchScheduler {
    #[tracing::instrument(name = "scheduler", level = "debug", skip(self, job), fields(command = %self.command, job_name = %job.job_name))]
    async fn submit(&self, job: &JobDescriptor) -> AppResult<SubmitCapture> {
        let output = Command::new(&self.command)
            .args(job.to_args())
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|err| {
                AppError::with_message(
                    AppErrorKind::Internal,
                    codes::SUBMIT_FAILED,
                    format!("failed to run {}: {err}", self.command),
                )
                .with_context(format!("job={}", job.job_name))
            })?;
        let capture = SubmitCapture {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.status.code(),
        };
        tracing::debug!(
            exit_code = capture.exit_code,
            stdout = %capture.stdout_text(),
            "submit command finished"
        );
        Ok(capture)
    }
}
