// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::io::Write;

use crate::app::ports::{DirectoryKind, ProgressEvent, ProgressOutputPort};

/// Prints confirmation records: successes on stdout, failures and skips on stderr.
#[derive(Clone, Default)]
pub struct ConsoleOutput;

impl ConsoleOutput {
    pub fn new() -> Self {
        Self
    }
}

impl ProgressOutputPort for ConsoleOutput {
    fn emit(&self, event: ProgressEvent) {
        let line = format_event(&event);
        let result = match event {
            ProgressEvent::Failed { .. } | ProgressEvent::Skipped { .. } => {
                writeln!(std::io::stderr().lock(), "{line}")
            }
            _ => writeln!(std::io::stdout().lock(), "{line}"),
        };
        if let Err(err) = result {
            tracing::debug!("console write failed: {err}");
        }
    }
}

pub fn format_event(event: &ProgressEvent) -> String {
    match event {
        ProgressEvent::DirectoryCreated {
            kind: DirectoryKind::Results,
            path,
        } => format!("Created results directory {}", path.display()),
        ProgressEvent::DirectoryCreated {
            kind: DirectoryKind::Logs,
            path,
        } => format!("Created results-logs directory {}", path.display()),
        ProgressEvent::Submitted {
            job_name,
            scheduler_output,
        } => {
            if scheduler_output.is_empty() {
                format!("SUBMITTED JOB [{job_name}]")
            } else {
                format!("SUBMITTED JOB [{job_name}]: {scheduler_output}")
            }
        }
        ProgressEvent::Failed { job_name, detail } => {
            format!("FAILED JOB [{job_name}]: {detail}")
        }
        ProgressEvent::Skipped { path, reason } => {
            format!("SKIPPED {}: {reason}", path.display())
        }
    }
}
