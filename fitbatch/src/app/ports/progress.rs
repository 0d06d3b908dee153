// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryKind {
    Results,
    Logs,
}

/// User-facing records of a batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    DirectoryCreated { kind: DirectoryKind, path: PathBuf },
    Submitted {
        job_name: String,
        scheduler_output: String,
    },
    Failed { job_name: String, detail: String },
    Skipped { path: PathBuf, reason: String },
}

/// Confirmation sink for the batch pass, kept apart from diagnostics logging.
pub trait ProgressOutputPort: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}
