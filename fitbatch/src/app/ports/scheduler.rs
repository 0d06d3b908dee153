// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use async_trait::async_trait;

use crate::app::errors::AppResult;
use crate::app::types::{JobDescriptor, SubmitCapture};

#[async_trait]
/// Batch scheduler boundary.
/// One call hands one job to the scheduler and captures the submit command's exit status.
/// An `Err` means the command could not be run at all; a non-zero exit is reported in the capture.
pub trait SchedulerPort: Send + Sync {
    async fn submit(&self, job: &JobDescriptor) -> AppResult<SubmitCapture>;
}
