// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

pub mod local_fs;
pub mod progress;
pub mod scheduler;
pub mod telemetry;

pub use local_fs::LocalFilesystemPort;
pub use progress::{DirectoryKind, ProgressEvent, ProgressOutputPort};
pub use scheduler::SchedulerPort;
#[cfg(test)]
pub use telemetry::NoopTelemetry;
pub use telemetry::{TelemetryEvent, TelemetryPort};
