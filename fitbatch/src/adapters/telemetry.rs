// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use crate::app::ports::{TelemetryEvent, TelemetryPort};

#[derive(Clone, Default)]
pub struct TracingTelemetry;

impl TracingTelemetry {
    pub fn new() -> Self {
        Self
    }
}

impl TelemetryPort for TracingTelemetry {
    fn event(&self, name: &'static str, fields: TelemetryEvent) {
        let TelemetryEvent {
            subject,
            job_name,
            path,
            exit_code,
        } = fields;

        tracing::info!(
            target: "fitbatch::telemetry",
            event = name,
            subject = subject.as_deref(),
            job_name = job_name.as_deref(),
            path = path.as_deref(),
            exit_code = exit_code,
        );
    }
}
