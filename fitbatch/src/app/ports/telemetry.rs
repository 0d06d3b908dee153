// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

#[derive(Clone, Debug, Default)]
pub struct TelemetryEvent {
    pub subject: Option<String>,
    pub job_name: Option<String>,
    pub path: Option<String>,
    pub exit_code: Option<i32>,
}

pub trait TelemetryPort: Send + Sync {
    fn event(&self, name: &'static str, fields: TelemetryEvent);
}

// Dummy telemetry port for tests.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct NoopTelemetry;

#[cfg(test)]
impl TelemetryPort for NoopTelemetry {
    fn event(&self, _name: &'static str, _fields: TelemetryEvent) {}
}
