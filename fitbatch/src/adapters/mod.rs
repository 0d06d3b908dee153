// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

pub mod cli;
pub mod console;
pub mod fs;
pub mod scheduler;
pub mod telemetry;
