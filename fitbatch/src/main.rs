// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::process::ExitCode;
use std::sync::Arc;

use crate::app::errors::AppResult;
use crate::app::types::{BatchReport, SubmissionStatus};

mod adapters;
mod app;
mod config;
mod logging;

fn log_config_report(report: &config::ConfigReport) {
    match (&report.config_path, report.config_path_source) {
        (Some(path), Some(source)) => {
            tracing::info!(
                "config path: {} (source={}, present={})",
                path.display(),
                source.as_str(),
                report.config_file_present
            );
        }
        (Some(path), None) => {
            tracing::info!(
                "config path: {} (present={})",
                path.display(),
                report.config_file_present
            );
        }
        (None, _) => {
            tracing::info!("config path: (none)");
        }
    }
    tracing::info!(
        "config source_dir: {} (source={})",
        report.source_dir.value.display(),
        report.source_dir.source.as_str()
    );
    tracing::info!(
        "config submit_script: {} (source={})",
        report.submit_script.value.display(),
        report.submit_script.source.as_str()
    );
    tracing::debug!(
        "config submit_command: {} (source={})",
        report.submit_command.value,
        report.submit_command.source.as_str()
    );
    tracing::debug!(
        "config job_name_prefix: {} (source={})",
        report.job_name_prefix.value,
        report.job_name_prefix.source.as_str()
    );
    tracing::debug!(
        "config extension: {} (source={})",
        report.extension.value,
        report.extension.source.as_str()
    );
    tracing::debug!(
        "config subject_pattern: {} (source={})",
        report.subject_pattern.value,
        report.subject_pattern.source.as_str()
    );
    tracing::debug!(
        "config on_mismatch: {} (source={})",
        report.on_mismatch.value.as_str(),
        report.on_mismatch.source.as_str()
    );
    tracing::debug!(
        "config verbose: {} (source={})",
        report.verbose.value,
        report.verbose.source.as_str()
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let parsed = adapters::cli::parse_opts();
    let opts = parsed.opts;
    let config::LoadResult { config, report } = config::load_with_report(
        opts.config,
        config::Overrides {
            source_dir: opts.source_dir,
            submit_script: opts.submit_script,
            submit_command: opts.submit_command,
            job_name_prefix: opts.job_name_prefix,
            extension: opts.extension,
            subject_pattern: opts.subject_pattern,
            on_mismatch: opts.on_mismatch,
            verbose: parsed.verbose_override,
        },
    )?;
    logging::init(config.verbose);
    log_config_report(&report);

    let usecases = app::usecases::UseCases::new(
        Arc::new(adapters::fs::LocalFilesystem::new()),
        Arc::new(adapters::scheduler::SbatchScheduler::new(
            config.submit_command.clone(),
        )),
        Arc::new(adapters::console::ConsoleOutput::new()),
        Arc::new(adapters::telemetry::TracingTelemetry::new()),
        config.submit_settings(),
    );

    let result = usecases.submit_batch(&opts.results_dir).await;
    match &result {
        Ok(report) => log_batch_report(report),
        Err(err) => {
            tracing::error!(
                code = err.code(),
                kind = ?err.kind(),
                context = err.context(),
                "{}",
                err.message()
            );
            eprintln!("error: {err}");
        }
    }
    Ok(ExitCode::from(exit_status(&result)))
}

fn log_batch_report(report: &BatchReport) {
    tracing::info!(
        created_results_dir = report.created_results_dir,
        created_logs_dir = report.created_logs_dir,
        submitted = report.submitted(),
        skipped = report.skipped.len(),
        "run complete"
    );
    for outcome in &report.outcomes {
        if let SubmissionStatus::Failed { detail } = &outcome.status {
            tracing::error!(
                subject = %outcome.subject_id,
                job_name = %outcome.job_name,
                input = %outcome.input_path.display(),
                "submission failed: {detail}"
            );
        }
    }
    if !report.is_success() {
        tracing::error!(
            "{} of {} submission(s) failed",
            report.failed(),
            report.outcomes.len()
        );
    }
}

/// 0 when every matching file was submitted; 1 on setup or mismatch errors
/// and when any submission failed.
fn exit_status(result: &AppResult<BatchReport>) -> u8 {
    match result {
        Ok(report) if report.is_success() => 0,
        _ => 1,
    }
}
