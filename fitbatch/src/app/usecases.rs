// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app::errors::{AppError, AppErrorKind, AppResult, codes, invalid_argument};
use crate::app::ports::{
    DirectoryKind, LocalFilesystemPort, ProgressEvent, ProgressOutputPort, SchedulerPort,
    TelemetryEvent, TelemetryPort,
};
use crate::app::services::{job, subject::SubjectPattern};
use crate::app::types::{
    BatchReport, JobDescriptor, MismatchPolicy, SkippedFile, SubjectRecord, SubmissionOutcome,
    SubmissionStatus, SubmitCapture, SubmitSettings,
};

const MAX_STDERR_DETAIL: usize = 512;

#[derive(Clone)]
pub struct UseCases {
    pub(crate) local_fs: Arc<dyn LocalFilesystemPort>,
    pub(crate) scheduler: Arc<dyn SchedulerPort>,
    pub(crate) progress: Arc<dyn ProgressOutputPort>,
    pub(crate) telemetry: Arc<dyn TelemetryPort>,
    pub(crate) settings: SubmitSettings,
}

impl UseCases {
    pub fn new(
        local_fs: Arc<dyn LocalFilesystemPort>,
        scheduler: Arc<dyn SchedulerPort>,
        progress: Arc<dyn ProgressOutputPort>,
        telemetry: Arc<dyn TelemetryPort>,
        settings: SubmitSettings,
    ) -> Self {
        Self {
            local_fs,
            scheduler,
            progress,
            telemetry,
            settings,
        }
    }

    /// Submits one scheduler job per matching file in the source directory.
    ///
    /// The results directory and its `logs` subdirectory are created first.
    /// Every file in the work list is mapped to a job before anything is
    /// submitted, so an aborting filename mismatch never leaves a partial batch.
    /// Submission failures are recorded per subject and do not stop the pass.
    #[tracing::instrument(
        name = "batch_submit",
        skip(self, results_dir),
        fields(results_dir = %results_dir.display(), source_dir = %self.settings.source_dir.display())
    )]
    pub async fn submit_batch(&self, results_dir: &Path) -> AppResult<BatchReport> {
        let pattern = SubjectPattern::new(&self.settings.subject_pattern)
            .map_err(|err| invalid_argument(err.to_string()))?;
        let mut report = BatchReport::default();

        report.created_results_dir = self
            .ensure_directory(results_dir, DirectoryKind::Results)
            .await?;
        report.created_logs_dir = self
            .ensure_directory(&job::logs_dir(results_dir), DirectoryKind::Logs)
            .await?;

        let files = self
            .local_fs
            .list_files(&self.settings.source_dir, &self.settings.extension)
            .await?;
        tracing::debug!(count = files.len(), "work list discovered");

        let records = self.plan_subjects(&pattern, files, &mut report)?;
        let jobs: Vec<JobDescriptor> = records
            .iter()
            .map(|record| job::build_job_descriptor(record, results_dir, &self.settings))
            .collect();

        for job in jobs {
            let outcome = self.submit_one(job).await;
            report.outcomes.push(outcome);
        }

        tracing::info!(
            submitted = report.submitted(),
            failed = report.failed(),
            skipped = report.skipped.len(),
            "batch finished"
        );
        Ok(report)
    }

    async fn ensure_directory(&self, path: &Path, kind: DirectoryKind) -> AppResult<bool> {
        let created = self.local_fs.ensure_dir(path).await?;
        if created {
            tracing::info!(path = %path.display(), ?kind, "created directory");
            self.telemetry.event(
                "batch.dir.created",
                TelemetryEvent {
                    path: Some(path.display().to_string()),
                    ..TelemetryEvent::default()
                },
            );
            self.progress.emit(ProgressEvent::DirectoryCreated {
                kind,
                path: path.to_path_buf(),
            });
        }
        Ok(created)
    }

    fn plan_subjects(
        &self,
        pattern: &SubjectPattern,
        files: Vec<PathBuf>,
        report: &mut BatchReport,
    ) -> AppResult<Vec<SubjectRecord>> {
        let mut records = Vec::with_capacity(files.len());
        let mut mismatches = Vec::new();
        for path in files {
            match pattern.subject_record(&path) {
                Ok(record) => records.push(record),
                Err(err) => mismatches.push(SkippedFile { path, error: err }),
            }
        }

        if mismatches.is_empty() {
            return Ok(records);
        }

        match self.settings.on_mismatch {
            MismatchPolicy::Abort => {
                for skipped in &mismatches {
                    tracing::error!(path = %skipped.path.display(), "{}", skipped.error);
                }
                let first = &mismatches[0];
                Err(AppError::with_message(
                    AppErrorKind::Aborted,
                    codes::PATTERN_MISMATCH,
                    format!(
                        "{} of {} file(s) do not yield a subject id, nothing was submitted; first: {}",
                        mismatches.len(),
                        mismatches.len() + records.len(),
                        first.error
                    ),
                ))
            }
            MismatchPolicy::Skip => {
                for skipped in mismatches {
                    tracing::warn!(path = %skipped.path.display(), "skipping file: {}", skipped.error);
                    self.telemetry.event(
                        "subject.skipped",
                        TelemetryEvent {
                            path: Some(skipped.path.display().to_string()),
                            ..TelemetryEvent::default()
                        },
                    );
                    self.progress.emit(ProgressEvent::Skipped {
                        path: skipped.path.clone(),
                        reason: skipped.error.message().to_string(),
                    });
                    report.skipped.push(skipped);
                }
                Ok(records)
            }
        }
    }

    #[tracing::instrument(
        name = "job_submit",
        level = "debug",
        skip(self, job),
        fields(subject = %job.subject_id, job_name = %job.job_name)
    )]
    async fn submit_one(&self, job: JobDescriptor) -> SubmissionOutcome {
        let telemetry_base = TelemetryEvent {
            subject: Some(job.subject_id.clone()),
            job_name: Some(job.job_name.clone()),
            path: Some(job.input_path.display().to_string()),
            ..TelemetryEvent::default()
        };

        let (status, exit_code) = match self.scheduler.submit(&job).await {
            Ok(capture) if capture.success() => (
                SubmissionStatus::Submitted {
                    scheduler_output: capture.stdout_text(),
                },
                capture.exit_code,
            ),
            Ok(capture) => (
                SubmissionStatus::Failed {
                    detail: describe_failure(&capture),
                },
                capture.exit_code,
            ),
            Err(err) => (
                SubmissionStatus::Failed {
                    detail: err.to_string(),
                },
                None,
            ),
        };

        match &status {
            SubmissionStatus::Submitted { scheduler_output } => {
                self.telemetry.event(
                    "job.submit.succeeded",
                    TelemetryEvent {
                        exit_code,
                        ..telemetry_base
                    },
                );
                self.progress.emit(ProgressEvent::Submitted {
                    job_name: job.job_name.clone(),
                    scheduler_output: scheduler_output.clone(),
                });
            }
            SubmissionStatus::Failed { detail } => {
                tracing::warn!("submission failed: {detail}");
                self.telemetry.event(
                    "job.submit.failed",
                    TelemetryEvent {
                        exit_code,
                        ..telemetry_base
                    },
                );
                self.progress.emit(ProgressEvent::Failed {
                    job_name: job.job_name.clone(),
                    detail: detail.clone(),
                });
            }
        }

        SubmissionOutcome {
            subject_id: job.subject_id,
            job_name: job.job_name,
            input_path: job.input_path,
            status,
        }
    }
}

fn describe_failure(capture: &SubmitCapture) -> String {
    let status = match capture.exit_code {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_string(),
    };
    let stderr = String::from_utf8_lossy(&capture.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        return status;
    }
    let mut detail: String = stderr.chars().take(MAX_STDERR_DETAIL).collect();
    if detail.len() < stderr.len() {
        detail.push_str("...");
    }
    format!("{status}: {detail}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use crate::app::errors::local_error;
    use crate::app::ports::NoopTelemetry;
    use crate::app::services::subject::DEFAULT_SUBJECT_PATTERN;

    #[derive(Default)]
    struct FakeFilesystem {
        dirs: Mutex<HashSet<PathBuf>>,
        files: Vec<PathBuf>,
        fail_create: Option<PathBuf>,
        list_calls: Mutex<usize>,
    }

    impl FakeFilesystem {
        fn with_files(names: &[&str]) -> Self {
            Self {
                files: names
                    .iter()
                    .map(|name| PathBuf::from("/data").join(name))
                    .collect(),
                ..Self::default()
            }
        }

        fn has_dir(&self, path: &str) -> bool {
            self.dirs.lock().expect("dirs lock").contains(Path::new(path))
        }

        fn list_calls(&self) -> usize {
            *self.list_calls.lock().expect("list_calls lock")
        }
    }

    #[async_trait::async_trait]
    impl LocalFilesystemPort for FakeFilesystem {
        async fn ensure_dir(&self, path: &Path) -> AppResult<bool> {
            if self.fail_create.as_deref() == Some(path) {
                return Err(local_error(format!(
                    "failed to create directory {}: permission denied",
                    path.display()
                )));
            }
            Ok(self
                .dirs
                .lock()
                .expect("dirs lock")
                .insert(path.to_path_buf()))
        }

        async fn list_files(&self, dir: &Path, extension: &str) -> AppResult<Vec<PathBuf>> {
            *self.list_calls.lock().expect("list_calls lock") += 1;
            assert_eq!(dir, Path::new("/data"));
            let mut files: Vec<PathBuf> = self
                .files
                .iter()
                .filter(|path| path.to_string_lossy().ends_with(extension))
                .cloned()
                .collect();
            files.sort();
            Ok(files)
        }
    }

    #[derive(Default)]
    struct RecordingScheduler {
        submitted: Mutex<Vec<JobDescriptor>>,
        exit_codes: HashMap<String, i32>,
        spawn_error: bool,
    }

    impl RecordingScheduler {
        fn job_names(&self) -> Vec<String> {
            self.submitted
                .lock()
                .expect("submitted lock")
                .iter()
                .map(|job| job.job_name.clone())
                .collect()
        }
    }

    #[async_trait::async_trait]
    impl SchedulerPort for RecordingScheduler {
        async fn submit(&self, job: &JobDescriptor) -> AppResult<SubmitCapture> {
            self.submitted
                .lock()
                .expect("submitted lock")
                .push(job.clone());
            if self.spawn_error {
                return Err(local_error("failed to run sbatch: No such file or directory"));
            }
            let exit_code = self.exit_codes.get(&job.subject_id).copied().unwrap_or(0);
            let stderr = if exit_code == 0 {
                Vec::new()
            } else {
                b"sbatch: error: Batch job submission failed\n".to_vec()
            };
            Ok(SubmitCapture {
                stdout: b"Submitted batch job 11\n".to_vec(),
                stderr,
                exit_code: Some(exit_code),
            })
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        events: Mutex<Vec<ProgressEvent>>,
    }

    impl RecordingProgress {
        fn events(&self) -> Vec<ProgressEvent> {
            self.events.lock().expect("events lock").clone()
        }
    }

    impl ProgressOutputPort for RecordingProgress {
        fn emit(&self, event: ProgressEvent) {
            self.events.lock().expect("events lock").push(event);
        }
    }

    fn settings(on_mismatch: MismatchPolicy) -> SubmitSettings {
        SubmitSettings {
            source_dir: PathBuf::from("/data"),
            submit_script: PathBuf::from("/opt/run_RL_DDM.ssub"),
            job_name_prefix: "GNG_RLDDM-fit-".into(),
            extension: ".csv".into(),
            subject_pattern: DEFAULT_SUBJECT_PATTERN.into(),
            on_mismatch,
        }
    }

    struct Harness {
        fs: Arc<FakeFilesystem>,
        scheduler: Arc<RecordingScheduler>,
        progress: Arc<RecordingProgress>,
        usecases: UseCases,
    }

    fn harness(
        fs: FakeFilesystem,
        scheduler: RecordingScheduler,
        settings: SubmitSettings,
    ) -> Harness {
        let fs = Arc::new(fs);
        let scheduler = Arc::new(scheduler);
        let progress = Arc::new(RecordingProgress::default());
        let usecases = UseCases::new(
            fs.clone(),
            scheduler.clone(),
            progress.clone(),
            Arc::new(NoopTelemetry),
            settings,
        );
        Harness {
            fs,
            scheduler,
            progress,
            usecases,
        }
    }

    #[tokio::test]
    async fn submits_one_job_per_subject_file() {
        let h = harness(
            FakeFilesystem::with_files(&[
                "de34f_processed_behavioral_file.csv",
                "ab12c_processed_behavioral_file.csv",
                "README.txt",
            ]),
            RecordingScheduler::default(),
            settings(MismatchPolicy::Abort),
        );

        let report = h.usecases.submit_batch(Path::new("/results")).await.unwrap();

        assert_eq!(
            h.scheduler.job_names(),
            vec!["GNG_RLDDM-fit-ab12c", "GNG_RLDDM-fit-de34f"]
        );
        assert_eq!(report.submitted(), 2);
        assert!(report.is_success());

        let jobs = h.scheduler.submitted.lock().unwrap().clone();
        assert_eq!(
            jobs[0].input_path,
            PathBuf::from("/data/ab12c_processed_behavioral_file.csv")
        );
        assert_eq!(
            jobs[0].stdout_path,
            PathBuf::from("/results/logs/ab12c-%J.stdout")
        );
        assert_eq!(jobs[0].results_dir, PathBuf::from("/results"));

        match &report.outcomes[0].status {
            SubmissionStatus::Submitted { scheduler_output } => {
                assert_eq!(scheduler_output, "Submitted batch job 11");
            }
            other => panic!("expected submission, got {other:?}"),
        }
        assert!(h.progress.events().contains(&ProgressEvent::Submitted {
            job_name: "GNG_RLDDM-fit-ab12c".into(),
            scheduler_output: "Submitted batch job 11".into(),
        }));
    }

    #[tokio::test]
    async fn creates_results_and_logs_directories() {
        let h = harness(
            FakeFilesystem::with_files(&["ab12c_processed_behavioral_file.csv"]),
            RecordingScheduler::default(),
            settings(MismatchPolicy::Abort),
        );

        let report = h.usecases.submit_batch(Path::new("/results")).await.unwrap();

        assert!(report.created_results_dir);
        assert!(report.created_logs_dir);
        assert!(h.fs.has_dir("/results"));
        assert!(h.fs.has_dir("/results/logs"));
        assert_eq!(
            h.progress.events(),
            vec![
                ProgressEvent::DirectoryCreated {
                    kind: DirectoryKind::Results,
                    path: PathBuf::from("/results"),
                },
                ProgressEvent::DirectoryCreated {
                    kind: DirectoryKind::Logs,
                    path: PathBuf::from("/results/logs"),
                },
                ProgressEvent::Submitted {
                    job_name: "GNG_RLDDM-fit-ab12c".into(),
                    scheduler_output: "Submitted batch job 11".into(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn rerun_reuses_directories_and_submits_again() {
        let h = harness(
            FakeFilesystem::with_files(&[
                "ab12c_processed_behavioral_file.csv",
                "de34f_processed_behavioral_file.csv",
            ]),
            RecordingScheduler::default(),
            settings(MismatchPolicy::Abort),
        );

        h.usecases.submit_batch(Path::new("/results")).await.unwrap();
        let second = h.usecases.submit_batch(Path::new("/results")).await.unwrap();

        assert!(!second.created_results_dir);
        assert!(!second.created_logs_dir);
        assert_eq!(second.submitted(), 2);
        // Duplicate submissions on re-run are expected.
        assert_eq!(h.scheduler.job_names().len(), 4);
    }

    #[tokio::test]
    async fn mismatch_aborts_before_any_submission() {
        let h = harness(
            FakeFilesystem::with_files(&[
                "ab12c_processed_behavioral_file.csv",
                "broken.csv",
            ]),
            RecordingScheduler::default(),
            settings(MismatchPolicy::Abort),
        );

        let err = h
            .usecases
            .submit_batch(Path::new("/results"))
            .await
            .unwrap_err();

        assert_eq!(err.code(), codes::PATTERN_MISMATCH);
        assert_eq!(err.kind(), AppErrorKind::Aborted);
        assert!(err.message().contains("broken.csv"));
        assert!(h.scheduler.job_names().is_empty());
    }

    #[tokio::test]
    async fn mismatch_is_skipped_and_reported_with_skip_policy() {
        let h = harness(
            FakeFilesystem::with_files(&[
                "ab12c_processed_behavioral_file.csv",
                "broken.csv",
            ]),
            RecordingScheduler::default(),
            settings(MismatchPolicy::Skip),
        );

        let report = h.usecases.submit_batch(Path::new("/results")).await.unwrap();

        assert_eq!(h.scheduler.job_names(), vec!["GNG_RLDDM-fit-ab12c"]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].path, PathBuf::from("/data/broken.csv"));
        assert_eq!(report.skipped[0].error.code(), codes::PATTERN_MISMATCH);
        assert!(report.is_success());
        assert!(h.progress.events().iter().any(|event| matches!(
            event,
            ProgressEvent::Skipped { path, .. } if path == Path::new("/data/broken.csv")
        )));
    }

    #[tokio::test]
    async fn failed_submission_is_reported_and_batch_continues() {
        let scheduler = RecordingScheduler {
            exit_codes: HashMap::from([("ab12c".to_string(), 1)]),
            ..RecordingScheduler::default()
        };
        let h = harness(
            FakeFilesystem::with_files(&[
                "ab12c_processed_behavioral_file.csv",
                "de34f_processed_behavioral_file.csv",
            ]),
            scheduler,
            settings(MismatchPolicy::Abort),
        );

        let report = h.usecases.submit_batch(Path::new("/results")).await.unwrap();

        assert_eq!(h.scheduler.job_names().len(), 2);
        assert_eq!(report.failed(), 1);
        assert!(!report.is_success());
        match &report.outcomes[0].status {
            SubmissionStatus::Failed { detail } => {
                assert!(detail.starts_with("exit status 1"));
                assert!(detail.contains("Batch job submission failed"));
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(report.outcomes[1].is_submitted());
        assert!(h.progress.events().contains(&ProgressEvent::Submitted {
            job_name: "GNG_RLDDM-fit-de34f".into(),
            scheduler_output: "Submitted batch job 11".into(),
        }));
    }

    #[tokio::test]
    async fn spawn_error_counts_as_failed_submission() {
        let scheduler = RecordingScheduler {
            spawn_error: true,
            ..RecordingScheduler::default()
        };
        let h = harness(
            FakeFilesystem::with_files(&["ab12c_processed_behavioral_file.csv"]),
            scheduler,
            settings(MismatchPolicy::Abort),
        );

        let report = h.usecases.submit_batch(Path::new("/results")).await.unwrap();

        assert_eq!(report.failed(), 1);
        assert!(matches!(
            h.progress.events().last(),
            Some(ProgressEvent::Failed { job_name, detail })
                if job_name == "GNG_RLDDM-fit-ab12c" && detail.contains("failed to run sbatch")
        ));
    }

    #[tokio::test]
    async fn directory_failure_stops_the_run() {
        let fs = FakeFilesystem {
            fail_create: Some(PathBuf::from("/results/logs")),
            ..FakeFilesystem::with_files(&["ab12c_processed_behavioral_file.csv"])
        };
        let h = harness(fs, RecordingScheduler::default(), settings(MismatchPolicy::Abort));

        let err = h
            .usecases
            .submit_batch(Path::new("/results"))
            .await
            .unwrap_err();

        assert_eq!(err.code(), codes::LOCAL_ERROR);
        assert!(err.message().contains("/results/logs"));
        assert_eq!(h.fs.list_calls(), 0);
        assert!(h.scheduler.job_names().is_empty());
    }

    #[tokio::test]
    async fn invalid_pattern_is_rejected_before_touching_the_filesystem() {
        let mut settings = settings(MismatchPolicy::Abort);
        settings.subject_pattern = "no_group".into();
        let h = harness(
            FakeFilesystem::with_files(&["ab12c_processed_behavioral_file.csv"]),
            RecordingScheduler::default(),
            settings,
        );

        let err = h
            .usecases
            .submit_batch(Path::new("/results"))
            .await
            .unwrap_err();

        assert_eq!(err.code(), codes::INVALID_ARGUMENT);
        assert!(!h.fs.has_dir("/results"));
    }

    #[tokio::test]
    async fn empty_work_list_is_a_successful_no_op() {
        let h = harness(
            FakeFilesystem::with_files(&["notes.txt"]),
            RecordingScheduler::default(),
            settings(MismatchPolicy::Abort),
        );

        let report = h.usecases.submit_batch(Path::new("/results")).await.unwrap();

        assert!(report.outcomes.is_empty());
        assert!(report.is_success());
    }

    #[test]
    fn describe_failure_truncates_long_stderr() {
        let capture = SubmitCapture {
            stdout: Vec::new(),
            stderr: vec![b'x'; MAX_STDERR_DETAIL + 10],
            exit_code: Some(2),
        };
        let detail = describe_failure(&capture);
        assert!(detail.starts_with("exit status 2: "));
        assert!(detail.ends_with("..."));

        let signalled = SubmitCapture {
            stdout: Vec::new(),
            stderr: Vec::new(),
            exit_code: None,
        };
        assert_eq!(describe_failure(&signalled), "terminated by signal");
    }
}
