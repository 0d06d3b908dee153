// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::path::Path;

use regex::Regex;

use crate::app::errors::{AppError, AppErrorKind, AppResult, codes};
use crate::app::types::SubjectRecord;

pub const DEFAULT_SUBJECT_PATTERN: &str = r"(.{5})_processed_behavioral_file";
const SUBJECT_GROUP: &str = "subject";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("subject pattern is empty")]
    Empty,
    #[error("invalid subject pattern: {0}")]
    Invalid(String),
    #[error("subject pattern '{0}' has no capture group")]
    NoCaptureGroup(String),
}

/// Filename pattern that yields a subject id.
///
/// The id is the capture group named `subject` when the pattern has one,
/// otherwise the first capture group. Matching is unanchored, so the
/// default pattern picks the five characters right before
/// `_processed_behavioral_file` wherever that marker sits in the name.
#[derive(Debug, Clone)]
pub struct SubjectPattern {
    regex: Regex,
    named: bool,
}

impl SubjectPattern {
    pub fn new(pattern: &str) -> Result<Self, PatternError> {
        if pattern.trim().is_empty() {
            return Err(PatternError::Empty);
        }
        let regex = Regex::new(pattern).map_err(|err| PatternError::Invalid(err.to_string()))?;
        if regex.captures_len() < 2 {
            return Err(PatternError::NoCaptureGroup(pattern.to_string()));
        }
        let named = regex
            .capture_names()
            .flatten()
            .any(|name| name == SUBJECT_GROUP);
        Ok(Self { regex, named })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn extract<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        let caps = self.regex.captures(file_name)?;
        let group = if self.named {
            caps.name(SUBJECT_GROUP)
        } else {
            caps.get(1)
        };
        group.map(|m| m.as_str()).filter(|id| !id.is_empty())
    }

    /// Builds the subject record for `path`, or a `pattern_mismatch` error
    /// naming the file.
    pub fn subject_record(&self, path: &Path) -> AppResult<SubjectRecord> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| mismatch(path, "file name is not valid UTF-8"))?;
        let subject_id = self.extract(file_name).ok_or_else(|| {
            mismatch(
                path,
                format!(
                    "file name '{file_name}' does not match subject pattern '{}'",
                    self.as_str()
                ),
            )
        })?;
        Ok(SubjectRecord {
            source_path: path.to_path_buf(),
            subject_id: subject_id.to_string(),
        })
    }
}

fn mismatch(path: &Path, message: impl Into<String>) -> AppError {
    AppError::with_message(
        AppErrorKind::InvalidArgument,
        codes::PATTERN_MISMATCH,
        message,
    )
    .with_context(format!("path={}", path.display()))
}
