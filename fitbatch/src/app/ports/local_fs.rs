// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::app::errors::AppResult;

#[async_trait]
/// Local filesystem boundary for the core.
/// Creates output directories and lists the work list with consistent errors.
pub trait LocalFilesystemPort: Send + Sync {
    /// Creates `path` (and missing parents). Returns `true` when it did not exist before.
    async fn ensure_dir(&self, path: &Path) -> AppResult<bool>;
    /// Regular files directly under `dir` whose name ends with `extension`, sorted by file name.
    async fn list_files(&self, dir: &Path, extension: &str) -> AppResult<Vec<PathBuf>>;
}
