// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use walkdir::WalkDir;

use crate::app::errors::{AppError, AppErrorKind, AppResult, codes, invalid_argument, local_error};
use crate::app::ports::LocalFilesystemPort;

#[derive(Clone, Default)]
pub struct LocalFilesystem;

impl LocalFilesystem {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl LocalFilesystemPort for LocalFilesystem {
    #[tracing::instrument(name = "fs", level = "debug", skip(self, path), fields(op = "ensure_dir", path = %path.display()))]
    async fn ensure_dir(&self, path: &Path) -> AppResult<bool> {
        if path.as_os_str().is_empty() {
            return Err(invalid_argument("directory path must not be empty"));
        }
        match tokio::fs::metadata(path).await {
            Ok(meta) if meta.is_dir() => return Ok(false),
            Ok(_) => {
                return Err(local_error(format!(
                    "{} exists but is not a directory",
                    path.display()
                )));
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(local_error(format!(
                    "failed to inspect {}: {err}",
                    path.display()
                )));
            }
        }
        tokio::fs::create_dir_all(path).await.map_err(|err| {
            local_error(format!("failed to create directory {}: {err}", path.display()))
        })?;
        Ok(true)
    }

    #[tracing::instrument(name = "fs", level = "debug", skip(self, dir), fields(op = "list_files", dir = %dir.display()))]
    async fn list_files(&self, dir: &Path, extension: &str) -> AppResult<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(AppError::with_message(
                AppErrorKind::NotFound,
                codes::NOT_FOUND,
                format!("source directory {} does not exist", dir.display()),
            ));
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => {
                    return Err(local_error(format!(
                        "failed to read directory {}: {err}",
                        dir.display()
                    )));
                }
                Err(err) => {
                    tracing::warn!("skipping unreadable entry: {err}");
                    continue;
                }
            };
            if !entry.file_name().to_string_lossy().ends_with(extension) {
                continue;
            }
            let file_type = entry.file_type();
            if file_type.is_file() {
                files.push(entry.into_path());
            } else if file_type.is_symlink() {
                // Only links whose name matches are resolved; a stale one drops just that file.
                match tokio::fs::metadata(entry.path()).await {
                    Ok(meta) if meta.is_file() => files.push(entry.into_path()),
                    Ok(_) => {}
                    Err(err) => {
                        tracing::warn!(
                            path = %entry.path().display(),
                            "skipping link with unresolvable target: {err}"
                        );
                    }
                }
            }
        }
        Ok(files)
    }
}
