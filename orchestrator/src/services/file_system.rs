//! Real file system service implementation
//!
//! Fixture copies and configuration writes against the local disk. Recursive
//! copies run on the blocking pool since fixture trees hold many block files.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::FileSystem;

/// Real file system implementation
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl RealFileSystem {
    pub fn new() -> Self {
        Self
    }
}

fn copy_tree(source: &Path, dest: &Path) -> io::Result<()> {
    for entry in WalkDir::new(source).follow_links(true) {
        let entry = entry?;
        let relative = entry.path().strip_prefix(source).map_err(io::Error::other)?;
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[async_trait]
impl FileSystem for RealFileSystem {
    async fn create_dir_all(&self, path: &Path) -> OrchestratorResult<()> {
        fs::create_dir_all(path)
            .await
            .map_err(|e| OrchestratorError::file_system("create_dir_all", path, e))
    }

    async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    async fn write_file(&self, path: &Path, contents: &str) -> OrchestratorResult<()> {
        if let Some(parent) = path.parent() {
            self.create_dir_all(parent).await?;
        }
        fs::write(path, contents)
            .await
            .map_err(|e| OrchestratorError::file_system("write", path, e))
    }

    async fn copy_dir(&self, source: &Path, dest: &Path) -> OrchestratorResult<()> {
        let (from, to) = (source.to_path_buf(), dest.to_path_buf());
        tokio::task::spawn_blocking(move || copy_tree(&from, &to))
            .await
            .map_err(|e| OrchestratorError::file_system("copy", source, e))?
            .map_err(|e| OrchestratorError::file_system("copy", source, e))
    }

    async fn list_subdirs(&self, path: &Path) -> OrchestratorResult<Vec<PathBuf>> {
        let mut entries = fs::read_dir(path)
            .await
            .map_err(|e| OrchestratorError::file_system("read_dir", path, e))?;

        let mut dirs = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| OrchestratorError::file_system("read_dir", path, e))?
        {
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| OrchestratorError::file_system("stat", &entry.path(), e))?;
            if file_type.is_dir() {
                dirs.push(entry.path());
            }
        }
        dirs.sort();
        Ok(dirs)
    }

    async fn remove_dir_all(&self, path: &Path) -> OrchestratorResult<()> {
        match fs::remove_dir_all(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(OrchestratorError::file_system("remove_dir_all", path, e)),
        }
    }

    async fn rename(&self, from: &Path, to: &Path) -> OrchestratorResult<()> {
        fs::rename(from, to)
            .await
            .map_err(|e| OrchestratorError::file_system("rename", from, e))
    }
}
