//! Input units: where the log files come from.

use async_trait::async_trait;
use huddle_core::error::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Enumerates the input units to process, in processing order.
#[async_trait]
pub trait InputSource: Send + Sync {
    async fn units(&self) -> Result<Vec<String>>;
}

/// Every regular file directly inside a directory, sorted by file name.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl InputSource for DirectorySource {
    async fn units(&self) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                names.push(entry.file_name());
            }
        }
        names.sort();

        Ok(names
            .into_iter()
            .map(|name| self.dir.join(name).display().to_string())
            .collect())
    }
}

/// Copy the sample logs into the working directory, overwriting files that
/// already exist there. Returns the number of files copied.
pub async fn stage_samples(source: &Path, work_dir: &Path) -> std::io::Result<usize> {
    let mut pending = vec![(source.to_path_buf(), work_dir.to_path_buf())];
    let mut copied = 0;

    while let Some((from, to)) = pending.pop() {
        tokio::fs::create_dir_all(&to).await?;
        let mut entries = tokio::fs::read_dir(&from).await?;
        while let Some(entry) = entries.next_entry().await? {
            let target = to.join(entry.file_name());
            if entry.file_type().await?.is_dir() {
                pending.push((entry.path(), target));
            } else {
                tokio::fs::copy(entry.path(), &target).await?;
                debug!(file = %target.display(), "Staged");
                copied += 1;
            }
        }
    }

    info!(
        from = %source.display(),
        to = %work_dir.display(),
        files = copied,
        "Staged sample logs"
    );
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn units_are_sorted_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.log"), "b").unwrap();
        std::fs::write(dir.path().join("a.log"), "a").unwrap();
        std::fs::write(dir.path().join("c.log"), "c").unwrap();
        std::fs::create_dir(dir.path().join("archive")).unwrap();

        let units = DirectorySource::new(dir.path()).units().await.unwrap();
        let names: Vec<String> = units
            .iter()
            .map(|u| Path::new(u).file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.log", "b.log", "c.log"]);
        assert!(units[0].starts_with(&dir.path().display().to_string()));
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let result = DirectorySource::new("/nonexistent/huddle/logs").units().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn staging_copies_and_overwrites() {
        let samples = tempfile::tempdir().unwrap();
        let work = tempfile::tempdir().unwrap();
        let work_dir = work.path().join("logs");

        std::fs::write(samples.path().join("api.log"), "pristine").unwrap();
        std::fs::create_dir(samples.path().join("nested")).unwrap();
        std::fs::write(samples.path().join("nested/db.log"), "db").unwrap();

        std::fs::create_dir(&work_dir).unwrap();
        std::fs::write(work_dir.join("api.log"), "pristine\nappended").unwrap();
        std::fs::write(work_dir.join("extra.log"), "kept").unwrap();

        let copied = stage_samples(samples.path(), &work_dir).await.unwrap();
        assert_eq!(copied, 2);
        assert_eq!(std::fs::read_to_string(work_dir.join("api.log")).unwrap(), "pristine");
        assert_eq!(std::fs::read_to_string(work_dir.join("nested/db.log")).unwrap(), "db");
        assert_eq!(std::fs::read_to_string(work_dir.join("extra.log")).unwrap(), "kept");
    }
}
