//! Download capture by watching the browser's download directory.
//!
//! WebDriver has no download event, so [`DownloadWatch`] snapshots the
//! directory before the click and [`wait_for_download`] polls for a new,
//! fully written file afterwards.
//!
//! A file counts as fully written once no new partial download sits next to
//! it and its size is non-zero and unchanged across two scans.

use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{CapturedDownload, PortalError};

/// How often the download directory is re-scanned.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Suffixes Chrome and Firefox use for downloads still in flight.
const PARTIAL_SUFFIXES: &[&str] = &[".crdownload", ".part", ".tmp"];

/// Directory state captured before a download is triggered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadWatch {
    /// Directory being watched, if the session uses one.
    pub dir: Option<PathBuf>,
    /// Entries that existed before the click.
    pub existing: HashSet<OsString>,
}

impl DownloadWatch {
    /// Snapshots the current entries of `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::Io`] if the directory cannot be read.
    pub async fn snapshot(dir: &Path) -> Result<Self, PortalError> {
        tokio::fs::create_dir_all(dir).await?;
        Ok(Self {
            dir: Some(dir.to_path_buf()),
            existing: list_entries(dir).await?,
        })
    }
}

/// Returns `true` if `name` is a download the browser is still writing.
#[must_use]
pub fn is_partial(name: &str) -> bool {
    PARTIAL_SUFFIXES.iter().any(|s| name.ends_with(s))
}

/// Returns `true` if `name` looks like a finished download.
#[must_use]
pub fn is_complete(name: &str) -> bool {
    !name.starts_with('.') && !is_partial(name)
}

/// Polls the watched directory until a new complete file appears.
///
/// # Errors
///
/// Returns [`PortalError::DownloadTimeout`] if no file lands within
/// `timeout`, or [`PortalError::Io`] if the directory cannot be read.
pub async fn wait_for_download(
    watch: &DownloadWatch,
    timeout: Duration,
) -> Result<CapturedDownload, PortalError> {
    let Some(dir) = &watch.dir else {
        return Err(PortalError::DownloadTimeout { timeout });
    };

    tokio::time::timeout(timeout, poll_new_file(dir, &watch.existing))
        .await
        .map_err(|_| PortalError::DownloadTimeout { timeout })?
}

async fn poll_new_file(
    dir: &Path,
    existing: &HashSet<OsString>,
) -> Result<CapturedDownload, PortalError> {
    let mut sizes: HashMap<String, u64> = HashMap::new();
    loop {
        let mut names: Vec<String> = list_entries(dir)
            .await?
            .into_iter()
            .filter(|name| !existing.contains(name))
            .map(|name| name.to_string_lossy().into_owned())
            .collect();
        names.sort();

        if names.iter().any(|name| is_partial(name)) {
            log::trace!("Download still in progress in {}", dir.display());
            sizes.clear();
        } else if let Some(captured) = settled_file(dir, &names, &mut sizes).await? {
            return Ok(captured);
        }

        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// Returns the first candidate whose size is non-zero and matches the size
/// seen on the previous scan, recording current sizes into `sizes`.
async fn settled_file(
    dir: &Path,
    names: &[String],
    sizes: &mut HashMap<String, u64>,
) -> Result<Option<CapturedDownload>, PortalError> {
    for name in names.iter().filter(|name| is_complete(name)) {
        let path = dir.join(name);
        let len = match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => meta.len(),
            Ok(_) => continue,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        };

        let previous = sizes.insert(name.clone(), len);
        if len > 0 && previous == Some(len) {
            return Ok(Some(CapturedDownload {
                path,
                suggested_name: name.clone(),
            }));
        }
    }
    Ok(None)
}

async fn list_entries(dir: &Path) -> Result<HashSet<OsString>, PortalError> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut names = HashSet::new();
    while let Some(entry) = entries.next_entry().await? {
        names.insert(entry.file_name());
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_downloads_are_not_complete() {
        assert!(is_complete("sales.csv"));
        assert!(!is_complete("sales.csv.crdownload"));
        assert!(!is_complete("sales.csv.part"));
        assert!(!is_complete(".com.google.Chrome.abc123"));
        assert!(is_partial("sales.csv.tmp"));
        assert!(!is_partial(".com.google.Chrome.abc123"));
    }

    #[tokio::test]
    async fn finds_file_created_after_snapshot() {
        let tmp = std::env::temp_dir().join("report_harvest_download_watch");
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(&tmp).unwrap();
        std::fs::write(tmp.join("old.csv"), "a\n").unwrap();

        let watch = DownloadWatch::snapshot(&tmp).await.unwrap();
        std::fs::write(tmp.join("new.csv"), "a\n").unwrap();

        let captured = wait_for_download(&watch, Duration::from_secs(5)).await.unwrap();
        assert_eq!(captured.suggested_name, "new.csv");
        assert_eq!(captured.path, tmp.join("new.csv"));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn waits_while_partial_download_is_present() {
        let tmp = std::env::temp_dir().join("report_harvest_download_partial");
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(&tmp).unwrap();

        let watch = DownloadWatch::snapshot(&tmp).await.unwrap();
        std::fs::write(tmp.join("sales.csv.crdownload"), "date,amount\n").unwrap();
        std::fs::write(tmp.join("sales.csv"), "").unwrap();

        let err = wait_for_download(&watch, Duration::from_millis(800))
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::DownloadTimeout { .. }));

        std::fs::remove_file(tmp.join("sales.csv.crdownload")).unwrap();
        std::fs::write(tmp.join("sales.csv"), "date,amount\n2025-01-01,3\n").unwrap();

        let captured = wait_for_download(&watch, Duration::from_secs(5)).await.unwrap();
        assert_eq!(captured.suggested_name, "sales.csv");
        assert_eq!(
            std::fs::read_to_string(&captured.path).unwrap(),
            "date,amount\n2025-01-01,3\n"
        );

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn ignores_empty_files() {
        let tmp = std::env::temp_dir().join("report_harvest_download_empty");
        let _ = std::fs::remove_dir_all(&tmp);
        std::fs::create_dir_all(&tmp).unwrap();

        let watch = DownloadWatch::snapshot(&tmp).await.unwrap();
        std::fs::write(tmp.join("sales.csv"), "").unwrap();

        let err = wait_for_download(&watch, Duration::from_millis(800))
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::DownloadTimeout { .. }));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn times_out_when_nothing_lands() {
        let tmp = std::env::temp_dir().join("report_harvest_download_timeout");
        let _ = std::fs::remove_dir_all(&tmp);

        let watch = DownloadWatch::snapshot(&tmp).await.unwrap();
        let err = wait_for_download(&watch, Duration::from_millis(300))
            .await
            .unwrap_err();
        assert!(matches!(err, PortalError::DownloadTimeout { .. }));

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
