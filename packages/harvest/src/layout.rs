//! Output directory layout.
//!
//! ```text
//! <root>/<store>/<report>/<store>_<report>_<preset>_<start>_<end>.xlsx
//! <root>/<store>/<report>/<store>_<report>_SUMMARY.xlsx
//! ```
//!
//! Every path segment derived from a name goes through [`sanitize_filename`]
//! first. Paths are deterministic, so re-running an attempt overwrites its
//! previous artifact.

use std::path::{Path, PathBuf};

use report_harvest_models::DownloadMeta;
use report_harvest_portal::CapturedDownload;
use report_harvest_tabular::xlsx::CANONICAL_EXTENSION;

/// Characters that are not allowed in Windows filenames.
const FORBIDDEN: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Replaces every filesystem-hostile character with `_` and trims
/// surrounding whitespace.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if FORBIDDEN.contains(&c) { '_' } else { c })
        .collect::<String>()
        .trim()
        .to_owned()
}

/// Root of the reports tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/<store>/<report>`
    #[must_use]
    pub fn report_dir(&self, store_name: &str, report_key: &str) -> PathBuf {
        self.root
            .join(sanitize_filename(store_name))
            .join(sanitize_filename(report_key))
    }

    /// Canonical artifact path for one attempt.
    #[must_use]
    pub fn artifact_path(&self, meta: &DownloadMeta) -> PathBuf {
        let name = format!(
            "{}_{}_{}_{}_{}.{CANONICAL_EXTENSION}",
            sanitize_filename(&meta.store_name),
            sanitize_filename(&meta.report_key),
            sanitize_filename(&meta.preset_key),
            meta.range().start_iso(),
            meta.range().end_iso(),
        );
        self.report_dir(&meta.store_name, &meta.report_key).join(name)
    }

    /// Summary path for a store/report pair.
    #[must_use]
    pub fn summary_path(&self, store_name: &str, report_key: &str) -> PathBuf {
        let name = format!(
            "{}_{}_SUMMARY.{CANONICAL_EXTENSION}",
            sanitize_filename(store_name),
            sanitize_filename(report_key),
        );
        self.report_dir(store_name, report_key).join(name)
    }

    /// Where the raw export of an attempt is kept until conversion: the
    /// report directory plus `<preset>_<suggested name>`, so presets whose
    /// exports share a filename never overwrite each other's raw file.
    #[must_use]
    pub fn staging_path(&self, meta: &DownloadMeta, suggested_name: &str) -> PathBuf {
        let mut suggested = sanitize_filename(suggested_name);
        if suggested.is_empty() {
            suggested = "download".to_owned();
        }
        let name = format!("{}_{suggested}", sanitize_filename(&meta.preset_key));
        self.report_dir(&meta.store_name, &meta.report_key).join(name)
    }

    /// Moves a captured download into its staging path.
    ///
    /// Falls back to copy-and-delete when the browser's download directory
    /// is on another filesystem.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be moved.
    pub async fn stage_download(
        &self,
        captured: &CapturedDownload,
        meta: &DownloadMeta,
    ) -> std::io::Result<PathBuf> {
        let staged = self.staging_path(meta, &captured.suggested_name);
        if let Some(parent) = staged.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        if tokio::fs::rename(&captured.path, &staged).await.is_err() {
            tokio::fs::copy(&captured.path, &staged).await?;
            tokio::fs::remove_file(&captured.path).await?;
        }

        log::debug!(
            "Staged {} -> {}",
            captured.path.display(),
            staged.display()
        );
        Ok(staged)
    }
}
