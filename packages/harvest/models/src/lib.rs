#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Data model for the report harvesting pipeline.
//!
//! Static configuration types ([`DatePreset`], [`ReportType`],
//! [`StoreConfig`]) are deserialized from the catalog TOML files. Per-run
//! types ([`DownloadMeta`], [`DownloadedArtifact`], [`SummaryArtifact`],
//! [`AttemptOutcome`], [`RunReport`]) are produced by the orchestrator.

use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// ISO-8601 calendar date format used in URLs and filenames.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// How a [`DatePreset`] derives its date window.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PresetKind {
    /// Inclusive window of `value` days ending today.
    #[serde(alias = "last_n_days")]
    RelativeDays,
    /// First day of the current month through today.
    #[serde(alias = "this_month")]
    ThisPeriod,
    /// The whole previous calendar month.
    #[serde(alias = "last_month")]
    LastPeriod,
    /// Fixed `start`/`end` dates taken verbatim from config.
    #[serde(alias = "custom")]
    Explicit,
}

/// A named, reusable rule for deriving a concrete date window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatePreset {
    /// Lookup key (e.g., `"last_7_days"`).
    pub key: String,
    /// Which derivation rule applies.
    pub kind: PresetKind,
    /// Day count for [`PresetKind::RelativeDays`].
    #[serde(default)]
    pub value: Option<u32>,
    /// Window start for [`PresetKind::Explicit`].
    #[serde(default)]
    pub start: Option<NaiveDate>,
    /// Window end for [`PresetKind::Explicit`].
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

/// A concrete date window produced from a [`DatePreset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedRange {
    /// First day of the window (inclusive).
    pub start: NaiveDate,
    /// Last day of the window (inclusive).
    pub end: NaiveDate,
}

impl ResolvedRange {
    /// `start` as a `YYYY-MM-DD` string.
    #[must_use]
    pub fn start_iso(&self) -> String {
        self.start.format(ISO_DATE_FORMAT).to_string()
    }

    /// `end` as a `YYYY-MM-DD` string.
    #[must_use]
    pub fn end_iso(&self) -> String {
        self.end.format(ISO_DATE_FORMAT).to_string()
    }
}

impl fmt::Display for ResolvedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}~{}", self.start_iso(), self.end_iso())
    }
}

/// One downloadable report on the portal.
///
/// Several report types may share a `path` when the page exposes more than
/// one download button (e.g., a primary metric and a secondary breakdown).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportType {
    /// Stable key used in output paths (e.g., `"sales"`).
    pub key: String,
    /// Portal path appended after the store id (e.g., `"/analytics/sales-v2"`).
    pub path: String,
    /// Visible text of the download button for this report.
    pub label: String,
    /// Zero-based position among the page's visible download buttons.
    ///
    /// When set, the control is selected by position instead of by `label`.
    #[serde(default)]
    pub control_index: Option<usize>,
}

/// Where the portal lives and how long to wait on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Base URL that store ids and report paths are appended to.
    pub base_url: String,
    /// Landing page used for interactive login.
    pub home_url: String,
    /// CSS selector of the page's primary content container.
    #[serde(default = "default_content_selector")]
    pub content_selector: String,
    /// Text shared by every download button on report pages.
    pub download_text: String,
    /// Upper bound for a page load plus its controls appearing.
    #[serde(default = "default_timeout_secs")]
    pub navigation_timeout_secs: u64,
    /// Upper bound for a specific download control becoming visible.
    #[serde(default = "default_timeout_secs")]
    pub control_timeout_secs: u64,
    /// Upper bound for a download to land after the click.
    #[serde(default = "default_timeout_secs")]
    pub download_timeout_secs: u64,
    /// Fixed delay after each page load for client-side rendering.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

fn default_content_selector() -> String {
    "main".to_owned()
}

const fn default_timeout_secs() -> u64 {
    60
}

const fn default_settle_ms() -> u64 {
    1_500
}

/// One target store on the portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Human-readable store name, used for output directories.
    pub name: String,
    /// Portal-side store identifier embedded in report URLs.
    pub portal_store_id: String,
    /// Date preset keys to harvest. `None` falls back to the catalog default.
    #[serde(default)]
    pub presets: Option<Vec<String>>,
}

/// Identity of one download attempt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DownloadMeta {
    /// Owning store name (unsanitized).
    pub store_name: String,
    /// Report type key.
    pub report_key: String,
    /// Date preset key.
    pub preset_key: String,
    /// Resolved window start.
    pub start: NaiveDate,
    /// Resolved window end.
    pub end: NaiveDate,
}

impl DownloadMeta {
    /// Builds the metadata for a `(store, report, preset)` triple.
    #[must_use]
    pub fn new(store_name: &str, report_key: &str, preset_key: &str, range: ResolvedRange) -> Self {
        Self {
            store_name: store_name.to_owned(),
            report_key: report_key.to_owned(),
            preset_key: preset_key.to_owned(),
            start: range.start,
            end: range.end,
        }
    }

    /// The date window of this attempt.
    #[must_use]
    pub const fn range(&self) -> ResolvedRange {
        ResolvedRange {
            start: self.start,
            end: self.end,
        }
    }
}

impl fmt::Display for DownloadMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {} | {}",
            self.store_name,
            self.report_key,
            self.preset_key,
            self.range()
        )
    }
}

/// A converted report file on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadedArtifact {
    /// Canonical spreadsheet path.
    pub path: PathBuf,
    /// The attempt that produced it.
    pub meta: DownloadMeta,
}

/// A consolidated file for one store/report pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryArtifact {
    /// Summary spreadsheet path.
    pub path: PathBuf,
    /// Artifacts that were present on disk and merged.
    pub sources: Vec<PathBuf>,
}

/// The step of the download state machine at which an attempt stopped.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttemptStage {
    /// Loading the report page.
    Navigate,
    /// Finding the download control.
    Locate,
    /// Clicking and waiting for the download, then staging the file.
    Capture,
    /// Converting the staged export to the canonical format.
    Convert,
}

/// Result of one `(store, preset, report)` attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptOutcome {
    /// The report was downloaded and converted.
    Downloaded(DownloadedArtifact),
    /// The attempt was skipped after a recoverable failure.
    Failed {
        /// The attempt that failed.
        meta: DownloadMeta,
        /// Where it failed.
        stage: AttemptStage,
        /// Human-readable cause.
        reason: String,
    },
}

impl AttemptOutcome {
    /// Metadata of the attempt regardless of outcome.
    #[must_use]
    pub const fn meta(&self) -> &DownloadMeta {
        match self {
            Self::Downloaded(artifact) => &artifact.meta,
            Self::Failed { meta, .. } => meta,
        }
    }

    /// Returns `true` for [`AttemptOutcome::Downloaded`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Downloaded(_))
    }
}

/// A summary that could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryFailure {
    /// Report type key of the pair.
    pub report_key: String,
    /// Why the merge failed.
    pub reason: String,
}

/// Everything that happened during one store's run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    /// Store the run was for.
    pub store_name: String,
    /// Every attempt, in execution order.
    pub attempts: Vec<AttemptOutcome>,
    /// Summaries written.
    pub summaries: Vec<SummaryArtifact>,
    /// Summaries that could not be written.
    pub summary_failures: Vec<SummaryFailure>,
}

impl RunReport {
    /// Number of attempts that produced an artifact.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.attempts.iter().filter(|a| a.is_success()).count()
    }

    /// Number of attempts that were skipped.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.attempts.len() - self.succeeded()
    }

    /// Iterates over the failed attempts.
    pub fn failures(&self) -> impl Iterator<Item = &AttemptOutcome> {
        self.attempts.iter().filter(|a| !a.is_success())
    }
}
