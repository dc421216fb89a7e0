#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Report harvesting pipeline.
//!
//! [`orchestrator::DownloadOrchestrator`] walks a store's date presets and
//! the catalog's report types, drives a
//! [`report_harvest_portal::BrowserSession`] through each download,
//! converts every export with [`report_harvest_tabular::convert`], and
//! finally merges each report's artifacts into a summary.
//!
//! Only configuration problems are fatal, and they are all detected before
//! the first browser call. Every other failure is recorded per attempt in
//! the returned [`report_harvest_models::RunReport`].

pub mod catalog;
pub mod clock;
pub mod date_range;
pub mod layout;
pub mod orchestrator;
pub mod progress;

pub use catalog::Catalog;
pub use clock::{Clock, FixedClock, SystemClock};
pub use orchestrator::DownloadOrchestrator;

/// Configuration errors. All of them abort a run before any browser
/// interaction.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested store is not in the catalog.
    #[error("unknown store '{name}' (known stores: {})", known.join(", "))]
    UnknownStore {
        /// The name that was requested.
        name: String,
        /// Every configured store name.
        known: Vec<String>,
    },

    /// A store references a preset key that is not defined.
    #[error("unknown date preset '{0}'")]
    UnknownPreset(String),

    /// A relative-days preset has no `value`.
    #[error("preset '{0}' is relative_days but has no value")]
    MissingValue(String),

    /// A relative-days preset has a `value` of zero.
    #[error("preset '{0}' must have a positive value")]
    NonPositiveValue(String),

    /// An explicit preset is missing `start` or `end`.
    #[error("preset '{0}' is explicit but is missing start or end")]
    MissingBounds(String),

    /// The same key is defined twice.
    #[error("duplicate {kind} '{key}'")]
    Duplicate {
        /// What was duplicated (`"preset"`, `"report"`, `"store"`).
        kind: &'static str,
        /// The duplicated key.
        key: String,
    },

    /// A catalog file is not valid TOML for its schema.
    #[error("failed to parse {file}: {message}")]
    Parse {
        /// Which file failed.
        file: String,
        /// Parser message.
        message: String,
    },

    /// A catalog file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
