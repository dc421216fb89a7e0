#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Browser automation capability for the merchant portal.
//!
//! Provides the [`BrowserSession`] and [`Control`] traits the harvesting
//! pipeline drives, plus a WebDriver-backed implementation
//! ([`webdriver::WebDriverSession`]) that talks to a running `chromedriver`
//! with a persistent per-store Chrome profile.
//!
//! Every wait is bounded; exceeding a bound surfaces as one of the
//! `*Timeout` variants of [`PortalError`].

pub mod download;
pub mod selectors;
pub mod url;
pub mod webdriver;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use report_harvest_models::PortalConfig;

pub use download::DownloadWatch;
pub use selectors::ControlSpec;

/// Errors that can occur while driving the portal.
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    /// The page or its download controls did not appear in time.
    #[error("navigation to {url} timed out after {timeout:?}")]
    NavigationTimeout {
        /// The page being loaded.
        url: String,
        /// The bound that was exceeded.
        timeout: Duration,
    },

    /// A specific download control did not become visible in time.
    #[error("control {control} not visible after {timeout:?}")]
    ControlTimeout {
        /// Description of the control.
        control: String,
        /// The bound that was exceeded.
        timeout: Duration,
    },

    /// A control that was visible has since disappeared.
    #[error("control {0} not found")]
    ControlNotFound(String),

    /// No download landed in time after the click.
    #[error("download did not complete within {timeout:?}")]
    DownloadTimeout {
        /// The bound that was exceeded.
        timeout: Duration,
    },

    /// The WebDriver session could not be created.
    #[error("WebDriver session error: {0}")]
    Session(#[from] fantoccini::error::NewSessionError),

    /// A WebDriver command failed.
    #[error("WebDriver command error: {0}")]
    WebDriver(#[from] fantoccini::error::CmdError),

    /// Serializing a WebDriver argument failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A path handed to the browser is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PortalError {
    /// Returns `true` for the bounded-wait failures.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::NavigationTimeout { .. } | Self::ControlTimeout { .. } | Self::DownloadTimeout { .. }
        )
    }
}

/// What a page load must produce before it counts as loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitPolicy {
    /// CSS selector of the primary content container.
    pub content_selector: String,
    /// Text shared by every download button; at least one must be visible.
    pub download_text: String,
    /// Upper bound for the whole load.
    pub timeout: Duration,
}

impl From<&PortalConfig> for WaitPolicy {
    fn from(config: &PortalConfig) -> Self {
        Self {
            content_selector: config.content_selector.clone(),
            download_text: config.download_text.clone(),
            timeout: Duration::from_secs(config.navigation_timeout_secs),
        }
    }
}

/// A file produced by a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedDownload {
    /// Where the browser saved the file.
    pub path: PathBuf,
    /// Filename the portal suggested.
    pub suggested_name: String,
}

/// A UI control on a loaded page.
#[async_trait]
pub trait Control: Send + Sync {
    /// Waits until the control is present and visible.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::ControlTimeout`] if `timeout` elapses first.
    async fn wait_visible(&self, timeout: Duration) -> Result<(), PortalError>;

    /// Clicks the control. `force` dispatches the click from script,
    /// bypassing overlap and actionability checks.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError`] if the control is gone or the click fails.
    async fn click(&self, force: bool) -> Result<(), PortalError>;
}

/// An authenticated browser session owned by one store's run.
///
/// Calls are made strictly one at a time; the portal is a single-page app
/// whose client-side state is not safe to interleave.
#[async_trait]
pub trait BrowserSession: Send {
    /// The control handle type returned by [`BrowserSession::locate_control`].
    type Control: Control;

    /// Loads `url` and waits until `wait` is satisfied.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::NavigationTimeout`] if the page does not
    /// settle within the policy's timeout.
    async fn navigate(&mut self, url: &str, wait: &WaitPolicy) -> Result<(), PortalError>;

    /// Reloads the current page from scratch and waits until `wait` is
    /// satisfied.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::NavigationTimeout`] if the page does not
    /// settle within the policy's timeout.
    async fn reload(&mut self, wait: &WaitPolicy) -> Result<(), PortalError>;

    /// Returns a handle to the control described by `spec`. The handle is
    /// resolved lazily by [`Control::wait_visible`] and [`Control::click`].
    ///
    /// # Errors
    ///
    /// Returns [`PortalError`] if the session cannot build the handle.
    async fn locate_control(&mut self, spec: &ControlSpec) -> Result<Self::Control, PortalError>;

    /// Arms download capture. Must be called before the click that triggers
    /// the download.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError`] if the download location cannot be inspected.
    async fn prepare_download(&mut self) -> Result<DownloadWatch, PortalError>;

    /// Waits for the download armed by `watch` to complete.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::DownloadTimeout`] if nothing lands in time.
    async fn await_download(
        &mut self,
        watch: DownloadWatch,
        timeout: Duration,
    ) -> Result<CapturedDownload, PortalError>;

    /// Ends the session.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError`] if the browser could not be shut down cleanly.
    async fn close(&mut self) -> Result<(), PortalError>;
}
