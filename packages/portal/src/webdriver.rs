//! WebDriver-backed [`BrowserSession`].
//!
//! Connects to a running `chromedriver` and launches Chrome with a
//! persistent `--user-data-dir`, so a login done once with
//! [`WebDriverSession::open`] survives across runs. Downloads are routed
//! into `<profile>/downloads` and captured with [`crate::download`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder, Locator};

use crate::download::{DownloadWatch, wait_for_download};
use crate::selectors::button_containing;
use crate::{BrowserSession, CapturedDownload, Control, ControlSpec, PortalError, WaitPolicy};

/// How often element lookups are retried while waiting.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Settings for launching a [`WebDriverSession`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// WebDriver endpoint (e.g., `http://localhost:9515`).
    pub webdriver_url: String,
    /// Chrome profile directory for this store.
    pub profile_dir: PathBuf,
    /// Run Chrome without a window.
    pub headless: bool,
}

impl SessionConfig {
    /// Creates a config for the given endpoint and profile directory.
    #[must_use]
    pub fn new(webdriver_url: &str, profile_dir: impl Into<PathBuf>) -> Self {
        Self {
            webdriver_url: webdriver_url.to_owned(),
            profile_dir: profile_dir.into(),
            headless: false,
        }
    }

    /// Sets headless mode.
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }
}

/// A Chrome session driven over WebDriver.
pub struct WebDriverSession {
    client: Client,
    download_dir: PathBuf,
}

impl WebDriverSession {
    /// Launches Chrome with the configured profile.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError`] if the profile directory cannot be created,
    /// its path is not valid UTF-8, or the WebDriver endpoint refuses the
    /// session.
    pub async fn connect(config: &SessionConfig) -> Result<Self, PortalError> {
        tokio::fs::create_dir_all(&config.profile_dir).await?;
        let profile_dir = tokio::fs::canonicalize(&config.profile_dir).await?;
        let download_dir = profile_dir.join("downloads");
        tokio::fs::create_dir_all(&download_dir).await?;

        let capabilities = chrome_capabilities(&profile_dir, &download_dir, config.headless)?;

        log::info!(
            "Starting browser with profile {} via {}",
            profile_dir.display(),
            config.webdriver_url
        );

        let client = ClientBuilder::native()
            .capabilities(capabilities)
            .connect(&config.webdriver_url)
            .await?;

        Ok(Self {
            client,
            download_dir,
        })
    }

    /// Opens `url` without waiting for report content (login pages, the
    /// portal home page).
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::WebDriver`] if navigation fails.
    pub async fn open(&mut self, url: &str) -> Result<(), PortalError> {
        self.client.goto(url).await?;
        Ok(())
    }

    /// Directory downloads are saved into.
    #[must_use]
    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    async fn wait_loaded(&self, url: &str, wait: &WaitPolicy) -> Result<(), PortalError> {
        tokio::time::timeout(wait.timeout, self.poll_loaded(wait))
            .await
            .map_err(|_| PortalError::NavigationTimeout {
                url: url.to_owned(),
                timeout: wait.timeout,
            })?
    }

    /// Resolves once the content container and at least one download button
    /// are on the page.
    async fn poll_loaded(&self, wait: &WaitPolicy) -> Result<(), PortalError> {
        self.client
            .wait()
            .at_most(wait.timeout)
            .every(POLL_INTERVAL)
            .for_element(Locator::Css(&wait.content_selector))
            .await?;

        let any_download = button_containing(&wait.download_text);
        while nth_visible(&self.client, &any_download, 0).await?.is_none() {
            tokio::time::sleep(POLL_INTERVAL).await;
        }
        Ok(())
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    type Control = WebDriverControl;

    async fn navigate(&mut self, url: &str, wait: &WaitPolicy) -> Result<(), PortalError> {
        log::debug!("goto {url}");
        tokio::time::timeout(wait.timeout, self.client.goto(url))
            .await
            .map_err(|_| PortalError::NavigationTimeout {
                url: url.to_owned(),
                timeout: wait.timeout,
            })??;
        self.wait_loaded(url, wait).await
    }

    async fn reload(&mut self, wait: &WaitPolicy) -> Result<(), PortalError> {
        let url = self.client.current_url().await?.to_string();
        log::debug!("reload {url}");
        tokio::time::timeout(wait.timeout, self.client.refresh())
            .await
            .map_err(|_| PortalError::NavigationTimeout {
                url: url.clone(),
                timeout: wait.timeout,
            })??;
        self.wait_loaded(&url, wait).await
    }

    async fn locate_control(&mut self, spec: &ControlSpec) -> Result<Self::Control, PortalError> {
        Ok(WebDriverControl {
            client: self.client.clone(),
            spec: spec.clone(),
        })
    }

    async fn prepare_download(&mut self) -> Result<DownloadWatch, PortalError> {
        DownloadWatch::snapshot(&self.download_dir).await
    }

    async fn await_download(
        &mut self,
        watch: DownloadWatch,
        timeout: Duration,
    ) -> Result<CapturedDownload, PortalError> {
        wait_for_download(&watch, timeout).await
    }

    async fn close(&mut self) -> Result<(), PortalError> {
        self.client.clone().close().await?;
        Ok(())
    }
}

/// A lazily resolved download control on the current page.
pub struct WebDriverControl {
    client: Client,
    spec: ControlSpec,
}

impl WebDriverControl {
    async fn resolve(&self) -> Result<Option<Element>, PortalError> {
        nth_visible(&self.client, &self.spec.xpath(), self.spec.position()).await
    }

    async fn poll_visible(&self) -> Result<(), PortalError> {
        while self.resolve().await?.is_none() {
            tokio::time::sleep(POLL_INTERVAL).await;
        }
        Ok(())
    }
}

#[async_trait]
impl Control for WebDriverControl {
    async fn wait_visible(&self, timeout: Duration) -> Result<(), PortalError> {
        tokio::time::timeout(timeout, self.poll_visible())
            .await
            .map_err(|_| PortalError::ControlTimeout {
                control: self.spec.to_string(),
                timeout,
            })?
    }

    async fn click(&self, force: bool) -> Result<(), PortalError> {
        let element = self
            .resolve()
            .await?
            .ok_or_else(|| PortalError::ControlNotFound(self.spec.to_string()))?;

        if force {
            let arg = serde_json::to_value(&element)?;
            self.client
                .execute("arguments[0].click();", vec![arg])
                .await?;
        } else {
            element.click().await?;
        }
        Ok(())
    }
}

/// Chrome options for a persistent profile that saves downloads into
/// `download_dir` without prompting.
fn chrome_capabilities(
    profile_dir: &Path,
    download_dir: &Path,
    headless: bool,
) -> Result<serde_json::Map<String, serde_json::Value>, PortalError> {
    let profile_dir = utf8(profile_dir)?;
    let download_dir = utf8(download_dir)?;

    let mut args = vec![
        format!("--user-data-dir={profile_dir}"),
        "--disable-blink-features=AutomationControlled".to_owned(),
    ];
    if headless {
        args.push("--headless=new".to_owned());
    }

    let mut capabilities = serde_json::Map::new();
    capabilities.insert(
        "goog:chromeOptions".to_owned(),
        serde_json::json!({
            "args": args,
            "prefs": {
                "download.default_directory": download_dir,
                "download.prompt_for_download": false,
                "download.directory_upgrade": true,
            },
        }),
    );
    Ok(capabilities)
}

fn utf8(path: &Path) -> Result<&str, PortalError> {
    path.to_str()
        .ok_or_else(|| PortalError::NonUtf8Path(path.to_path_buf()))
}

/// The `position`-th displayed element matching `xpath`, if any.
async fn nth_visible(
    client: &Client,
    xpath: &str,
    position: usize,
) -> Result<Option<Element>, PortalError> {
    let mut visible = Vec::new();
    for element in client.find_all(Locator::XPath(xpath)).await? {
        // Stale elements are skipped; the page may be re-rendering.
        if element.is_displayed().await.unwrap_or(false) {
            visible.push(element);
        }
    }
    Ok(visible.into_iter().nth(position))
}
