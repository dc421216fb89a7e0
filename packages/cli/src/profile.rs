//! Browser profile maintenance: the one-time manual login and a quick look
//! at which account a profile is signed into.

use std::time::Duration;

use dialoguer::Confirm;
use report_harvest_portal::BrowserSession as _;
use report_harvest_portal::webdriver::{SessionConfig, WebDriverSession};

/// How long `--check-profile` keeps the browser open.
const CHECK_WINDOW: Duration = Duration::from_secs(60);

/// Opens the portal home page and waits for the operator to log in. The
/// session cookies persist in the profile directory for later runs.
pub async fn login(home_url: &str, config: &SessionConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = WebDriverSession::connect(config).await?;
    session.open(home_url).await?;

    println!("Log in to the portal in the browser window.");
    let confirmed = Confirm::new()
        .with_prompt("Finished logging in?")
        .default(true)
        .interact();

    session.close().await?;

    if confirmed? {
        log::info!("Profile saved to {}", config.profile_dir.display());
    } else {
        log::warn!("Login not confirmed; the profile may not be signed in");
    }
    Ok(())
}

/// Opens the portal home page for [`CHECK_WINDOW`] so the operator can see
/// which store the profile belongs to.
pub async fn check(home_url: &str, config: &SessionConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = WebDriverSession::connect(config).await?;
    session.open(home_url).await?;

    log::info!(
        "Showing {} with profile {} for {}s",
        home_url,
        config.profile_dir.display(),
        CHECK_WINDOW.as_secs()
    );
    tokio::time::sleep(CHECK_WINDOW).await;

    session.close().await?;
    Ok(())
}
