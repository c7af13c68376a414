use crate::config::{BrowserConfig, Config};
use crate::driver::{EokaDriver, PageDriver};
use crate::engine::{ExtractOptions, ScrollExtractor, StopReason};
use crate::{output, session, step, Result};
use eoka::{Browser, Page};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Summary of a completed run.
#[derive(Debug)]
pub struct RunReport {
    /// Number of unique records written.
    pub records: usize,
    /// Scroll commands issued during extraction.
    pub scrolls: u32,
    pub stop_reason: StopReason,
    /// Whether a saved session was reused instead of signing in.
    pub session_restored: bool,
    /// Navigation steps that were found and clicked.
    pub steps_clicked: usize,
    pub output_path: PathBuf,
    /// Total duration in milliseconds.
    pub duration_ms: u64,
}

/// Owns the browser for one extraction run.
pub struct Runner {
    browser: Browser,
    page: Page,
}

impl Runner {
    /// Launch a browser with the given config.
    pub async fn new(config: &BrowserConfig) -> Result<Self> {
        let stealth = eoka::StealthConfig {
            headless: config.headless,
            proxy: config.proxy.clone(),
            user_agent: config.user_agent.clone(),
            viewport_width: config.viewport.as_ref().map(|v| v.width).unwrap_or(1280),
            viewport_height: config.viewport.as_ref().map(|v| v.height).unwrap_or(720),
            ..Default::default()
        };

        debug!(
            "Launching browser (headless: {}, proxy: {:?})",
            config.headless, config.proxy
        );
        let browser = Browser::launch_with_config(stealth).await?;
        let page = browser.new_page("about:blank").await?;

        Ok(Self { browser, page })
    }

    /// Bootstrap the session, walk the navigation steps, extract the catalog
    /// and write it out. Nothing is written if any stage fails.
    pub async fn run(&self, config: &Config) -> Result<RunReport> {
        let start = Instant::now();
        let driver = EokaDriver::new(&self.page);
        let extract = &config.extract;

        let session_restored = self.bootstrap(&driver, config).await?;

        let steps_clicked = step::run_steps(
            &driver,
            &config.steps,
            extract.step_timeout_ms,
            extract.step_settle_ms,
        )
        .await;
        debug!("{}/{} navigation steps clicked", steps_clicked, config.steps.len());

        if let Err(e) = driver
            .wait_for_network_idle(extract.network_idle_ms, extract.network_idle_timeout_ms)
            .await
        {
            debug!("network not idle after navigation: {}", e);
        }

        let outcome = ScrollExtractor::new(&driver, ExtractOptions::from(extract))
            .run()
            .await?;
        info!(
            "Collected {} records (limit {})",
            outcome.records.len(),
            extract.max_records
        );

        output::write_records(&config.output.path, &outcome.records)?;

        Ok(RunReport {
            records: outcome.records.len(),
            scrolls: outcome.scrolls,
            stop_reason: outcome.stop_reason,
            session_restored,
            steps_clicked,
            output_path: config.output.path.clone(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Reuse the saved session if there is one, otherwise sign in and save
    /// the new session. Returns whether the saved session was reused.
    async fn bootstrap(&self, driver: &EokaDriver<'_>, config: &Config) -> Result<bool> {
        let path = &config.session.path;
        match session::load_session(path) {
            Some(state) => {
                info!("Using existing session");
                match session::restore(driver.page(), &state).await {
                    Ok(()) => {
                        info!("Navigating to: {}", config.target.url);
                        driver.goto(&config.target.url).await?;
                        return Ok(true);
                    }
                    Err(e) => warn!("Could not restore session, signing in again: {}", e),
                }
            }
            None => info!("No existing session found"),
        }

        session::authenticate(
            driver,
            config.login_url(),
            &config.auth,
            config.extract.step_timeout_ms,
            config.on_failure.screenshot.as_deref(),
        )
        .await?;
        let state = session::capture(driver.page()).await?;
        session::save_session(path, &state)?;
        Ok(false)
    }

    /// Close the browser.
    pub async fn close(self) -> Result<()> {
        self.browser.close().await?;
        Ok(())
    }
}
