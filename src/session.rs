//! Session bootstrap: persisted cookies, and the sign-in flow used when
//! there are none.

use eoka::cdp::NetworkSetCookie;
use eoka::Page;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::AuthConfig;
use crate::driver::{Locator, PageDriver};
use crate::step;
use crate::{Error, Result};

/// Saved browser session. Cookie contents are never interpreted beyond what
/// is needed to re-apply them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub cookies: Vec<SessionCookie>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Load a saved session. A missing or unreadable file means "sign in again".
pub fn load_session(path: &Path) -> Option<SessionState> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!("Could not read session {}: {}", path.display(), e);
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(state) => Some(state),
        Err(e) => {
            warn!("Ignoring corrupt session {}: {}", path.display(), e);
            None
        }
    }
}

pub fn save_session(path: &Path, state: &SessionState) -> Result<()> {
    info!("Saving session to {}", path.display());
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string(state)?)?;
    Ok(())
}

/// Snapshot the page's cookies.
pub async fn capture(page: &Page) -> Result<SessionState> {
    let cookies = page.cookies().await?;
    let cookies = serde_json::from_value(serde_json::to_value(&cookies)?)?;
    Ok(SessionState { cookies })
}

impl SessionCookie {
    fn flag(&self, key: &str) -> Option<bool> {
        self.extra.get(key).and_then(serde_json::Value::as_bool)
    }

    /// Rebuild the set-cookie request for this cookie, keeping the attributes
    /// Chrome checks on write.
    ///
    /// `__Host-` cookies must not carry a domain, so they are scoped by URL
    /// instead. Session cookies (no positive expiry) are sent without one.
    pub fn to_set_cookie(&self) -> NetworkSetCookie {
        let secure = self.flag("secure");
        let expires = self
            .extra
            .get("expires")
            .and_then(serde_json::Value::as_f64)
            .filter(|e| *e > 0.0 && self.flag("session") != Some(true));
        let same_site = self
            .extra
            .get("sameSite")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string);

        let (url, domain) = match (&self.domain, self.name.starts_with("__Host-")) {
            (Some(domain), true) => {
                let host = domain.trim_start_matches('.');
                (Some(format!("https://{}/", host)), None)
            }
            (domain, _) => (None, domain.clone()),
        };

        NetworkSetCookie {
            name: self.name.clone(),
            value: self.value.clone(),
            url,
            domain,
            path: self.path.clone(),
            secure,
            http_only: self.flag("httpOnly"),
            same_site,
            expires,
        }
    }
}

/// Re-apply saved cookies to the page in one batch.
pub async fn restore(page: &Page, state: &SessionState) -> Result<()> {
    debug!("Restoring {} cookies", state.cookies.len());
    let cookies = state
        .cookies
        .iter()
        .map(SessionCookie::to_set_cookie)
        .collect();
    page.set_cookies_bulk(cookies).await?;
    Ok(())
}

/// Sign in through the login form and wait until the landing page loads.
///
/// A missed landing is recovered through the optional interstitial page; if
/// that fails too, a screenshot is written and bootstrap carries on, leaving
/// the container wait to decide whether the run can proceed.
pub async fn authenticate<D: PageDriver>(
    driver: &D,
    login_url: &str,
    auth: &AuthConfig,
    step_timeout_ms: u64,
    failure_screenshot: Option<&Path>,
) -> Result<()> {
    if auth.email.is_empty() || auth.password.is_empty() {
        return Err(Error::Config(
            "auth.email and auth.password are required to sign in".into(),
        ));
    }

    info!("Opening login page {}", login_url);
    driver.goto(login_url).await?;
    if let Err(e) = driver.wait_for_network_idle(500, 10_000).await {
        debug!("login page not idle: {}", e);
    }

    info!("Filling in credentials");
    driver.fill(&auth.email_selector, &auth.email).await?;
    driver.fill(&auth.password_selector, &auth.password).await?;
    step::perform_step(driver, &auth.submit, step_timeout_ms).await;

    info!("Waiting for navigation to '{}'", auth.landing);
    if driver
        .wait_for_url_contains(&auth.landing, auth.landing_timeout_ms)
        .await
        .is_ok()
    {
        return Ok(());
    }

    if let Err(e) = pass_interstitial(driver, auth, step_timeout_ms).await {
        warn!("Navigation issue: {}", e);
        if let Some(path) = failure_screenshot {
            match driver.screenshot(path).await {
                Ok(()) => info!("Saved failure screenshot to {}", path.display()),
                Err(e) => warn!("Failed to save screenshot: {}", e),
            }
        }
    }
    Ok(())
}

async fn pass_interstitial<D: PageDriver>(
    driver: &D,
    auth: &AuthConfig,
    step_timeout_ms: u64,
) -> Result<()> {
    let url = driver.url().await?;
    let on_interstitial = url.contains(&auth.interstitial_marker)
        || driver
            .count(None, &Locator::text(&auth.interstitial))
            .await?
            > 0;
    if !on_interstitial {
        return Err(Error::Navigation(format!(
            "still on {} after sign-in",
            url
        )));
    }

    info!("On interstitial page, clicking '{}'", auth.interstitial);
    step::perform_step(driver, &auth.interstitial, step_timeout_ms).await;
    driver
        .wait_for_url_contains(&auth.landing, auth.landing_timeout_ms)
        .await
}
