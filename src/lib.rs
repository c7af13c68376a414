//! # eoka-catalog
//!
//! Extract a bounded catalog of records from an authenticated web app that
//! renders them in a lazily-loaded, infinite-scroll grid.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use eoka_catalog::{Config, Runner};
//!
//! # #[tokio::main]
//! # async fn main() -> eoka_catalog::Result<()> {
//! let config = Config::load("catalog.yaml")?;
//! let runner = Runner::new(&config.browser).await?;
//! let report = runner.run(&config).await;
//! runner.close().await?;
//! println!("Collected: {}", report?.records);
//! # Ok(())
//! # }
//! ```
//!
//! The extraction core ([`locate`], [`step`], [`fields`], [`engine`]) only
//! talks to the page through [`PageDriver`], so it can be driven by any
//! backend.

mod config;
pub mod driver;
pub mod engine;
pub mod fields;
pub mod locate;
pub mod output;
mod runner;
pub mod session;
pub mod step;

pub use config::{
    AuthConfig, BrowserConfig, Config, ExtractConfig, OnFailure, OutputConfig, ParamDef, Params,
    SessionConfig, TargetUrl, Viewport,
};
pub use driver::{EokaDriver, ElementRef, Locator, PageDriver};
pub use engine::{ExtractOptions, ExtractOutcome, ScrollExtractor, StopReason};
pub use fields::Record;
pub use locate::Resolution;
pub use runner::{RunReport, Runner};
pub use session::SessionState;

/// Result type for eoka-catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during config loading or extraction.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("browser error: {0}")]
    Browser(#[from] eoka::Error),

    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("catalog container '{container}' not visible within {timeout_ms}ms: {reason}")]
    ContainerNotVisible {
        container: String,
        timeout_ms: u64,
        reason: String,
    },

    #[error("navigation failed: {0}")]
    Navigation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let yaml = r#"
name: "Catalog"
target:
  url: "https://example.com/challenge"
"#;
        let config = Config::parse(yaml).unwrap();
        assert_eq!(config.name, "Catalog");
        assert_eq!(config.target.url, "https://example.com/challenge");
        assert_eq!(config.login_url(), "https://example.com/challenge");
        assert!(!config.browser.headless);
        assert_eq!(
            config.steps,
            vec!["Start Journey", "Continue Search", "Inventory Section"]
        );
        assert_eq!(config.extract.max_records, 3751);
        assert_eq!(config.extract.stable_threshold, 5);
        assert_eq!(config.extract.settle_ms, 300);
        assert_eq!(config.extract.container_timeout_ms, 15_000);
        assert_eq!(config.session.path.to_str(), Some("session.json"));
        assert_eq!(config.output.path.to_str(), Some("products.json"));
        assert_eq!(config.auth.submit, "Sign in");
        assert_eq!(config.auth.email_selector, r#"input[type="email"]"#);
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
name: "Inventory"
params:
  CATALOG_CFG_EMAIL:
    default: "ops@example.com"
browser:
  headless: true
  viewport:
    width: 1440
    height: 900
target:
  url: "https://example.com/challenge"
  login_url: "https://example.com/"
auth:
  email: "${CATALOG_CFG_EMAIL}"
  password: "pw"
  landing: "/dashboard"
session:
  path: "state/session.json"
steps: ["Open", "Inventory"]
extract:
  max_records: 100
  stable_threshold: 3
  settle_ms: 50
output:
  path: "out.json"
on_failure:
  screenshot: "auth.png"
"#;
        let config = Config::parse(yaml).unwrap();
        assert!(config.browser.headless);
        assert_eq!(config.browser.viewport.as_ref().map(|v| v.width), Some(1440));
        assert_eq!(config.login_url(), "https://example.com/");
        assert_eq!(config.auth.email, "ops@example.com");
        assert_eq!(config.auth.landing, "/dashboard");
        // Unset auth fields keep their defaults
        assert_eq!(config.auth.interstitial, "Launch Challenge");
        assert_eq!(config.steps, vec!["Open", "Inventory"]);
        assert_eq!(config.extract.max_records, 100);
        assert_eq!(config.extract.stable_threshold, 3);
        assert_eq!(config.extract.field_timeout_ms, 250);
        assert_eq!(config.output.path.to_str(), Some("out.json"));
        assert_eq!(
            config.on_failure.screenshot.as_ref().and_then(|p| p.to_str()),
            Some("auth.png")
        );
    }

    #[test]
    fn test_params_override_defaults() {
        let yaml = r#"
name: "Inventory"
params:
  CATALOG_CFG_MAX:
    default: "10"
target:
  url: "https://example.com/challenge"
output:
  path: "${CATALOG_CFG_OUT}"
"#;
        let params = Params::new().set("CATALOG_CFG_OUT", "custom.json");
        let config = Config::parse_with_params(yaml, &params).unwrap();
        assert_eq!(config.output.path.to_str(), Some("custom.json"));
    }

    #[test]
    fn test_validation_errors() {
        let no_url = r#"
name: "Inventory"
target:
  url: ""
"#;
        assert!(matches!(Config::parse(no_url), Err(Error::Config(_))));

        let zero_max = r#"
name: "Inventory"
target:
  url: "https://example.com"
extract:
  max_records: 0
"#;
        assert!(matches!(Config::parse(zero_max), Err(Error::Config(_))));

        let zero_threshold = r#"
name: "Inventory"
target:
  url: "https://example.com"
extract:
  stable_threshold: 0
"#;
        assert!(matches!(Config::parse(zero_threshold), Err(Error::Config(_))));

        let blank_step = r#"
name: "Inventory"
target:
  url: "https://example.com"
steps: ["Open", "  "]
"#;
        assert!(matches!(Config::parse(blank_step), Err(Error::Config(_))));
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(Config::parse("name: [unclosed"), Err(Error::Yaml(_))));
    }
}
