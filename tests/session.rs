//! Sign-in flow against an in-memory login page.

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

use eoka_catalog::session::authenticate;
use eoka_catalog::{AuthConfig, ElementRef, Error, Locator, PageDriver, Result};

/// A login page whose landing redirect arrives on the n-th wait, if ever.
struct LoginPage {
    url: String,
    /// Labels of the controls rendered on the page.
    buttons: Vec<&'static str>,
    /// 1-based landing wait that succeeds.
    lands_on: Option<usize>,
    landing_waits: Cell<usize>,
    visits: RefCell<Vec<String>>,
    fills: RefCell<Vec<(String, String)>>,
    clicks: RefCell<Vec<String>>,
    screenshots: RefCell<Vec<PathBuf>>,
}

impl LoginPage {
    fn new(url: &str, buttons: Vec<&'static str>, lands_on: Option<usize>) -> Self {
        Self {
            url: url.to_string(),
            buttons,
            lands_on,
            landing_waits: Cell::new(0),
            visits: RefCell::new(Vec::new()),
            fills: RefCell::new(Vec::new()),
            clicks: RefCell::new(Vec::new()),
            screenshots: RefCell::new(Vec::new()),
        }
    }

    fn has_button(&self, label: &str) -> bool {
        self.buttons.iter().any(|b| *b == label)
    }
}

impl PageDriver for LoginPage {
    async fn wait_visible(
        &self,
        _scope: Option<&ElementRef>,
        locator: &Locator,
        _timeout_ms: u64,
    ) -> Result<ElementRef> {
        match locator {
            Locator::Role { role, name } if role == "button" && self.has_button(name) => {
                Ok(ElementRef::new(format!("button:{}", name)))
            }
            _ => Err(Error::ElementNotFound(locator.to_string())),
        }
    }

    async fn query_all(
        &self,
        _scope: Option<&ElementRef>,
        locator: &Locator,
    ) -> Result<Vec<ElementRef>> {
        Ok(match locator {
            Locator::Text { text } if self.has_button(text) => {
                vec![ElementRef::new(format!("button:{}", text))]
            }
            _ => Vec::new(),
        })
    }

    async fn children(&self, _container: &ElementRef) -> Result<Vec<ElementRef>> {
        Ok(Vec::new())
    }

    async fn inner_text(&self, element: &ElementRef) -> Result<String> {
        Err(Error::ElementNotFound(element.to_string()))
    }

    async fn click(&self, element: &ElementRef) -> Result<()> {
        self.clicks.borrow_mut().push(element.to_string());
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        self.fills
            .borrow_mut()
            .push((selector.to_string(), value.to_string()));
        Ok(())
    }

    async fn goto(&self, url: &str) -> Result<()> {
        self.visits.borrow_mut().push(url.to_string());
        Ok(())
    }

    async fn url(&self) -> Result<String> {
        Ok(self.url.clone())
    }

    async fn wait_for_network_idle(&self, _idle_ms: u64, _timeout_ms: u64) -> Result<()> {
        Ok(())
    }

    async fn wait_for_url_contains(&self, pattern: &str, _timeout_ms: u64) -> Result<()> {
        let n = self.landing_waits.get() + 1;
        self.landing_waits.set(n);
        if self.lands_on == Some(n) {
            Ok(())
        } else {
            Err(Error::Timeout(format!("url never contained '{}'", pattern)))
        }
    }

    async fn scroll_height(&self) -> Result<f64> {
        Ok(0.0)
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        Ok(())
    }

    async fn settle(&self, _ms: u64) {}

    async fn screenshot(&self, path: &Path) -> Result<()> {
        self.screenshots.borrow_mut().push(path.to_path_buf());
        Ok(())
    }
}

fn credentials() -> AuthConfig {
    AuthConfig {
        email: "ops@example.com".into(),
        password: "hunter2".into(),
        ..Default::default()
    }
}

const LOGIN: &str = "https://app.example.com/";

#[tokio::test]
async fn landing_reached_without_screenshot() {
    let page = LoginPage::new(LOGIN, vec!["Sign in"], Some(1));
    let shot = Path::new("login_error.png");

    authenticate(&page, LOGIN, &credentials(), 0, Some(shot))
        .await
        .expect("sign-in");

    assert_eq!(*page.visits.borrow(), vec![LOGIN.to_string()]);
    assert_eq!(
        *page.fills.borrow(),
        vec![
            (r#"input[type="email"]"#.to_string(), "ops@example.com".to_string()),
            (r#"input[type="password"]"#.to_string(), "hunter2".to_string()),
        ]
    );
    assert_eq!(*page.clicks.borrow(), vec!["button:Sign in".to_string()]);
    assert_eq!(page.landing_waits.get(), 1);
    assert!(page.screenshots.borrow().is_empty());
}

#[tokio::test]
async fn interstitial_is_passed_after_missed_landing() {
    let page = LoginPage::new(
        "https://app.example.com/instructions",
        vec!["Sign in", "Launch Challenge"],
        Some(2),
    );

    authenticate(&page, LOGIN, &credentials(), 0, Some(Path::new("login_error.png")))
        .await
        .expect("sign-in");

    assert_eq!(
        *page.clicks.borrow(),
        vec![
            "button:Sign in".to_string(),
            "button:Launch Challenge".to_string()
        ]
    );
    assert_eq!(page.landing_waits.get(), 2);
    assert!(page.screenshots.borrow().is_empty());
}

#[tokio::test]
async fn interstitial_detected_by_its_control() {
    let page = LoginPage::new(LOGIN, vec!["Sign in", "Launch Challenge"], Some(2));

    authenticate(&page, LOGIN, &credentials(), 0, None)
        .await
        .expect("sign-in");

    assert_eq!(page.clicks.borrow().len(), 2);
    assert_eq!(page.landing_waits.get(), 2);
}

#[tokio::test]
async fn failed_recovery_screenshots_and_continues() {
    let page = LoginPage::new("https://app.example.com/login?error=1", vec!["Sign in"], None);
    let shot = Path::new("artifacts/login_error.png");

    let result = authenticate(&page, LOGIN, &credentials(), 0, Some(shot)).await;

    assert!(result.is_ok(), "{:?}", result);
    assert_eq!(page.landing_waits.get(), 1);
    assert_eq!(*page.screenshots.borrow(), vec![shot.to_path_buf()]);
}

#[tokio::test]
async fn interstitial_that_never_lands_screenshots() {
    let page = LoginPage::new(
        "https://app.example.com/instructions",
        vec!["Sign in", "Launch Challenge"],
        None,
    );
    let shot = Path::new("login_error.png");

    authenticate(&page, LOGIN, &credentials(), 0, Some(shot))
        .await
        .expect("sign-in carries on");

    assert_eq!(page.landing_waits.get(), 2);
    assert_eq!(*page.screenshots.borrow(), vec![shot.to_path_buf()]);
}

#[tokio::test]
async fn missing_credentials_are_a_config_error() {
    for (email, password) in [("", "hunter2"), ("ops@example.com", "")] {
        let page = LoginPage::new(LOGIN, vec!["Sign in"], Some(1));
        let auth = AuthConfig {
            email: email.into(),
            password: password.into(),
            ..Default::default()
        };

        let result = authenticate(&page, LOGIN, &auth, 0, None).await;

        assert!(matches!(result, Err(Error::Config(_))), "{:?}", result);
        assert!(page.visits.borrow().is_empty());
    }
}
