//! The page seam: everything the extraction core needs from a browser.
//!
//! [`PageDriver`] is implemented by [`EokaDriver`] for a live `eoka::Page`
//! and by in-memory mocks in tests.

mod live;

pub use live::EokaDriver;

use serde::Serialize;
use std::fmt;
use std::path::Path;

use crate::Result;

/// One way of finding an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Locator {
    /// ARIA role (explicit or implicit) whose accessible name contains `name`.
    Role { role: String, name: String },
    /// Smallest element whose visible text contains the value, case-insensitive.
    Text { text: String },
    /// Smallest element whose visible text matches a JS regular expression.
    Pattern { pattern: String },
    /// Plain CSS selector.
    Css { selector: String },
    /// CSS match whose text contains `text`, case-insensitive.
    CssHasText { selector: String, text: String },
}

impl Locator {
    pub fn role(role: impl Into<String>, name: impl Into<String>) -> Self {
        Locator::Role {
            role: role.into(),
            name: name.into(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Locator::Text { text: text.into() }
    }

    pub fn pattern(pattern: impl Into<String>) -> Self {
        Locator::Pattern {
            pattern: pattern.into(),
        }
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css {
            selector: selector.into(),
        }
    }

    pub fn css_has_text(selector: impl Into<String>, text: impl Into<String>) -> Self {
        Locator::CssHasText {
            selector: selector.into(),
            text: text.into(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Role { role, name } => write!(f, "role:{} '{}'", role, name),
            Locator::Text { text } => write!(f, "text '{}'", text),
            Locator::Pattern { pattern } => write!(f, "text /{}/", pattern),
            Locator::Css { selector } => write!(f, "css '{}'", selector),
            Locator::CssHasText { selector, text } => {
                write!(f, "css '{}' has text '{}'", selector, text)
            }
        }
    }
}

/// Handle to an element located on the page.
///
/// For the eoka backend this is a unique CSS path computed in the page, so
/// it goes stale if the node is re-mounted.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef(String);

impl ElementRef {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Browser operations consumed by the extraction core.
///
/// Every wait is bounded by an explicit timeout; a miss surfaces as an error
/// which callers in [`crate::locate`] translate into "try next".
#[allow(async_fn_in_trait)]
pub trait PageDriver {
    /// First visible match of `locator` inside `scope` (or the whole page),
    /// polling until `timeout_ms` elapses.
    async fn wait_visible(
        &self,
        scope: Option<&ElementRef>,
        locator: &Locator,
        timeout_ms: u64,
    ) -> Result<ElementRef>;

    /// All current matches in document order. Does not wait.
    async fn query_all(&self, scope: Option<&ElementRef>, locator: &Locator)
        -> Result<Vec<ElementRef>>;

    /// Number of current matches.
    async fn count(&self, scope: Option<&ElementRef>, locator: &Locator) -> Result<usize> {
        Ok(self.query_all(scope, locator).await?.len())
    }

    /// Direct `div` children of a container, in index order.
    async fn children(&self, container: &ElementRef) -> Result<Vec<ElementRef>>;

    async fn inner_text(&self, element: &ElementRef) -> Result<String>;

    async fn click(&self, element: &ElementRef) -> Result<()>;

    async fn fill(&self, selector: &str, value: &str) -> Result<()>;

    async fn goto(&self, url: &str) -> Result<()>;

    async fn url(&self) -> Result<String>;

    async fn wait_for_network_idle(&self, idle_ms: u64, timeout_ms: u64) -> Result<()>;

    async fn wait_for_url_contains(&self, pattern: &str, timeout_ms: u64) -> Result<()>;

    /// Current content height of the document.
    async fn scroll_height(&self) -> Result<f64>;

    /// Scroll forward by the current content height.
    async fn scroll_to_bottom(&self) -> Result<()>;

    /// Yield for `ms` while the page renders.
    async fn settle(&self, ms: u64);

    async fn screenshot(&self, path: &Path) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locator_display() {
        assert_eq!(
            Locator::role("button", "Sign in").to_string(),
            "role:button 'Sign in'"
        );
        assert_eq!(Locator::text("ID:").to_string(), "text 'ID:'");
        assert_eq!(Locator::pattern("ID:").to_string(), "text /ID:/");
        assert_eq!(Locator::css("h3").to_string(), "css 'h3'");
        assert_eq!(
            Locator::css_has_text("div", "Weight").to_string(),
            "css 'div' has text 'Weight'"
        );
    }

    #[test]
    fn locator_serializes_for_page_script() {
        let json = serde_json::to_value(Locator::css_has_text("button", "Go")).unwrap();
        assert_eq!(json["kind"], "css_has_text");
        assert_eq!(json["selector"], "button");
        assert_eq!(json["text"], "Go");

        let json = serde_json::to_value(Locator::role("button", "Go")).unwrap();
        assert_eq!(json["kind"], "role");
        assert_eq!(json["name"], "Go");
    }
}
