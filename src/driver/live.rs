//! `PageDriver` over a live eoka page. Locators are resolved by JS injection
//! and returned as unique CSS paths.

use eoka::Page;
use serde::Deserialize;
use std::path::Path;
use tokio::time::{Duration, Instant};

use super::{ElementRef, Locator, PageDriver};
use crate::{Error, Result};

/// Interval between visibility polls.
const POLL_MS: u64 = 100;

#[derive(Debug, Deserialize)]
struct Match {
    selector: String,
    visible: bool,
}

/// Resolve a locator under an optional scope. Returns `null` if the scope
/// itself is gone (re-mounted since it was located).
const LOCATE_JS: &str = r#"
((scope, loc) => {
    const root = scope === null ? document : document.querySelector(scope);
    if (!root) return null;
    const lc = s => (s || '').toLowerCase().replace(/\s+/g, ' ').trim();

    function path(el) {
        const parts = [];
        let n = el;
        while (n && n.nodeType === 1) {
            let s = n.tagName.toLowerCase();
            if (n.id) { parts.unshift('#' + CSS.escape(n.id)); break; }
            const p = n.parentElement;
            if (p) {
                const sibs = [...p.children].filter(c => c.tagName === n.tagName);
                if (sibs.length > 1) s += ':nth-of-type(' + (sibs.indexOf(n) + 1) + ')';
            }
            parts.unshift(s);
            n = p;
        }
        return parts.join(' > ');
    }

    function visible(el) {
        const r = el.getBoundingClientRect();
        const s = getComputedStyle(el);
        return r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none';
    }

    const text = el => el.innerText || el.textContent || '';
    const all = sel => [...root.querySelectorAll(sel)];

    let found = [];
    switch (loc.kind) {
        case 'css':
            found = all(loc.selector);
            break;
        case 'css_has_text': {
            const want = lc(loc.text);
            found = all(loc.selector).filter(e => lc(text(e)).includes(want));
            break;
        }
        case 'text': {
            const want = lc(loc.text);
            const hit = e => lc(text(e)).includes(want);
            found = all('*').filter(e => hit(e) && ![...e.children].some(hit));
            break;
        }
        case 'pattern': {
            const re = new RegExp(loc.pattern);
            const hit = e => re.test(text(e));
            found = all('*').filter(e => hit(e) && ![...e.children].some(hit));
            break;
        }
        case 'role': {
            const implicit = {
                button: 'button, input[type="button"], input[type="submit"]',
                link: 'a[href]',
                textbox: 'input:not([type]), input[type="text"], input[type="email"], textarea',
            }[loc.role];
            const sel = '[role="' + loc.role + '"]' + (implicit ? ', ' + implicit : '');
            const want = lc(loc.name);
            found = all(sel).filter(e =>
                lc(e.getAttribute('aria-label') || text(e) || e.value || e.title).includes(want));
            break;
        }
    }
    return found.map(e => ({ selector: path(e), visible: visible(e) }));
})
"#;

/// `PageDriver` backed by an `eoka::Page`.
pub struct EokaDriver<'a> {
    page: &'a Page,
}

impl<'a> EokaDriver<'a> {
    pub fn new(page: &'a Page) -> Self {
        Self { page }
    }

    /// The underlying page, for session capture and restore.
    pub fn page(&self) -> &'a Page {
        self.page
    }

    async fn locate(&self, scope: Option<&ElementRef>, locator: &Locator) -> Result<Vec<Match>> {
        let js = format!(
            "{}({},{})",
            LOCATE_JS,
            serde_json::to_string(&scope.map(ElementRef::as_str))?,
            serde_json::to_string(locator)?
        );
        let matches: Option<Vec<Match>> = self.page.evaluate(&js).await?;
        matches.ok_or_else(|| {
            Error::ElementNotFound(format!(
                "scope '{}' detached",
                scope.map(ElementRef::as_str).unwrap_or("document")
            ))
        })
    }
}

impl PageDriver for EokaDriver<'_> {
    async fn wait_visible(
        &self,
        scope: Option<&ElementRef>,
        locator: &Locator,
        timeout_ms: u64,
    ) -> Result<ElementRef> {
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            let matches = self.locate(scope, locator).await?;
            if let Some(m) = matches.into_iter().find(|m| m.visible) {
                return Ok(ElementRef::new(m.selector));
            }
            if Instant::now() >= deadline {
                return Err(Error::Timeout(format!(
                    "{} not visible after {}ms",
                    locator, timeout_ms
                )));
            }
            self.page.wait(POLL_MS).await;
        }
    }

    async fn query_all(
        &self,
        scope: Option<&ElementRef>,
        locator: &Locator,
    ) -> Result<Vec<ElementRef>> {
        Ok(self
            .locate(scope, locator)
            .await?
            .into_iter()
            .map(|m| ElementRef::new(m.selector))
            .collect())
    }

    async fn children(&self, container: &ElementRef) -> Result<Vec<ElementRef>> {
        self.query_all(Some(container), &Locator::css(":scope > div"))
            .await
    }

    async fn inner_text(&self, element: &ElementRef) -> Result<String> {
        let js = format!(
            "(() => {{ const el = document.querySelector({}); return el ? el.innerText : null; }})()",
            serde_json::to_string(element.as_str())?
        );
        let text: Option<String> = self.page.evaluate(&js).await?;
        text.ok_or_else(|| Error::ElementNotFound(format!("'{}' detached", element)))
    }

    async fn click(&self, element: &ElementRef) -> Result<()> {
        self.page.click(element.as_str()).await?;
        Ok(())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        self.page.fill(selector, value).await?;
        Ok(())
    }

    async fn goto(&self, url: &str) -> Result<()> {
        self.page.goto(url).await?;
        Ok(())
    }

    async fn url(&self) -> Result<String> {
        Ok(self.page.url().await?)
    }

    async fn wait_for_network_idle(&self, idle_ms: u64, timeout_ms: u64) -> Result<()> {
        self.page.wait_for_network_idle(idle_ms, timeout_ms).await?;
        Ok(())
    }

    async fn wait_for_url_contains(&self, pattern: &str, timeout_ms: u64) -> Result<()> {
        self.page.wait_for_url_contains(pattern, timeout_ms).await?;
        Ok(())
    }

    async fn scroll_height(&self) -> Result<f64> {
        Ok(self.page.evaluate("document.body.scrollHeight").await?)
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        self.page
            .execute("window.scrollBy(0, document.body.scrollHeight)")
            .await?;
        Ok(())
    }

    async fn settle(&self, ms: u64) {
        self.page.wait(ms).await;
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        let data = self.page.screenshot().await?;
        std::fs::write(path, data)?;
        Ok(())
    }
}
