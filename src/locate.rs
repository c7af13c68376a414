//! Fallback locator resolution.
//!
//! A target is described by an ordered list of [`Locator`]s, most preferred
//! first. Resolution tries them in order and stops at the first success; a
//! miss on one strategy only means "try the next one". Exhausting the list is
//! a normal outcome ([`Resolution::NotFound`]), never an error.

use tracing::debug;

use crate::driver::{ElementRef, Locator, PageDriver};

/// Outcome of resolving a strategy list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// `strategy` is the index of the locator that matched.
    Found { element: ElementRef, strategy: usize },
    NotFound,
}

/// Return the first strategy whose element becomes visible within `timeout_ms`.
pub async fn resolve<D: PageDriver>(
    driver: &D,
    scope: Option<&ElementRef>,
    strategies: &[Locator],
    timeout_ms: u64,
) -> Resolution {
    for (strategy, locator) in strategies.iter().enumerate() {
        match driver.wait_visible(scope, locator, timeout_ms).await {
            Ok(element) => {
                debug!("resolved {} -> {}", locator, element);
                return Resolution::Found { element, strategy };
            }
            Err(e) => debug!("{} missed: {}", locator, e),
        }
    }
    Resolution::NotFound
}

/// Like [`resolve`], but a strategy only succeeds if its element's trimmed
/// text passes `accept`. Text is never combined across strategies.
pub async fn resolve_text<D, F>(
    driver: &D,
    scope: Option<&ElementRef>,
    strategies: &[Locator],
    timeout_ms: u64,
    mut accept: F,
) -> Option<String>
where
    D: PageDriver,
    F: FnMut(&str) -> Option<String>,
{
    for locator in strategies {
        let element = match driver.wait_visible(scope, locator, timeout_ms).await {
            Ok(element) => element,
            Err(e) => {
                debug!("{} missed: {}", locator, e);
                continue;
            }
        };
        match driver.inner_text(&element).await {
            Ok(text) => {
                if let Some(value) = accept(text.trim()) {
                    return Some(value);
                }
            }
            Err(e) => debug!("{} unreadable: {}", locator, e),
        }
    }
    None
}

/// First strategy with a non-zero match count, without waiting for
/// visibility. Returns the strategy index.
pub async fn first_present<D: PageDriver>(
    driver: &D,
    scope: Option<&ElementRef>,
    strategies: &[Locator],
) -> Option<usize> {
    for (i, locator) in strategies.iter().enumerate() {
        match driver.count(scope, locator).await {
            Ok(n) if n > 0 => return Some(i),
            Ok(_) => debug!("{} matched nothing", locator),
            Err(e) => debug!("{} failed: {}", locator, e),
        }
    }
    None
}
