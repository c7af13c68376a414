//! Clicking optional navigation controls by their visible label.

use tracing::{debug, info, warn};

use crate::driver::{Locator, PageDriver};
use crate::locate::{self, Resolution};

/// Default wait per strategy when looking for a control.
pub const DEFAULT_STEP_TIMEOUT_MS: u64 = 8_000;

/// Ways of finding a control labelled `label`, most specific first.
pub fn step_strategies(label: &str) -> Vec<Locator> {
    vec![
        Locator::role("button", label),
        Locator::text(label),
        Locator::css_has_text("button", label),
    ]
}

/// Find the control labelled `label` and click it.
///
/// Returns `false` when the control never appeared or the click failed.
/// Never errors: a missing step (e.g. onboarding shown only on first visit)
/// is expected.
pub async fn perform_step<D: PageDriver>(driver: &D, label: &str, timeout_ms: u64) -> bool {
    info!("Looking for '{}'", label);
    let resolution = locate::resolve(driver, None, &step_strategies(label), timeout_ms).await;
    let Resolution::Found { element, strategy } = resolution else {
        warn!("Step '{}' not found, skipping", label);
        return false;
    };
    match driver.click(&element).await {
        Ok(()) => {
            info!("Clicked '{}'", label);
            debug!("'{}' matched strategy {}", label, strategy);
            true
        }
        Err(e) => {
            warn!("Click on '{}' failed: {}", label, e);
            false
        }
    }
}

/// Perform each step in order, settling after every successful click.
/// Returns how many steps were clicked.
pub async fn run_steps<D: PageDriver>(
    driver: &D,
    labels: &[String],
    timeout_ms: u64,
    settle_ms: u64,
) -> usize {
    let mut clicked = 0;
    for label in labels {
        if perform_step(driver, label, timeout_ms).await {
            clicked += 1;
            driver.settle(settle_ms).await;
        }
    }
    clicked
}
