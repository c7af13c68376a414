//! Scroll-extraction engine.
//!
//! Drives a lazily-loaded grid: locate the container, scan every rendered
//! item, scroll to mount more, and stop at the record cap or once the
//! content height has stopped growing for `stable_threshold` consecutive
//! scrolls.
//!
//! Every pass re-scans the whole rendered set, not just new nodes, because
//! lazy grids may re-mount or reorder earlier items. Deduplication by
//! identifier keeps repeated scans idempotent.

use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::config::ExtractConfig;
use crate::driver::{ElementRef, Locator, PageDriver};
use crate::fields::{self, Record};
use crate::locate;
use crate::{Error, Result};

/// Tunables for one extraction run.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub max_records: usize,
    pub stable_threshold: u32,
    pub settle_ms: u64,
    pub container_timeout_ms: u64,
    pub field_timeout_ms: u64,
    pub network_idle_ms: u64,
    pub network_idle_timeout_ms: u64,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self::from(&ExtractConfig::default())
    }
}

impl From<&ExtractConfig> for ExtractOptions {
    fn from(c: &ExtractConfig) -> Self {
        Self {
            max_records: c.max_records,
            stable_threshold: c.stable_threshold,
            settle_ms: c.settle_ms,
            container_timeout_ms: c.container_timeout_ms,
            field_timeout_ms: c.field_timeout_ms,
            network_idle_ms: c.network_idle_ms,
            network_idle_timeout_ms: c.network_idle_timeout_ms,
        }
    }
}

/// Grid container candidates: the exact responsive grid, any grid with a
/// gap, then any div whose children carry headings.
pub fn container_strategies() -> Vec<Locator> {
    vec![
        Locator::css(".grid.grid-cols-2.md\\:grid-cols-3.lg\\:grid-cols-4.gap-4"),
        Locator::css("[class*='grid'][class*='gap']"),
        Locator::css("div:has(> div:has(h3))"),
    ]
}

/// Why extraction stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `max_records` unique records were collected.
    TargetReached,
    /// Content height stopped growing.
    EndOfContent,
}

/// Result of a completed extraction.
#[derive(Debug)]
pub struct ExtractOutcome {
    /// Unique records in discovery order.
    pub records: Vec<Record>,
    /// Total scroll commands issued.
    pub scrolls: u32,
    /// Scrolls after which the content height grew.
    pub loading_scrolls: u32,
    pub stop_reason: StopReason,
}

/// Mutable state owned by one extraction run.
#[derive(Debug, Default)]
pub struct ExtractionState {
    collected: Vec<Record>,
    seen: HashSet<String>,
    last_scroll_height: f64,
    stable_scroll_count: u32,
}

impl ExtractionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `record` if its identifier is non-empty and unseen.
    pub fn admit(&mut self, record: Record) -> bool {
        if record.identifier.is_empty() || self.seen.contains(&record.identifier) {
            return false;
        }
        self.seen.insert(record.identifier.clone());
        self.collected.push(record);
        true
    }

    pub fn len(&self) -> usize {
        self.collected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collected.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.collected
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.seen.contains(identifier)
    }

    pub fn stable_scroll_count(&self) -> u32 {
        self.stable_scroll_count
    }

    /// Record the height measured after a scroll. Returns whether it grew.
    pub fn observe_height(&mut self, height: f64) -> bool {
        let grew = height != self.last_scroll_height;
        if grew {
            self.stable_scroll_count = 0;
        } else {
            self.stable_scroll_count += 1;
        }
        self.last_scroll_height = height;
        grew
    }

    pub fn into_records(self) -> Vec<Record> {
        self.collected
    }
}

enum Phase {
    LocatingContainer,
    Extracting(ElementRef),
    Scrolling(ElementRef),
    Done(StopReason),
}

/// Runs the locate → extract → scroll loop against one page.
pub struct ScrollExtractor<'a, D> {
    driver: &'a D,
    options: ExtractOptions,
}

impl<'a, D: PageDriver> ScrollExtractor<'a, D> {
    pub fn new(driver: &'a D, options: ExtractOptions) -> Self {
        Self { driver, options }
    }

    /// Extract until the record cap or end of content.
    ///
    /// Fails only if the container never becomes visible or the page stops
    /// answering scroll commands.
    pub async fn run(&self) -> Result<ExtractOutcome> {
        let mut state = ExtractionState::new();
        let mut scrolls = 0;
        let mut loading_scrolls = 0;
        let mut phase = Phase::LocatingContainer;

        let stop_reason = loop {
            phase = match phase {
                Phase::LocatingContainer => {
                    let container = self.locate_container().await?;
                    self.wait_for_idle().await;
                    state.last_scroll_height = self.driver.scroll_height().await?;
                    info!("Beginning extraction");
                    Phase::Extracting(container)
                }
                Phase::Extracting(container) => {
                    self.extract_batch(&container, &mut state).await;
                    Phase::Scrolling(container)
                }
                Phase::Scrolling(container) => {
                    if state.len() >= self.options.max_records {
                        Phase::Done(StopReason::TargetReached)
                    } else {
                        self.driver.scroll_to_bottom().await?;
                        scrolls += 1;
                        self.driver.settle(self.options.settle_ms).await;
                        let height = self.driver.scroll_height().await?;
                        if state.observe_height(height) {
                            loading_scrolls += 1;
                            Phase::Extracting(container)
                        } else if state.stable_scroll_count >= self.options.stable_threshold {
                            info!(
                                "End of content: height unchanged after {} scrolls",
                                state.stable_scroll_count
                            );
                            Phase::Done(StopReason::EndOfContent)
                        } else {
                            Phase::Extracting(container)
                        }
                    }
                }
                Phase::Done(reason) => break reason,
            };
        };

        info!(
            "Extraction complete: {} records ({} scrolls, {:?})",
            state.len(),
            scrolls,
            stop_reason
        );
        Ok(ExtractOutcome {
            records: state.into_records(),
            scrolls,
            loading_scrolls,
            stop_reason,
        })
    }

    /// Pick the first container strategy that matches anything, falling back
    /// to the page body, then wait for it to be visible.
    async fn locate_container(&self) -> Result<ElementRef> {
        info!("Locating catalog grid");
        let strategies = container_strategies();
        let locator = match locate::first_present(self.driver, None, &strategies).await {
            Some(i) => {
                info!("Found catalog grid with {}", strategies[i]);
                strategies[i].clone()
            }
            None => {
                warn!("Could not locate catalog grid, using page body");
                Locator::css("body")
            }
        };

        let timeout_ms = self.options.container_timeout_ms;
        self.driver
            .wait_visible(None, &locator, timeout_ms)
            .await
            .map_err(|e| Error::ContainerNotVisible {
                container: locator.to_string(),
                timeout_ms,
                reason: e.to_string(),
            })
    }

    async fn wait_for_idle(&self) {
        if let Err(e) = self
            .driver
            .wait_for_network_idle(
                self.options.network_idle_ms,
                self.options.network_idle_timeout_ms,
            )
            .await
        {
            debug!("network not idle, continuing: {}", e);
        }
    }

    /// Scan every currently rendered item. Faults skip the item.
    async fn extract_batch(&self, container: &ElementRef, state: &mut ExtractionState) {
        let items = match self.driver.children(container).await {
            Ok(items) => items,
            Err(e) => {
                warn!("Could not enumerate items in {}: {}", container, e);
                return;
            }
        };
        debug!("Processing batch of {} rendered items", items.len());

        let max = self.options.max_records;
        for item in &items {
            if state.len() >= max {
                break;
            }
            let record =
                match fields::extract_fields(self.driver, item, self.options.field_timeout_ms)
                    .await
                {
                    Ok(record) => record,
                    Err(e) => {
                        debug!("Skipping {}: {}", item, e);
                        continue;
                    }
                };
            if state.admit(record) {
                if let Some(r) = state.records().last() {
                    debug!(
                        "Collected {} / {}: {} | {}",
                        state.len(),
                        max,
                        r.identifier,
                        r.name
                    );
                }
            }
        }
    }
}
