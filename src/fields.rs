//! Record extraction from a single grid item.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::debug;

use crate::driver::{ElementRef, Locator, PageDriver};
use crate::locate;
use crate::Result;

/// One catalog entry. Only `identifier` is required; the rest may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    #[serde(rename = "id")]
    pub identifier: String,
    pub description: String,
    pub weight: String,
    pub category: String,
}

/// Identifier element: an "ID: X" label, a product-id class, or the
/// monospace id badge.
pub fn identifier_strategies() -> Vec<Locator> {
    vec![
        Locator::pattern("ID:"),
        Locator::css("[class*='product-id']"),
        Locator::css("div.font-mono span.font-medium"),
    ]
}

pub fn name_strategies() -> Vec<Locator> {
    vec![
        Locator::css("h3"),
        Locator::css("[class*='product-name']"),
        Locator::css(".h-12"),
        Locator::css("div.font-bold"),
    ]
}

/// Containers scanned for labelled fields. All of them are scanned and a
/// later match overwrites an earlier one.
pub fn field_strategies() -> Vec<Locator> {
    vec![
        Locator::css_has_text("div", "Description"),
        Locator::css_has_text("div", "Weight"),
        Locator::css_has_text("div", "Category"),
        Locator::css("div.flex.items-center.justify-between"),
    ]
}

/// `"ID: 48X"` -> `"48X"`. Text without a colon is taken as-is.
pub fn parse_identifier(text: &str) -> Option<String> {
    let value = match text.rsplit_once(':') {
        Some((_, after)) => after.trim(),
        None => text.trim(),
    };
    (!value.is_empty()).then(|| value.to_string())
}

fn unit_marker() -> &'static Regex {
    static UNIT: OnceLock<Regex> = OnceLock::new();
    UNIT.get_or_init(|| Regex::new(r"(?i)\(\s*kg\s*\)|kg").expect("valid unit pattern"))
}

/// `"Weight (kg): 2.5kg"` -> `"2.5"`.
pub fn normalize_weight(text: &str) -> String {
    let after_label = text.split_once("Weight").map_or(text, |(_, rest)| rest);
    let value = after_label
        .rsplit_once(':')
        .map_or(after_label, |(_, rest)| rest);
    unit_marker().replace_all(value, "").trim().to_string()
}

/// Assign one container's text to the field it is labelled with.
///
/// Overwrites whatever an earlier container assigned to the same field.
pub fn classify_field(text: &str, record: &mut Record) {
    if let Some((_, rest)) = text.rsplit_once("Description:") {
        record.description = rest.trim().to_string();
    } else if text.contains("Weight") && text.to_lowercase().contains("kg") {
        record.weight = normalize_weight(text);
    } else if let Some((_, rest)) = text.rsplit_once("Category:") {
        record.category = rest.trim().to_string();
    }
}

/// Read every field of `item`.
///
/// Missing fields stay empty. Only a failure to enumerate field containers
/// (e.g. the item was re-mounted mid-read) is returned as an error.
pub async fn extract_fields<D: PageDriver>(
    driver: &D,
    item: &ElementRef,
    timeout_ms: u64,
) -> Result<Record> {
    let mut record = Record::default();

    record.name = locate::resolve_text(driver, Some(item), &name_strategies(), timeout_ms, |t| {
        (!t.is_empty()).then(|| t.to_string())
    })
    .await
    .unwrap_or_default();

    record.identifier = locate::resolve_text(
        driver,
        Some(item),
        &identifier_strategies(),
        timeout_ms,
        parse_identifier,
    )
    .await
    .unwrap_or_default();

    for locator in field_strategies() {
        let containers = driver.query_all(Some(item), &locator).await?;
        for container in &containers {
            match driver.inner_text(container).await {
                Ok(text) => classify_field(text.trim(), &mut record),
                Err(e) => debug!("{} in {}: {}", locator, item, e),
            }
        }
    }

    Ok(record)
}
