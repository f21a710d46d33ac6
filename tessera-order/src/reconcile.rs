use std::collections::HashMap;
use tessera_shared::{License, OrderedLicense};
use tracing::{debug, warn};

use crate::error::{OrderError, OrderResult};

const ENTITLED_SKU_HINT_LIMIT: usize = 10;

/// Matching key for SKUs and company names: trimmed and case-folded
pub(crate) fn match_key(value: &str) -> String {
    value.trim().to_uppercase()
}

/// Join at most `limit` items, appending "..." when some were left out
pub(crate) fn bounded_list<'a>(items: impl ExactSizeIterator<Item = &'a str>, limit: usize) -> String {
    let total = items.len();
    let mut listed: Vec<&str> = items.take(limit).collect();
    if total > limit {
        listed.push("...");
    }
    listed.join(", ")
}

/// All requested lines for one SKU, merged
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkuGroup {
    /// SKU as spelled in the company's entitlement
    pub sku: String,
    /// SKU as first written in the request, trimmed
    pub requested_sku: String,
    pub quantity: i64,
    /// Number of request lines merged into this group
    pub line_count: usize,
    pub entitled: i64,
}

/// A group whose summed quantity exceeds the entitled ceiling
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantityOverage {
    pub sku: String,
    pub requested: i64,
    pub entitled: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Distinct SKUs in order of first appearance in the request
    pub groups: Vec<SkuGroup>,
    pub overages: Vec<QuantityOverage>,
}

struct PendingGroup {
    key: String,
    requested_sku: String,
    quantity: i64,
    line_count: usize,
}

/// Merge duplicate request lines and check them against the entitlements.
///
/// Fails when any requested SKU is not entitled. Quantities above the
/// entitled ceiling are only reported as overages; the provider enforces them.
pub fn reconcile_skus(
    requested: &[OrderedLicense],
    entitlements: &[License],
) -> OrderResult<Reconciliation> {
    let mut entitled: HashMap<String, &License> = HashMap::with_capacity(entitlements.len());
    for license in entitlements {
        entitled.entry(match_key(&license.sku)).or_insert(license);
    }

    let mut pending: Vec<PendingGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for line in requested {
        let key = match_key(&line.sku);
        if key.is_empty() {
            return Err(OrderError::business("Ordered license with a blank SKU"));
        }
        if line.count <= 0 {
            return Err(OrderError::business(format!(
                "Ordered quantity for SKU '{}' must be positive, got {}",
                line.sku.trim(),
                line.count
            )));
        }

        match index.get(&key) {
            Some(&position) => {
                let group = &mut pending[position];
                group.quantity = group.quantity.checked_add(line.count).ok_or_else(|| {
                    OrderError::business(format!(
                        "Ordered quantity for SKU '{}' is too large",
                        group.requested_sku
                    ))
                })?;
                group.line_count += 1;
            }
            None => {
                index.insert(key.clone(), pending.len());
                pending.push(PendingGroup {
                    key,
                    requested_sku: line.sku.trim().to_string(),
                    quantity: line.count,
                    line_count: 1,
                });
            }
        }
    }

    let missing: Vec<&str> = pending
        .iter()
        .filter(|group| !entitled.contains_key(&group.key))
        .map(|group| group.requested_sku.as_str())
        .collect();

    if !missing.is_empty() {
        let hint = bounded_list(
            entitlements.iter().map(|license| license.sku.trim()),
            ENTITLED_SKU_HINT_LIMIT,
        );
        return Err(OrderError::business(format!(
            "Company is not licensed for SKUs: {}. Licensed SKUs: {}",
            missing.join(", "),
            hint
        )));
    }

    let mut reconciliation = Reconciliation::default();
    for group in pending {
        // Presence was checked above
        let Some(license) = entitled.get(&group.key) else {
            continue;
        };

        if group.line_count > 1 {
            debug!(
                sku = %group.requested_sku,
                lines = group.line_count,
                quantity = group.quantity,
                "Merged duplicate order lines"
            );
        }

        if group.quantity > license.count {
            warn!(
                sku = %license.sku.trim(),
                requested = group.quantity,
                entitled = license.count,
                "Requested quantity exceeds entitlement, leaving enforcement to the provider"
            );
            reconciliation.overages.push(QuantityOverage {
                sku: license.sku.trim().to_string(),
                requested: group.quantity,
                entitled: license.count,
            });
        }

        reconciliation.groups.push(SkuGroup {
            sku: license.sku.trim().to_string(),
            requested_sku: group.requested_sku,
            quantity: group.quantity,
            line_count: group.line_count,
            entitled: license.count,
        });
    }

    Ok(reconciliation)
}
