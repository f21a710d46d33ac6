use futures_util::future::join_all;
use rust_decimal::Decimal;
use tessera_core::ProviderGateway;
use tessera_shared::OrderedLicenseResult;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{OrderError, OrderResult};
use crate::orchestrator::call_provider;
use crate::reconcile::SkuGroup;

/// Price every group concurrently.
///
/// All fetches run to completion before the outcome is decided; the first
/// failure in request order is reported. Results keep the order of `groups`.
pub async fn resolve_prices(
    gateway: &dyn ProviderGateway,
    groups: &[SkuGroup],
    cancel: &CancellationToken,
) -> OrderResult<Vec<OrderedLicenseResult>> {
    let settled = join_all(groups.iter().map(|group| price_group(gateway, group, cancel))).await;

    if cancel.is_cancelled() {
        return Err(OrderError::Cancelled);
    }

    settled.into_iter().collect()
}

async fn price_group(
    gateway: &dyn ProviderGateway,
    group: &SkuGroup,
    cancel: &CancellationToken,
) -> OrderResult<OrderedLicenseResult> {
    let pricing = call_provider(
        cancel,
        format!("price lookup for SKU '{}'", group.sku),
        gateway.get_price(&group.sku, cancel),
    )
    .await?;

    if pricing.price < Decimal::ZERO {
        warn!(
            sku = %group.sku,
            price = %pricing.price,
            "Provider returned a negative price, keeping it as a credit"
        );
    }

    let sum = pricing
        .price
        .checked_mul(Decimal::from(group.quantity))
        .ok_or_else(|| {
            OrderError::business(format!(
                "Line total for SKU '{}' overflows ({} x {})",
                group.sku, pricing.price, group.quantity
            ))
        })?;

    // Prefer the spelling from the price response
    let sku = match pricing.sku.trim() {
        "" => group.sku.clone(),
        returned => returned.to_string(),
    };

    debug!(sku = %sku, price = %pricing.price, count = group.quantity, sum = %sum, "Priced order line");

    Ok(OrderedLicenseResult {
        sku,
        price: pricing.price,
        count: group.quantity,
        sum,
    })
}
