use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::{IntoResponse, Response},
    routing::post,
    Extension, Json, Router,
};
use tessera_shared::OrderRequest;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::AppError;
use crate::middleware::CorrelationId;
use crate::state::AppState;

const MAX_COUNTRY_LEN: usize = 64;
const MAX_COMPANY_NAME_LEN: usize = 256;
const MAX_SKU_LEN: usize = 64;
const MAX_ORDER_LINES: usize = 500;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/orders", post(create_order))
}

// ============================================================================
// Validation
// ============================================================================

/// Check the shape of an order, collecting every problem
pub fn validate_order_request(req: &OrderRequest) -> Result<(), Vec<String>> {
    let mut problems = Vec::new();

    let country = req.country.trim();
    if country.is_empty() {
        problems.push("country is required".to_string());
    } else if country.chars().count() > MAX_COUNTRY_LEN {
        problems.push(format!("country must be at most {} characters", MAX_COUNTRY_LEN));
    }

    let company_name = req.company_name.trim();
    if company_name.is_empty() {
        problems.push("companyName is required".to_string());
    } else if company_name.chars().count() > MAX_COMPANY_NAME_LEN {
        problems.push(format!(
            "companyName must be at most {} characters",
            MAX_COMPANY_NAME_LEN
        ));
    }

    if req.ordered_licenses.is_empty() {
        problems.push("orderedLicenses must contain at least one line".to_string());
    } else if req.ordered_licenses.len() > MAX_ORDER_LINES {
        problems.push(format!(
            "orderedLicenses must contain at most {} lines",
            MAX_ORDER_LINES
        ));
    }

    for (i, line) in req.ordered_licenses.iter().enumerate() {
        let sku = line.sku.trim();
        if sku.is_empty() {
            problems.push(format!("orderedLicenses[{}].sku is required", i));
        } else if sku.chars().count() > MAX_SKU_LEN {
            problems.push(format!(
                "orderedLicenses[{}].sku must be at most {} characters",
                i, MAX_SKU_LEN
            ));
        }
        if line.count <= 0 {
            problems.push(format!("orderedLicenses[{}].count must be positive", i));
        }
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems)
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /v1/orders
/// Price an order against the provider and submit it.
/// Responds with the provider's submission body as-is.
pub async fn create_order(
    State(state): State<AppState>,
    Extension(correlation_id): Extension<CorrelationId>,
    payload: Result<Json<OrderRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(req) = payload?;
    validate_order_request(&req).map_err(AppError::ValidationError)?;

    info!(correlation_id = %correlation_id.0, "Order accepted for processing");

    // Cancelled on client disconnect (handler dropped) or when the deadline fires
    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();

    let timeout = state.order_timeout;
    let order = state.orchestrator.process_order(&req, &cancel);
    tokio::pin!(order);

    let within_deadline = tokio::time::timeout(timeout, &mut order).await;
    let result = match within_deadline {
        Ok(result) => result,
        Err(_) => {
            warn!(?timeout, "Order deadline reached, cancelling provider calls");
            cancel.cancel();
            // Unwinds promptly with a cancellation error
            order.await
        }
    };

    let submitted = result?;
    Ok((
        [(header::CONTENT_TYPE, "application/json")],
        submitted.into_body(),
    )
        .into_response())
}
