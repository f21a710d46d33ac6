use std::future::Future;
use std::sync::Arc;
use tessera_core::{GatewayResult, ProviderGateway};
use tessera_shared::{Company, OrderRequest, SubmitResultResponse};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::{OrderError, OrderResult};
use crate::payload::assemble_payload;
use crate::pricing::resolve_prices;
use crate::reconcile::{bounded_list, match_key, reconcile_skus};

const COMPANY_HINT_LIMIT: usize = 5;

/// Run a gateway call, racing it against cancellation.
///
/// Cancellation wins even when the gateway ignores the token.
pub(crate) async fn call_provider<T, F>(
    cancel: &CancellationToken,
    context: impl Into<String>,
    call: F,
) -> OrderResult<T>
where
    F: Future<Output = GatewayResult<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(OrderError::Cancelled),
        result = call => result.map_err(|err| OrderError::provider(context, err)),
    }
}

/// Turns a license order into a priced submission to the provider
pub struct OrderOrchestrator {
    gateway: Arc<dyn ProviderGateway>,
}

impl OrderOrchestrator {
    pub fn new(gateway: Arc<dyn ProviderGateway>) -> Self {
        Self { gateway }
    }

    /// Resolve, reconcile, price and submit an order.
    ///
    /// Each phase ends the order on failure; nothing is retried here.
    /// Returns the provider's submission body verbatim.
    pub async fn process_order(
        &self,
        request: &OrderRequest,
        cancel: &CancellationToken,
    ) -> OrderResult<SubmitResultResponse> {
        // 1. Input guard
        let country = request.country.trim();
        let company_name = request.company_name.trim();
        if country.is_empty() || company_name.is_empty() {
            return Err(OrderError::business("Country and company name are required"));
        }

        info!(
            country,
            company = company_name,
            lines = request.ordered_licenses.len(),
            "Processing license order"
        );

        // 2. Company resolution
        let company = self.resolve_company(country, company_name, cancel).await?;

        // 3. Entitlement lookup
        let details = call_provider(
            cancel,
            format!("company details lookup for '{}'", company.company_id),
            self.gateway.get_company_details(&company.company_id, cancel),
        )
        .await?;

        if details.licenses.is_empty() {
            return Err(OrderError::business(format!(
                "Company '{}' has no licensed SKUs",
                company.company_name.trim()
            )));
        }

        // 4. SKU reconciliation
        let reconciliation = reconcile_skus(&request.ordered_licenses, &details.licenses)?;
        if !reconciliation.overages.is_empty() {
            warn!(
                company = %company.company_id,
                overages = reconciliation.overages.len(),
                "Order exceeds entitled quantities"
            );
        }

        // 5. Price resolution
        let lines = resolve_prices(self.gateway.as_ref(), &reconciliation.groups, cancel).await?;

        // 6. Payload assembly
        let payload = assemble_payload(&company, &details, lines)?;

        // 7. Submission
        let response = call_provider(
            cancel,
            "result submission",
            self.gateway.submit_result(&payload, cancel),
        )
        .await?;

        if !response.is_success() {
            return Err(OrderError::SubmissionRejected {
                status: response.status,
                body: response.body,
            });
        }

        info!(
            company = %payload.company_id,
            lines = payload.ordered_license.len(),
            status = response.status,
            "License order submitted"
        );

        Ok(SubmitResultResponse::new(response.body))
    }

    async fn resolve_company(
        &self,
        country: &str,
        company_name: &str,
        cancel: &CancellationToken,
    ) -> OrderResult<Company> {
        let companies = call_provider(
            cancel,
            format!("company list lookup for '{}'", country),
            self.gateway.list_companies(country, cancel),
        )
        .await?;

        if companies.is_empty() {
            return Err(OrderError::business(format!(
                "No companies found for country '{}'",
                country
            )));
        }

        let wanted = match_key(company_name);
        if let Some(company) = companies
            .iter()
            .find(|company| match_key(&company.company_name) == wanted)
        {
            return Ok(company.clone());
        }

        let available = bounded_list(
            companies.iter().map(|company| company.company_name.trim()),
            COMPANY_HINT_LIMIT,
        );
        Err(OrderError::business(format!(
            "Company '{}' not found in '{}'. Available companies: {}",
            company_name, country, available
        )))
    }
}
