use async_trait::async_trait;
use rand::Rng;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tessera_core::{GatewayError, GatewayResult, ProviderGateway, RawResponse};
use tessera_shared::{Company, CompanyDetails, SkuPricing, SubmitResultRequest};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, error};

use crate::app_config::{ProviderConfig, ResiliencyConfig};

// ============================================================================
// Circuit Breaker
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,   // Normal operation
    Open,     // Failure detected, failing fast
    HalfOpen, // Testing if service is back
}

pub struct CircuitBreaker {
    pub name: String,
    state: RwLock<CircuitState>,
    failure_count: AtomicUsize,
    failure_threshold: usize,
    reset_timeout: Duration,
    last_failure: RwLock<Option<Instant>>,
}

impl CircuitBreaker {
    pub fn new(name: &str, threshold: usize, timeout: Duration) -> Self {
        Self {
            name: name.to_string(),
            state: RwLock::new(CircuitState::Closed),
            failure_count: AtomicUsize::new(0),
            failure_threshold: threshold.max(1),
            reset_timeout: timeout,
            last_failure: RwLock::new(None),
        }
    }

    pub async fn state(&self) -> CircuitState {
        *self.state.read().await
    }

    /// Whether a call may go through right now
    pub async fn check(&self) -> bool {
        let state = *self.state.read().await;
        if state == CircuitState::Closed {
            return true;
        }

        if state == CircuitState::Open {
            let last_fail = *self.last_failure.read().await;
            if let Some(instant) = last_fail {
                if instant.elapsed() >= self.reset_timeout {
                    let mut s = self.state.write().await;
                    *s = CircuitState::HalfOpen;
                    info!("Circuit Breaker [{}] moving to Half-Open", self.name);
                    return true;
                }
            }
            return false;
        }

        // Half-Open lets probes through until one of them settles the state
        true
    }

    pub async fn record_success(&self) {
        let mut state = self.state.write().await;
        if *state == CircuitState::HalfOpen {
            *state = CircuitState::Closed;
            info!("Circuit Breaker [{}] recovered to Closed", self.name);
        }
        self.failure_count.store(0, Ordering::SeqCst);
    }

    pub async fn record_failure(&self) {
        let count = self.failure_count.fetch_add(1, Ordering::SeqCst) + 1;
        let mut state = self.state.write().await;

        if count >= self.failure_threshold || *state == CircuitState::HalfOpen {
            *state = CircuitState::Open;
            let mut last = self.last_failure.write().await;
            *last = Some(Instant::now());
            error!("Circuit Breaker [{}] TRIPPED to Open. Failures: {}", self.name, count);
        }
    }
}

// ============================================================================
// Retry policy
// ============================================================================

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(resiliency: &ResiliencyConfig, provider: &ProviderConfig) -> Self {
        Self {
            max_retries: resiliency.max_retries,
            initial_backoff: Duration::from_millis(resiliency.initial_backoff_ms),
            max_backoff: Duration::from_millis(resiliency.max_backoff_ms),
            attempt_timeout: provider.request_timeout(),
        }
    }

    /// Delay before retry number `retry` (1-based): exponential, capped,
    /// with the upper half randomized
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        let capped = self.initial_backoff.saturating_mul(factor).min(self.max_backoff);

        let half = capped / 2;
        let spread_ms = u64::try_from(half.as_millis()).unwrap_or(u64::MAX);
        let jitter = if spread_ms > 0 {
            Duration::from_millis(rand::thread_rng().gen_range(0..=spread_ms))
        } else {
            Duration::ZERO
        };
        half + jitter
    }
}

// ============================================================================
// Resilient gateway
// ============================================================================

/// Adds per-attempt timeouts, retries with backoff and a circuit breaker
/// around another gateway
pub struct ResilientGateway<G> {
    inner: G,
    policy: RetryPolicy,
    breaker: Arc<CircuitBreaker>,
}

impl<G: ProviderGateway> ResilientGateway<G> {
    pub fn new(inner: G, policy: RetryPolicy, breaker: Arc<CircuitBreaker>) -> Self {
        Self { inner, policy, breaker }
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    async fn call<T, F, Fut>(
        &self,
        operation: &'static str,
        cancel: &CancellationToken,
        mut attempt: F,
    ) -> GatewayResult<T>
    where
        T: Send,
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = GatewayResult<T>> + Send,
    {
        let mut retries = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(GatewayError::Cancelled);
            }
            if !self.breaker.check().await {
                return Err(GatewayError::CircuitOpen(self.breaker.name.clone()));
            }

            let outcome = match tokio::time::timeout(self.policy.attempt_timeout, attempt()).await {
                Ok(result) => result,
                Err(_) => Err(GatewayError::Timeout(self.policy.attempt_timeout)),
            };

            match outcome {
                Ok(value) => {
                    self.breaker.record_success().await;
                    return Ok(value);
                }
                // Not the provider's fault
                Err(GatewayError::Cancelled) => return Err(GatewayError::Cancelled),
                Err(err) if err.is_retryable() => {
                    self.breaker.record_failure().await;
                    if retries >= self.policy.max_retries {
                        warn!(operation, attempts = retries + 1, error = %err, "Provider call failed, giving up");
                        return Err(err);
                    }

                    retries += 1;
                    let delay = self.policy.backoff(retries);
                    warn!(operation, retry = retries, ?delay, error = %err, "Provider call failed, retrying");

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(GatewayError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Err(err) => {
                    // The provider answered; it just did not like the request
                    self.breaker.record_success().await;
                    return Err(err);
                }
            }
        }
    }
}

#[async_trait]
impl<G: ProviderGateway> ProviderGateway for ResilientGateway<G> {
    async fn list_companies(
        &self,
        country: &str,
        cancel: &CancellationToken,
    ) -> GatewayResult<Vec<Company>> {
        let inner = &self.inner;
        self.call("list_companies", cancel, move || inner.list_companies(country, cancel))
            .await
    }

    async fn get_company_details(
        &self,
        company_id: &str,
        cancel: &CancellationToken,
    ) -> GatewayResult<CompanyDetails> {
        let inner = &self.inner;
        self.call("get_company_details", cancel, move || {
            inner.get_company_details(company_id, cancel)
        })
        .await
    }

    async fn get_price(&self, sku: &str, cancel: &CancellationToken) -> GatewayResult<SkuPricing> {
        let inner = &self.inner;
        self.call("get_price", cancel, move || inner.get_price(sku, cancel))
            .await
    }

    async fn submit_result(
        &self,
        payload: &SubmitResultRequest,
        cancel: &CancellationToken,
    ) -> GatewayResult<RawResponse> {
        let inner = &self.inner;
        let outcome = self
            .call("submit_result", cancel, move || async move {
                // Surface retryable statuses as errors so they get retried
                let response = inner.submit_result(payload, cancel).await?;
                if response.status >= 500 || response.status == 429 {
                    return Err(GatewayError::Status {
                        status: response.status,
                        body: response.body,
                    });
                }
                Ok(response)
            })
            .await;

        // The orchestrator judges submission statuses itself
        match outcome {
            Err(GatewayError::Status { status, body }) => Ok(RawResponse { status, body }),
            other => other,
        }
    }
}
