use std::sync::Arc;
use std::time::Duration;
use tessera_order::OrderOrchestrator;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<OrderOrchestrator>,
    /// Deadline for one order, after which its provider calls are cancelled
    pub order_timeout: Duration,
}
