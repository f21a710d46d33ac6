pub mod error;
pub mod reconcile;
pub mod pricing;
pub mod payload;
pub mod orchestrator;

pub use error::{OrderError, OrderResult};
pub use reconcile::{reconcile_skus, QuantityOverage, Reconciliation, SkuGroup};
pub use orchestrator::OrderOrchestrator;
