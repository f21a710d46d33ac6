pub mod app_config;
pub mod provider_client;
pub mod resiliency;

pub use provider_client::HttpProviderGateway;
pub use resiliency::{CircuitBreaker, CircuitState, ResilientGateway, RetryPolicy};
