pub mod provider;

pub use provider::{GatewayError, GatewayResult, ProviderGateway, RawResponse};
pub use tokio_util::sync::CancellationToken;
