use tessera_core::GatewayError;

/// Classified failure of an order
#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    /// The order breaks a business rule; retrying will not help
    #[error("{0}")]
    BusinessRule(String),

    #[error("Provider call failed during {context}: {source}")]
    Provider {
        context: String,
        #[source]
        source: GatewayError,
    },

    #[error("Provider rejected the submission with status {status}: {body}")]
    SubmissionRejected { status: u16, body: String },

    #[error("Order processing was cancelled")]
    Cancelled,
}

impl OrderError {
    pub fn business(message: impl Into<String>) -> Self {
        OrderError::BusinessRule(message.into())
    }

    /// Wrap a gateway failure, keeping cancellation distinct from transport errors
    pub fn provider(context: impl Into<String>, source: GatewayError) -> Self {
        match source {
            GatewayError::Cancelled => OrderError::Cancelled,
            source => OrderError::Provider {
                context: context.into(),
                source,
            },
        }
    }

    pub fn is_business_rule(&self) -> bool {
        matches!(self, OrderError::BusinessRule(_))
    }

    pub fn is_dependency_failure(&self) -> bool {
        matches!(self, OrderError::Provider { .. } | OrderError::SubmissionRejected { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, OrderError::Cancelled)
    }
}

pub type OrderResult<T> = Result<T, OrderError>;
