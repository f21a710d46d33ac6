pub mod correlation;

pub use correlation::{correlation_id_middleware, CorrelationId, CORRELATION_ID_HEADER};
