pub mod request_id;
pub mod request_logging;

pub use request_id::request_id_middleware;
pub use request_logging::{request_logging_middleware, ActionCategory, RequestLogEntry};
