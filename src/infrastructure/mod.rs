pub mod http_transport;
pub mod log_redact;
pub mod logging;
