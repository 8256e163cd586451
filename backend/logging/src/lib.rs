//! Structured logging for esprobe.
//!
//! Console output, an optional rolling NDJSON file, and secret redaction for
//! strings that may carry credentials.

pub mod logger;
pub mod redact;

pub use logger::{bootstrap_logger, bootstrap_logger_with, init_logger, LogSettings};
pub use redact::redact_sensitive_data;
