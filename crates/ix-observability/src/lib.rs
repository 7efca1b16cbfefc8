//! # ix-observability
//!
//! Logging initialization shared by the exporter binaries.

pub mod logging;

pub use logging::{init_logging, init_logging_with_config, LoggingConfig};
