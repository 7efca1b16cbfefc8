//! Structured logging via the tracing ecosystem.

use tracing::Level;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level.
    pub level: Level,
    /// Whether to emit JSON lines instead of human-readable output.
    pub json_format: bool,
    /// Whether to include file/line info.
    pub include_location: bool,
    /// Whether to include the target (module path).
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            include_location: false,
            include_target: true,
        }
    }
}

impl LoggingConfig {
    /// Verbose configuration for local debugging.
    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            json_format: false,
            include_location: true,
            include_target: true,
        }
    }

    /// JSON output for scheduled/batch runs.
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            json_format: true,
            include_location: false,
            include_target: true,
        }
    }
}

/// Initializes logging with the default configuration.
pub fn init_logging() {
    init_logging_with_config(LoggingConfig::default());
}

/// Initializes logging with the given configuration. `RUST_LOG` overrides
/// the configured level when set.
pub fn init_logging_with_config(config: LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "ix_graph={},ix_export={},ix_diff={},ix_cli={}",
            config.level, config.level, config.level, config.level
        ))
    });

    if config.json_format {
        let fmt_layer = fmt::layer()
            .json()
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_target(config.include_target);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
    } else {
        let fmt_layer = fmt::layer()
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_target(config.include_target);
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, Level::INFO);
        assert!(!config.json_format);
    }

    #[test]
    fn test_profiles() {
        assert_eq!(LoggingConfig::development().level, Level::DEBUG);
        assert!(LoggingConfig::production().json_format);
    }
}
