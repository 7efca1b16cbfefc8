//! CLI subcommand implementations.

pub mod changelog;
pub mod export;

pub use changelog::run_changelog;
pub use export::{run_export, ExportModule};
