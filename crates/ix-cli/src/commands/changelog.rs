//! Changelog command: diffs the export tree against a prior snapshot.

use crate::config::AppConfig;
use anyhow::{Context, Result};
use colored::Colorize;
use ix_diff::{DiffGenerator, DirSnapshot, EmptySnapshot, SnapshotSource};
use std::path::PathBuf;

/// Generates and persists a changelog. Without a snapshot directory the
/// prior state is empty, so every current manifest reports as added.
pub fn run_changelog(
    config: &AppConfig,
    snapshot_dir: Option<PathBuf>,
    reference: Option<String>,
) -> Result<()> {
    let source: Box<dyn SnapshotSource> = match snapshot_dir {
        Some(dir) => Box::new(DirSnapshot::new(dir)),
        None => Box::new(EmptySnapshot),
    };

    let generator = DiffGenerator::new(&config.export.root, &config.changelog.dir, source);
    let log = generator
        .generate(reference.as_deref())
        .context("Failed to generate change log")?;

    println!(
        "{} {} added, {} removed, {} modified",
        "Change log generated:".green().bold(),
        log.added.len(),
        log.removed.len(),
        log.modified.len()
    );
    if log.total_changes() == 0 {
        println!("{}", "No changes detected".cyan());
    }
    Ok(())
}
