//! Patch command implementation.

use std::sync::Arc;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use p3widescreen::{LanczosResizer, PatchSet, PatchWorker};

use crate::cli::Target;

/// Run the patch command
pub fn run(patch_set: PatchSet, target: &Target) -> Result<()> {
    let request = target.request();
    println!(
        "Patching {} for {}x{}...",
        request.game_dir.display(),
        request.width,
        request.height
    );

    let worker = PatchWorker::spawn(
        Arc::new(patch_set),
        Arc::new(LanczosResizer::default()),
        request,
    )
    .context("Failed to start patch worker")?;

    let report = match worker.wait() {
        Ok(report) => report,
        Err(e) => {
            println!("{} {}", "FAILED".red().bold(), e);
            println!("Backups made before the failure were left in place.");
            return Err(e).context("Patching failed");
        }
    };

    for backup in &report.backups {
        println!("  backup   {}", backup.display());
    }
    for path in report.images.iter().chain(&report.scripts) {
        println!("  wrote    {}", path.display());
    }
    println!("{} {}", "OK".green().bold(), report.summary());
    Ok(())
}
