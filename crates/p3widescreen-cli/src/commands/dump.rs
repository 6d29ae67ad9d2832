//! Dump-patches command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use p3widescreen::{builtin_patch_set, save_patch_set};

/// Run the dump-patches command
pub fn run(output: &Path) -> Result<()> {
    let patch_set = builtin_patch_set();
    save_patch_set(output, &patch_set)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!(
        "Wrote {} binary patch(es), {} script(s) and {} image(s) to {}",
        patch_set.binary_patches.len(),
        patch_set.scripts.len(),
        patch_set.images.len(),
        output.display()
    );
    Ok(())
}
