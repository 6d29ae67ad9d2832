//! List command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use p3widescreen::Archive;

/// Run the list command
pub fn run(path: &Path) -> Result<()> {
    let archive = Archive::open(path)
        .with_context(|| format!("Failed to open archive {}", path.display()))?;

    println!("{:>10}  {:>10}  Name", "Offset", "Length");
    let mut total = 0u64;
    for (name, entry) in archive.entries() {
        println!("{:>#10x}  {:>10}  {}", entry.offset, entry.length, name);
        total += entry.length;
    }
    println!();
    println!("{} file(s), {} byte(s)", archive.len(), total);

    Ok(())
}
