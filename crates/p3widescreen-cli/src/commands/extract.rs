//! Extract command implementation.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use p3widescreen::Archive;

/// Run the extract command
pub fn run(path: &Path, name: &str, output: Option<&Path>) -> Result<()> {
    let mut archive = Archive::open(path)
        .with_context(|| format!("Failed to open archive {}", path.display()))?;
    let data = archive
        .extract(name)
        .with_context(|| format!("Failed to extract \"{}\"", name))?;

    match output {
        Some(out) => {
            fs::write(out, &data)
                .with_context(|| format!("Failed to write {}", out.display()))?;
            eprintln!("Wrote {} byte(s) to {}", data.len(), out.display());
        }
        None => io::stdout().lock().write_all(&data)?,
    }

    Ok(())
}
