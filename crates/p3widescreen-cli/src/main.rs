use anyhow::{Context, Result};
use clap::Parser;
use p3widescreen::{PatchSet, builtin_patch_set, load_patch_set};
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Args, Command};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("p3widescreen=info".parse()?))
        .init();

    let args = Args::parse();

    match args.command {
        Command::Patch { target } => {
            let patch_set = resolve_patch_set(args.patches.as_deref())?;
            commands::patch::run(patch_set, &target)
        }
        Command::Check { target } => {
            let patch_set = resolve_patch_set(args.patches.as_deref())?;
            commands::check::run(&patch_set, &target)
        }
        Command::List { archive } => commands::list::run(&archive),
        Command::Extract {
            archive,
            name,
            output,
        } => commands::extract::run(&archive, &name, output.as_deref()),
        Command::DumpPatches { output } => commands::dump::run(&output),
    }
}

/// Compile the patch tables from `path`, or the built-in ones.
fn resolve_patch_set(path: Option<&Path>) -> Result<PatchSet> {
    let file = match path {
        Some(path) => {
            let file = load_patch_set(path)
                .with_context(|| format!("Failed to load patch tables from {}", path.display()))?;
            info!("Loaded patch tables {} from {}", file.version, path.display());
            file
        }
        None => builtin_patch_set(),
    };
    file.compile().context("Invalid patch tables")
}
