//! Command line definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use p3widescreen::PatchRequest;

#[derive(Parser)]
#[command(name = "p3widescreen")]
#[command(about = "Patrician 3 resolution patcher")]
pub struct Args {
    /// Patch tables (JSON) to use instead of the built-in ones
    #[arg(long, global = true)]
    pub patches: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check the installation, back up, and patch it
    Patch {
        #[command(flatten)]
        target: Target,
    },
    /// Run the pre-flight checks only
    Check {
        #[command(flatten)]
        target: Target,
    },
    /// List the entries of a .cpr archive
    List { archive: PathBuf },
    /// Extract one entry from a .cpr archive
    Extract {
        archive: PathBuf,
        name: String,
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Write the built-in patch tables as JSON
    DumpPatches { output: PathBuf },
}

#[derive(clap::Args)]
pub struct Target {
    /// Game directory containing the executable and data archive
    #[arg(short = 'd', long, env = "P3WS_GAME_DIR", default_value = ".")]
    pub game_dir: PathBuf,

    /// Target screen width in pixels
    #[arg(long)]
    pub width: u32,

    /// Target screen height in pixels
    #[arg(long)]
    pub height: u32,
}

impl Target {
    pub fn request(&self) -> PatchRequest {
        PatchRequest::new(&self.game_dir, self.width, self.height)
    }
}
