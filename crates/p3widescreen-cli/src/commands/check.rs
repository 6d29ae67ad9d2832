//! Check command implementation.

use anyhow::{Result, bail};
use owo_colors::OwoColorize;
use p3widescreen::{Error, LanczosResizer, PatchSet, Patcher};

use crate::cli::Target;

/// Run the check command
pub fn run(patch_set: &PatchSet, target: &Target) -> Result<()> {
    let request = target.request();
    let resizer = LanczosResizer::default();
    let patcher = Patcher::new(patch_set, &resizer);

    match patcher.validate(&request) {
        Ok(()) => {
            println!(
                "{} {} can be patched to {}x{}",
                "OK".green().bold(),
                request.game_dir.display(),
                request.width,
                request.height
            );
            Ok(())
        }
        Err(Error::Validation(problems)) => {
            for problem in &problems {
                println!("{} {}", "✗".red(), problem);
            }
            bail!("{} problem(s) found", problems.len())
        }
        Err(e) => Err(e.into()),
    }
}
