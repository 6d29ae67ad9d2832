//! Patch orchestration for one game installation.
//!
//! A run has two phases. Validation is read-only and collects every problem
//! before giving up. Mutation backs up each file it is about to touch, then
//! writes resized images, patched scripts and finally the executable,
//! stopping at the first error. Finished steps and backups are left in
//! place when a later step fails.

mod backup;
mod validation;

pub use backup::{MAX_BACKUP_ATTEMPTS, backup_candidates, create_backup};
pub use validation::ValidationReport;

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use strum::{Display, IntoStaticStr};
use tracing::{debug, info};

use crate::archive::{Archive, encode_text};
use crate::error::{Error, Result};
use crate::ini::Substitutions;
use crate::patchset::PatchSet;
use crate::resize::ImageResizer;

/// Narrowest supported screen; the side panel alone is this wide.
pub const MIN_WIDTH: u32 = 284;
/// Lowest supported screen; the bottom panel alone is this high.
pub const MIN_HEIGHT: u32 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    Validate,
    Backup,
    Images,
    Scripts,
    Executable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRequest {
    pub game_dir: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl PatchRequest {
    pub fn new(game_dir: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            game_dir: game_dir.into(),
            width,
            height,
        }
    }

    /// Values for the executable's dword slots, in slot order.
    pub fn dword_values(&self) -> [u32; 2] {
        [self.width, self.height]
    }

    /// Template values for script patches.
    pub fn substitutions(&self) -> Substitutions {
        Substitutions::new()
            .with("width", self.width)
            .with("height", self.height)
            .with("panel_x", self.width.saturating_sub(MIN_WIDTH))
            .with("panel_y", self.height.saturating_sub(MIN_HEIGHT))
    }
}

/// What a successful run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchReport {
    pub backups: Vec<PathBuf>,
    pub images: Vec<PathBuf>,
    pub scripts: Vec<PathBuf>,
    pub binary_patches: usize,
}

impl PatchReport {
    pub fn summary(&self) -> String {
        format!(
            "{} image(s), {} script(s) and {} executable patch(es) applied; {} backup(s) made",
            self.images.len(),
            self.scripts.len(),
            self.binary_patches,
            self.backups.len()
        )
    }
}

pub struct Patcher<'a> {
    patch_set: &'a PatchSet,
    resizer: &'a dyn ImageResizer,
}

impl<'a> Patcher<'a> {
    pub fn new(patch_set: &'a PatchSet, resizer: &'a dyn ImageResizer) -> Self {
        Self { patch_set, resizer }
    }

    pub fn executable_path(&self, request: &PatchRequest) -> PathBuf {
        request.game_dir.join(&self.patch_set.executable)
    }

    pub fn archive_path(&self, request: &PatchRequest) -> PathBuf {
        request.game_dir.join(&self.patch_set.archive)
    }

    /// Validate, then patch. Nothing is touched unless validation passes.
    pub fn run(&self, request: &PatchRequest) -> Result<PatchReport> {
        info!(
            phase = %Phase::Validate,
            "Patching {} for {}x{}",
            request.game_dir.display(),
            request.width,
            request.height
        );
        self.validate(request)?;

        let mut report = PatchReport::default();
        self.back_up(request, &mut report)?;
        self.write_images(request, &mut report)?;
        self.write_scripts(request, &mut report)?;
        self.patch_executable(request, &mut report)?;

        info!("Patch complete: {}", report.summary());
        Ok(report)
    }

    /// Read-only checks. Every problem found is reported in one error.
    pub fn validate(&self, request: &PatchRequest) -> Result<()> {
        let mut report = ValidationReport::new();

        if request.width < MIN_WIDTH {
            report.push(format!(
                "width {} is below the minimum of {}",
                request.width, MIN_WIDTH
            ));
        }
        if request.height < MIN_HEIGHT {
            report.push(format!(
                "height {} is below the minimum of {}",
                request.height, MIN_HEIGHT
            ));
        }

        let available = request.dword_values().len();
        for patch in &self.patch_set.binary_patches {
            if patch.wildcard_count() > available {
                report.push(format!(
                    "patch at {:#x} needs {} value(s) but only {} are supplied",
                    patch.offset(),
                    patch.wildcard_count(),
                    available
                ));
            }
        }

        let exe_path = self.executable_path(request);
        if let Some(mut exe) = report.open_regular_file(&exe_path) {
            for patch in &self.patch_set.binary_patches {
                let verified = patch.verify(&mut exe);
                report.check(verified, || format!("error patching {}", exe_path.display()));
            }
        }

        let archive_path = self.archive_path(request);
        if report.open_regular_file(&archive_path).is_some() {
            let opened = Archive::open(&archive_path);
            if let Some(archive) =
                report.check(opened, || format!("can't open {}", archive_path.display()))
            {
                for entry in self.patch_set.archive_entries() {
                    if !archive.contains(entry) {
                        report.push(format!(
                            "{} has no file \"{}\"",
                            archive_path.display(),
                            entry
                        ));
                    }
                }
            }
        }

        report.into_result()
    }

    fn back_up(&self, request: &PatchRequest, report: &mut PatchReport) -> Result<()> {
        let outputs = self
            .patch_set
            .outputs()
            .map(|output| request.game_dir.join(output));
        for path in std::iter::once(self.executable_path(request)).chain(outputs) {
            if !path.exists() {
                continue;
            }
            let backup = create_backup(&path).map_err(|e| e.in_file(&path))?;
            info!(
                phase = %Phase::Backup,
                "Backed up {} to {}",
                path.display(),
                backup.display()
            );
            report.backups.push(backup);
        }
        Ok(())
    }

    fn open_archive(&self, request: &PatchRequest) -> Result<Archive<File>> {
        let path = self.archive_path(request);
        Archive::open(&path).map_err(|e| e.in_file(path))
    }

    fn write_images(&self, request: &PatchRequest, report: &mut PatchReport) -> Result<()> {
        if self.patch_set.images.is_empty() {
            return Ok(());
        }
        let mut archive = self.open_archive(request)?;
        for image in &self.patch_set.images {
            let path = request.game_dir.join(&image.output);
            let original = archive
                .extract(&image.entry)
                .map_err(|e| e.in_file(&image.entry))?;
            let resized = self
                .resizer
                .resize(&original, request.width, request.height)
                .map_err(|e| e.in_file(&image.entry))?;
            write_output(&path, &resized)?;
            info!(phase = %Phase::Images, "Wrote {}", path.display());
            report.images.push(path);
        }
        Ok(())
    }

    fn write_scripts(&self, request: &PatchRequest, report: &mut PatchReport) -> Result<()> {
        if self.patch_set.scripts.is_empty() {
            return Ok(());
        }
        let substitutions = request.substitutions();
        let mut archive = self.open_archive(request)?;
        for script in &self.patch_set.scripts {
            let path = request.game_dir.join(&script.output);
            let mut patched = Vec::new();
            archive
                .text_reader(&script.entry)
                .and_then(|input| script.patcher.patch(input, &mut patched, &substitutions))
                .map_err(|e| e.in_file(&script.entry))?;
            let text = String::from_utf8(patched)
                .map_err(|e| Error::EncodingError(e.to_string()).in_file(&script.entry))?;
            write_output(&path, &encode_text(&text)?)?;
            info!(phase = %Phase::Scripts, "Wrote {}", path.display());
            report.scripts.push(path);
        }
        Ok(())
    }

    fn patch_executable(&self, request: &PatchRequest, report: &mut PatchReport) -> Result<()> {
        let path = self.executable_path(request);
        let mut exe = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| Error::from(e).in_file(&path))?;

        let values = request.dword_values();
        for patch in &self.patch_set.binary_patches {
            let wanted = patch.wildcard_count();
            let slot_values = values.get(..wanted).ok_or(Error::ArgumentCountMismatch {
                expected: wanted,
                actual: values.len(),
            });
            slot_values
                .and_then(|v| patch.apply(&mut exe, v))
                .map_err(|e| e.in_file(&path))?;
            debug!(phase = %Phase::Executable, "Applied patch at {:#x}", patch.offset());
            report.binary_patches += 1;
        }
        exe.sync_all().map_err(|e| Error::from(e).in_file(&path))?;
        info!(
            phase = %Phase::Executable,
            "Patched {} location(s) in {}",
            report.binary_patches,
            path.display()
        );
        Ok(())
    }
}

fn write_output(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::from(e).in_file(parent))?;
    }
    fs::write(path, data).map_err(|e| Error::from(e).in_file(path))
}
