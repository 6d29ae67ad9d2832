//! # p3widescreen
//!
//! Core library for the Patrician 3 resolution patcher.
//!
//! This crate provides:
//! - A reader for Ascaron `.cpr` resource archives
//! - Verify-then-patch of dword fields in the game executable
//! - Verify-then-rewrite of INI style scripts with value templates
//! - Orchestration with pre-flight validation and numbered backups

pub mod archive;
pub mod error;
pub mod ini;
pub mod patcher;
pub mod patchset;
pub mod pattern;
pub mod resize;
pub mod worker;

#[cfg(test)]
mod testutil;

pub use archive::{Archive, IndexEntry};
pub use error::{Error, Result};
pub use ini::{IniPatcher, IniRule, Substitutions};
pub use patcher::{
    MIN_HEIGHT, MIN_WIDTH, PatchReport, PatchRequest, Patcher, Phase, ValidationReport,
    create_backup,
};
pub use patchset::{
    PatchSet, PatchSetFile, builtin_patch_set, load_patch_set, save_patch_set,
};
pub use pattern::{BytePattern, DWordPatch, Slot};
pub use resize::{ImageResizer, LanczosResizer};
pub use worker::PatchWorker;
