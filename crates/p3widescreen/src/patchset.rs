//! Patch tables: what to change in the executable and the archive.
//!
//! Tables are plain data ([`PatchSetFile`]) that can be saved to and loaded
//! from JSON, and compiled once into a [`PatchSet`] that the patcher shares
//! read-only across runs.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::ini::{IniPatcher, IniRule};
use crate::pattern::DWordPatch;

pub const DEFAULT_EXECUTABLE: &str = "Patrician3.exe";
pub const DEFAULT_ARCHIVE: &str = "p2arch0_eng.cpr";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryPatchDef {
    pub offset: u64,
    pub pattern: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptDef {
    /// Entry name inside the archive.
    pub entry: String,
    /// Output path relative to the game directory.
    pub output: String,
    pub rules: Vec<IniRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDef {
    pub entry: String,
    pub output: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchSetFile {
    pub version: String,
    pub executable: String,
    pub archive: String,
    pub binary_patches: Vec<BinaryPatchDef>,
    #[serde(default)]
    pub scripts: Vec<ScriptDef>,
    #[serde(default)]
    pub images: Vec<ImageDef>,
}

impl PatchSetFile {
    /// Parse every pattern and register every rule.
    pub fn compile(&self) -> Result<PatchSet> {
        let binary_patches = self
            .binary_patches
            .iter()
            .map(|def| DWordPatch::new(def.offset, &def.pattern))
            .collect::<Result<Vec<_>>>()?;

        let mut scripts = Vec::with_capacity(self.scripts.len());
        for def in &self.scripts {
            let mut patcher = IniPatcher::new();
            for rule in &def.rules {
                patcher.add_rule(
                    rule.section.as_str(),
                    rule.key.as_str(),
                    rule.expected.as_str(),
                    rule.template.as_str(),
                )?;
            }
            scripts.push(ScriptResource {
                entry: def.entry.clone(),
                output: PathBuf::from(&def.output),
                patcher,
            });
        }

        let images = self
            .images
            .iter()
            .map(|def| ImageResource {
                entry: def.entry.clone(),
                output: PathBuf::from(&def.output),
            })
            .collect();

        debug!(
            "Compiled patch set {}: {} binary patch(es), {} script(s), {} image(s)",
            self.version,
            binary_patches.len(),
            scripts.len(),
            self.images.len()
        );
        Ok(PatchSet {
            version: self.version.clone(),
            executable: self.executable.clone(),
            archive: self.archive.clone(),
            binary_patches,
            scripts,
            images,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ScriptResource {
    pub entry: String,
    pub output: PathBuf,
    pub patcher: IniPatcher,
}

#[derive(Debug, Clone)]
pub struct ImageResource {
    pub entry: String,
    pub output: PathBuf,
}

/// Compiled, immutable patch tables.
#[derive(Debug, Clone)]
pub struct PatchSet {
    pub version: String,
    pub executable: String,
    pub archive: String,
    pub binary_patches: Vec<DWordPatch>,
    pub scripts: Vec<ScriptResource>,
    pub images: Vec<ImageResource>,
}

impl PatchSet {
    pub fn builtin() -> Result<Self> {
        builtin_patch_set().compile()
    }

    /// Archive entries the patch set reads.
    pub fn archive_entries(&self) -> impl Iterator<Item = &str> {
        self.images
            .iter()
            .map(|i| i.entry.as_str())
            .chain(self.scripts.iter().map(|s| s.entry.as_str()))
    }

    /// Files under the game directory the patch set writes.
    pub fn outputs(&self) -> impl Iterator<Item = &Path> {
        self.images
            .iter()
            .map(|i| i.output.as_path())
            .chain(self.scripts.iter().map(|s| s.output.as_path()))
    }
}

pub fn load_patch_set<P: AsRef<Path>>(path: P) -> Result<PatchSetFile> {
    let content = fs::read_to_string(&path)?;
    let data = serde_json::from_str(&content)?;
    Ok(data)
}

pub fn save_patch_set<P: AsRef<Path>>(path: P, patch_set: &PatchSetFile) -> Result<()> {
    let content = serde_json::to_string_pretty(patch_set)?;
    fs::write(path, content)?;
    Ok(())
}

fn rule(section: &str, key: &str, expected: &str, template: &str) -> IniRule {
    IniRule {
        section: section.to_string(),
        key: key.to_string(),
        expected: expected.to_string(),
        template: template.to_string(),
    }
}

fn binary(offset: u64, pattern: &str, note: &str) -> BinaryPatchDef {
    BinaryPatchDef {
        offset,
        pattern: pattern.to_string(),
        note: note.to_string(),
    }
}

/// Tables for the English Patrician 3 release.
pub fn builtin_patch_set() -> PatchSetFile {
    PatchSetFile {
        version: "patrician3-eng".to_string(),
        executable: DEFAULT_EXECUTABLE.to_string(),
        archive: DEFAULT_ARCHIVE.to_string(),
        binary_patches: vec![
            binary(0x23bf0, "c7 44 24 4c ? c7 44 24 50 ?", "width, height"),
            binary(0x2d168, "c7 44 24 18 ? c7 44 24 1c ?", "width, height"),
            binary(0x32d36, "c7 44 24 3c ? c7 44 24 40 ?", "width, height"),
            binary(0x5fe68, "c7 44 24 48 ? c7 44 24 4c ?", "width, height"),
            binary(0x63fed, "c7 44 24 24 ? c7 44 24 28 ?", "width, height"),
            binary(
                0x29ad0,
                "3d 00 04 00 00 0f 84 af 00 00 00 3d ?",
                "cmp eax, width",
            ),
            binary(0x29ff5, "3d 00 04 00 00 74 1e 3d ?", "cmp eax, width"),
        ],
        scripts: vec![ScriptDef {
            entry: "scripts\\Screens.ini".to_string(),
            output: "scripts/Screens.ini".to_string(),
            rules: vec![rule("SCREEN2", "Size", "1280 1024", "$width $height")],
        }],
        images: vec![ImageDef {
            entry: "images\\Vollansichtskarte1280.bmp".to_string(),
            output: "images/Vollansichtskarte1280.bmp".to_string(),
        }],
    }
}
