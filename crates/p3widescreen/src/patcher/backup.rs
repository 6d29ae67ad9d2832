//! Numbered backups next to the original file.

use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// `<name>.bak` plus `<name>.01.bak` through `<name>.99.bak`.
pub const MAX_BACKUP_ATTEMPTS: usize = 100;

/// Backup names for `path`, in the order they are tried.
pub fn backup_candidates(path: &Path) -> impl Iterator<Item = PathBuf> + '_ {
    (0..MAX_BACKUP_ATTEMPTS).map(move |n| {
        let mut name = path.file_name().map(OsString::from).unwrap_or_default();
        if n == 0 {
            name.push(".bak");
        } else {
            name.push(format!(".{:02}.bak", n));
        }
        path.with_file_name(name)
    })
}

/// Copy `path` to the first free backup name and return that name.
pub fn create_backup(path: &Path) -> Result<PathBuf> {
    if path.file_name().is_none() {
        return Err(io::Error::new(
            ErrorKind::InvalidInput,
            format!("{} has no file name", path.display()),
        )
        .into());
    }

    let mut src = File::open(path)?;
    for candidate in backup_candidates(path) {
        let mut dest = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!("{} exists, trying next name", candidate.display());
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        io::copy(&mut src, &mut dest)?;
        dest.sync_all()?;
        return Ok(candidate);
    }

    Err(Error::NoBackupSlot(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn names(path: &Path) -> Vec<String> {
        backup_candidates(path)
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_backup_candidate_names() {
        let names = names(Path::new("game/Patrician3.exe"));
        assert_eq!(names.len(), 100);
        assert_eq!(names[0], "Patrician3.exe.bak");
        assert_eq!(names[1], "Patrician3.exe.01.bak");
        assert_eq!(names[99], "Patrician3.exe.99.bak");
    }

    #[test]
    fn test_first_backup_uses_plain_suffix() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("foo");
        fs::write(&file, b"original").unwrap();

        let backup = create_backup(&file).unwrap();
        assert_eq!(backup, dir.path().join("foo.bak"));
        assert_eq!(fs::read(&backup).unwrap(), b"original");
    }

    #[test]
    fn test_existing_backup_is_kept() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("foo");
        fs::write(&file, b"second").unwrap();
        fs::write(dir.path().join("foo.bak"), b"first").unwrap();

        let backup = create_backup(&file).unwrap();
        assert_eq!(backup, dir.path().join("foo.01.bak"));
        assert_eq!(fs::read(dir.path().join("foo.bak")).unwrap(), b"first");
        assert_eq!(fs::read(&backup).unwrap(), b"second");
    }

    #[test]
    fn test_no_backup_slot_after_100_backups() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("foo");
        fs::write(&file, b"data").unwrap();
        for candidate in backup_candidates(&file) {
            fs::write(candidate, b"old").unwrap();
        }

        let err = create_backup(&file).unwrap_err();
        assert!(matches!(err, Error::NoBackupSlot(ref p) if p == &file));
    }

    #[test]
    fn test_backup_of_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let err = create_backup(&dir.path().join("missing")).unwrap_err();
        assert!(err.is_not_found());
    }
}
