//! Pre-flight problem collection.

use std::fs::File;
use std::path::Path;

use tracing::warn;

use crate::error::{Error, Result};

/// Collects every problem found before patching, instead of stopping at the
/// first one.
#[derive(Debug, Default)]
pub struct ValidationReport {
    problems: Vec<String>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, problem: impl Into<String>) {
        let problem = problem.into();
        warn!("{}", problem);
        self.problems.push(problem);
    }

    pub fn problems(&self) -> &[String] {
        &self.problems
    }

    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }

    /// Record the error of a failed check, if any.
    pub fn check<T>(&mut self, result: Result<T>, context: impl FnOnce() -> String) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.push(format!("{}: {}", context(), e));
                None
            }
        }
    }

    /// Open `path` for reading if it is a regular file.
    pub fn open_regular_file(&mut self, path: &Path) -> Option<File> {
        if !path.is_file() {
            self.push(format!(
                "\"{}\" doesn't exist or isn't a regular file",
                path.display()
            ));
            return None;
        }
        let opened = File::open(path).map_err(Error::from);
        self.check(opened, || format!("can't read \"{}\"", path.display()))
    }

    pub fn into_result(self) -> Result<()> {
        if self.problems.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation(self.problems))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_report_is_ok() {
        assert!(ValidationReport::new().into_result().is_ok());
    }

    #[test]
    fn test_problems_are_aggregated() {
        let mut report = ValidationReport::new();
        report.push("width too small");
        let checked: Option<()> = report.check(
            Err(Error::EntryNotFound("x".into())),
            || "archive".to_string(),
        );
        assert!(checked.is_none());

        match report.into_result() {
            Err(Error::Validation(problems)) => {
                assert_eq!(problems.len(), 2);
                assert_eq!(problems[1], "archive: Can't find file \"x\" in archive");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_open_regular_file() {
        let dir = TempDir::new().unwrap();
        let mut report = ValidationReport::new();

        assert!(report.open_regular_file(dir.path()).is_none());
        assert!(report.open_regular_file(&dir.path().join("nope")).is_none());
        std::fs::write(dir.path().join("yes"), b"x").unwrap();
        assert!(report.open_regular_file(&dir.path().join("yes")).is_some());
        assert_eq!(report.problems().len(), 2);
    }
}
