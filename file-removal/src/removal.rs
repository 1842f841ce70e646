/*!
Best-effort removal of a single file from disk
*/

use std::{fs, io, path::Path};

/// What happened when a file removal was attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// The file existed and is now gone
    Removed,
    /// There was nothing at the path
    Missing,
    /// The file is still there, e.g. permission denied or the path is a directory
    Failed(io::ErrorKind),
}

impl Removal {
    /// Whether the path is known to be free after the attempt
    pub fn is_gone(self) -> bool {
        matches!(self, Removal::Removed | Removal::Missing)
    }
}

/// Try to remove the file at `path`.
///
/// Never fails and never panics: the outcome is reported, not raised. The
/// tracker discards it; collaborators that care can inspect it.
pub fn remove_path(path: &Path) -> Removal {
    match fs::remove_file(path) {
        Ok(()) => Removal::Removed,
        Err(e) if e.kind() == io::ErrorKind::NotFound => Removal::Missing,
        Err(e) => Removal::Failed(e.kind()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_an_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("foo.txt");
        fs::write(&file, "").unwrap();

        assert_eq!(remove_path(&file), Removal::Removed);
        assert!(!file.exists());
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("never-created.txt");

        let outcome = remove_path(&file);
        assert_eq!(outcome, Removal::Missing);
        assert!(outcome.is_gone());
    }

    #[test]
    fn directory_is_reported_as_failure() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();

        let outcome = remove_path(&sub);
        assert!(matches!(outcome, Removal::Failed(_)));
        assert!(!outcome.is_gone());
        assert!(sub.is_dir());
    }
}
