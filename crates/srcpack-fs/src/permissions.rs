use crate::{Error, Result};
use filetime::FileTime;
use std::path::Path;

/// Set the permission bits of `path`.
///
/// # Platform Behavior
/// - **Unix**: the mode is applied as-is via `PermissionsExt::from_mode()`,
///   so setuid/setgid/sticky bits are honoured and the umask is not.
/// - **Windows**: only the write bits matter; a mode without any of
///   `0o222` marks the file read-only.
pub fn set_mode(path: impl AsRef<Path>, mode: u32) -> Result<()> {
    let path = path.as_ref();

    #[cfg(unix)]
    let permissions = {
        use std::os::unix::fs::PermissionsExt;
        std::fs::Permissions::from_mode(mode)
    };

    #[cfg(not(unix))]
    let permissions = {
        let mut permissions = std::fs::metadata(path)
            .map_err(|e| Error::Permissions {
                path: path.to_path_buf(),
                source: e,
            })?
            .permissions();
        permissions.set_readonly(mode & 0o222 == 0);
        permissions
    };

    std::fs::set_permissions(path, permissions).map_err(|e| Error::Permissions {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Stamp access and modification times on `path`, following symlinks.
///
/// Without an access time only the modification time is touched.
pub fn set_times(path: impl AsRef<Path>, accessed: Option<FileTime>, modified: FileTime) -> Result<()> {
    let path = path.as_ref();
    let result = match accessed {
        Some(accessed) => filetime::set_file_times(path, accessed, modified),
        None => filetime::set_file_mtime(path, modified),
    };
    result.map_err(|e| Error::Times {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[cfg(unix)]
    #[test]
    fn set_mode_applies_exact_bits() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("tool");
        std::fs::write(&path, "#!/bin/sh").unwrap();

        set_mode(&path, 0o751).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o7777, 0o751);
    }

    #[test]
    fn set_mode_missing_path() {
        let dir = tempdir().unwrap();
        let err = set_mode(dir.path().join("missing"), 0o644).unwrap_err();
        assert!(matches!(err, Error::Permissions { .. }));
    }

    #[test]
    fn set_times_both() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file");
        std::fs::write(&path, "x").unwrap();

        let accessed = FileTime::from_unix_time(1_600_000_000, 0);
        let modified = FileTime::from_unix_time(1_500_000_000, 0);
        set_times(&path, Some(accessed), modified).unwrap();

        let metadata = std::fs::metadata(&path).unwrap();
        assert_eq!(FileTime::from_last_modification_time(&metadata), modified);
        assert_eq!(FileTime::from_last_access_time(&metadata), accessed);
    }

    #[test]
    fn set_times_without_access_time() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file");
        std::fs::write(&path, "x").unwrap();

        let modified = FileTime::from_unix_time(1_500_000_000, 0);
        set_times(&path, None, modified).unwrap();

        let metadata = std::fs::metadata(&path).unwrap();
        assert_eq!(FileTime::from_last_modification_time(&metadata), modified);
    }

    #[test]
    fn set_times_missing_path() {
        let dir = tempdir().unwrap();
        let err = set_times(dir.path().join("missing"), None, FileTime::zero()).unwrap_err();
        assert!(matches!(err, Error::Times { .. }));
    }
}
