use crate::{Error, Result};
use std::path::Path;

/// Mode used for directories that are created implicitly, e.g. missing parents.
pub const DEFAULT_DIR_MODE: u32 = 0o755;

/// Create `path` and any missing ancestors.
///
/// On Unix newly created directories get `mode` (filtered by the umask).
/// Directories that already exist are left alone.
pub fn create_dir_all(path: impl AsRef<Path>, mode: u32) -> Result<()> {
    let path = path.as_ref();
    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    builder.create(path).map_err(|e| Error::CreateDir {
        path: path.to_path_buf(),
        source: e,
    })
}
