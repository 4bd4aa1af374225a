use crate::{Error, Result};
use std::path::Path;

/// Create a symlink at `link` storing `target` verbatim.
///
/// The target is not resolved or checked, dangling links are fine.
pub fn symlink(target: impl AsRef<Path>, link: impl AsRef<Path>) -> Result<()> {
    let target = target.as_ref();
    let link = link.as_ref();

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link).map_err(|e| Error::Write {
            path: link.to_path_buf(),
            source: e,
        })
    }

    #[cfg(windows)]
    {
        let is_dir_target = link
            .parent()
            .map(|parent| parent.join(target).is_dir())
            .unwrap_or(false)
            || target.to_string_lossy().ends_with('/');
        let result = if is_dir_target {
            std::os::windows::fs::symlink_dir(target, link)
        } else {
            std::os::windows::fs::symlink_file(target, link)
        };
        result.map_err(|e| Error::Write {
            path: link.to_path_buf(),
            source: e,
        })
    }
}
