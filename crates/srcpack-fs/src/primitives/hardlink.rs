use crate::{Error, Result};
use std::path::Path;

/// Create a hard link at `link` sharing the content of `target`.
///
/// The target must already exist; a missing target is reported as
/// [`Error::MissingTarget`] rather than as a bare I/O error.
pub fn hard_link(target: impl AsRef<Path>, link: impl AsRef<Path>) -> Result<()> {
    let target = target.as_ref();
    let link = link.as_ref();

    match std::fs::symlink_metadata(target) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::MissingTarget {
                target: target.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(Error::Write {
                path: link.to_path_buf(),
                source: e,
            });
        }
    }

    std::fs::hard_link(target, link).map_err(|e| Error::Write {
        path: link.to_path_buf(),
        source: e,
    })
}
