use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Resolve an archive member name against the output root.
///
/// Root and prefix components are dropped, so `/etc/x` lands at
/// `<root>/etc/x`. `.` is ignored and `..` pops one level, but never above
/// the root.
pub fn resolve_member_path(root: &Path, member: &Path) -> Result<PathBuf> {
    let mut relative = PathBuf::new();
    let mut depth = 0usize;

    for component in member.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return Err(Error::UnsafePath {
                        member: member.to_path_buf(),
                    });
                }
                relative.pop();
                depth -= 1;
            }
            Component::Normal(part) => {
                relative.push(part);
                depth += 1;
            }
        }
    }

    Ok(root.join(relative))
}
