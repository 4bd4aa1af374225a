use std::fs::{self, OpenOptions};
use std::io::{self, Read};
use std::path::Path;

use srcpack_fs::DEFAULT_DIR_MODE;

use crate::entry::{Advisory, ArchiveMember, MemberKind};
use crate::error::{Error, Result};
use crate::sanitize::resolve_member_path;

/// Reconstruct one archive member under `out_root`.
///
/// Content problems are fatal. Mode and time stamping are best effort and
/// come back as advisories, as does skipping an unsupported member type.
pub fn materialize(
    out_root: &Path,
    member: &ArchiveMember,
    content: &mut dyn Read,
) -> Result<Vec<Advisory>> {
    let path = resolve_member_path(out_root, &member.path)?;
    let mut advisories = Vec::new();

    if let Some(parent) = path.parent() {
        srcpack_fs::create_dir_all(parent, DEFAULT_DIR_MODE).map_err(|source| {
            Error::DirectoryCreationFailed {
                path: parent.to_path_buf(),
                source,
            }
        })?;
    }

    match &member.kind {
        MemberKind::Directory => {
            srcpack_fs::create_dir_all(&path, member.mode & 0o7777).map_err(|source| {
                Error::DirectoryCreationFailed {
                    path: path.clone(),
                    source,
                }
            })?;
        }
        MemberKind::HardLink { target } => {
            let resolved = resolve_member_path(out_root, target)?;
            remove_existing(member, &path)?;
            srcpack_fs::hard_link(&resolved, &path).map_err(|source| match source {
                srcpack_fs::Error::MissingTarget { .. } => Error::MissingLinkTarget {
                    member: member.path.clone(),
                    target: target.clone(),
                },
                source => Error::HardlinkCreationFailed {
                    member: member.path.clone(),
                    source,
                },
            })?;
            return Ok(advisories);
        }
        MemberKind::Symlink { target } => {
            remove_existing(member, &path)?;
            srcpack_fs::symlink(target, &path).map_err(|source| Error::SymlinkCreationFailed {
                member: member.path.clone(),
                target: target.clone(),
                source,
            })?;
            return Ok(advisories);
        }
        MemberKind::File => {
            remove_existing(member, &path)?;
            write_file(member, &path, content)?;
        }
        MemberKind::Other => {
            advisories.push(Advisory::UnsupportedMember {
                member: member.path.clone(),
            });
            return Ok(advisories);
        }
    }

    advisories.extend(stamp(&path, member));
    Ok(advisories)
}

/// Apply the member's mode and times to `path`, collecting failures.
fn stamp(path: &Path, member: &ArchiveMember) -> Vec<Advisory> {
    let mut advisories = Vec::new();
    if let Err(source) = srcpack_fs::set_mode(path, member.mode & 0o7777) {
        advisories.push(Advisory::Permissions {
            member: member.path.clone(),
            source,
        });
    }
    if let Err(source) = srcpack_fs::set_times(path, member.atime, member.mtime) {
        advisories.push(Advisory::Times {
            member: member.path.clone(),
            source,
        });
    }
    advisories
}

fn write_file(member: &ArchiveMember, path: &Path, content: &mut dyn Read) -> Result<()> {
    let extraction_failed = |source| Error::ExtractionFailed {
        member: member.path.clone(),
        source,
    };

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(member.mode & 0o7777);
    }
    let mut file = options.open(path).map_err(extraction_failed)?;

    let written = io::copy(&mut content.take(member.size), &mut file).map_err(extraction_failed)?;
    if written < member.size {
        return Err(Error::ShortWrite {
            member: member.path.clone(),
            written,
            expected: member.size,
        });
    }
    Ok(())
}

/// Replace a file or link left at `path` by an earlier member or run.
fn remove_existing(member: &ArchiveMember, path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if !meta.is_dir() => {
            fs::remove_file(path).map_err(|source| Error::ExtractionFailed {
                member: member.path.clone(),
                source,
            })
        }
        _ => Ok(()),
    }
}
