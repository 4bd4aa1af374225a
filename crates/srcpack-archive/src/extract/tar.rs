use std::io::{self, Read};
use std::path::{Path, PathBuf};

use srcpack_fs::FileTime;

use super::MemberSource;
use crate::entry::{ArchiveMember, MemberKind};
use crate::error::{Error, Result};

/// Members of a (possibly decompressed) tar stream.
pub struct TarMembers<R: Read> {
    archive_path: PathBuf,
    archive: tar::Archive<R>,
}

impl<R: Read> TarMembers<R> {
    pub fn new(archive_path: impl Into<PathBuf>, reader: R) -> Self {
        Self {
            archive_path: archive_path.into(),
            archive: tar::Archive::new(reader),
        }
    }
}

impl<R: Read> MemberSource for TarMembers<R> {
    fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    fn for_each_member(
        &mut self,
        visit: &mut dyn FnMut(ArchiveMember, &mut dyn Read) -> Result<()>,
    ) -> Result<()> {
        let archive_path = &self.archive_path;
        let read_error = |source| Error::ReadArchive {
            archive: archive_path.clone(),
            source,
        };

        for entry in self.archive.entries().map_err(read_error)? {
            let mut entry = entry.map_err(read_error)?;
            let member = tar_member(&mut entry).map_err(read_error)?;
            visit(member, &mut entry)?;
        }
        Ok(())
    }
}

fn tar_member<R: Read>(entry: &mut tar::Entry<'_, R>) -> io::Result<ArchiveMember> {
    let path = entry.path()?.into_owned();
    let link_target = entry
        .link_name()?
        .map(|target| target.into_owned())
        .filter(|target| !target.as_os_str().is_empty());
    let atime = access_time(entry)?;

    let header = entry.header();
    let entry_type = header.entry_type();
    let kind = match link_target {
        _ if entry_type.is_dir() => MemberKind::Directory,
        Some(target) if entry_type.is_hard_link() => MemberKind::HardLink { target },
        Some(target) if entry_type.is_symlink() => MemberKind::Symlink { target },
        _ if entry_type.is_file() || entry_type.is_contiguous() => MemberKind::File,
        _ => MemberKind::Other,
    };

    Ok(ArchiveMember {
        path,
        mode: header.mode()? & 0o7777,
        size: entry.size(),
        mtime: FileTime::from_unix_time(header.mtime()? as i64, 0),
        atime,
        kind,
    })
}

/// Access time from the GNU header field, or else a PAX `atime` record.
fn access_time<R: Read>(entry: &mut tar::Entry<'_, R>) -> io::Result<Option<FileTime>> {
    if let Some(gnu) = entry.header().as_gnu() {
        if let Ok(atime) = gnu.atime() {
            if atime != 0 {
                return Ok(Some(FileTime::from_unix_time(atime as i64, 0)));
            }
        }
    }

    let Some(extensions) = entry.pax_extensions()? else {
        return Ok(None);
    };
    for extension in extensions {
        let extension = extension?;
        if extension.key() != Ok("atime") {
            continue;
        }
        let seconds = extension
            .value()
            .ok()
            .and_then(|value| value.split('.').next())
            .and_then(|secs| secs.parse::<i64>().ok());
        if let Some(seconds) = seconds {
            return Ok(Some(FileTime::from_unix_time(seconds, 0)));
        }
    }
    Ok(None)
}
