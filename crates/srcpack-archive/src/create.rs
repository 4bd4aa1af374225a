use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use srcpack_fs::{AtomicFile, AtomicWriteOptions};
use tracing::{debug, info, info_span};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::format::Compression;
use crate::options::CancelFlag;

/// Mode of a published archive.
pub const ARCHIVE_MODE: u32 = 0o644;

/// Archive `source` into `<base><ext>`, where the extension follows from
/// `compression` (`.tar`, `.tar.gz` or `.tar.zst`).
///
/// The archive is written to a temporary file next to the destination and
/// renamed into place only once it is complete.
pub fn create_archive(
    source: impl AsRef<Path>,
    base: impl AsRef<Path>,
    compression: Compression,
) -> Result<PathBuf> {
    create_archive_with(source, base, compression, &CancelFlag::new())
}

pub fn create_archive_with(
    source: impl AsRef<Path>,
    base: impl AsRef<Path>,
    compression: Compression,
    cancel: &CancelFlag,
) -> Result<PathBuf> {
    let source = source.as_ref();
    if !compression.is_writable() {
        return Err(Error::ReadOnlyCompression(compression));
    }
    let destination = archive_path(base.as_ref(), compression);

    let _span = info_span!("create", source = %source.display(), %compression).entered();
    cancel.check()?;
    info!(destination = %destination.display(), "creating archive");

    let file = AtomicFile::create(
        &destination,
        AtomicWriteOptions::new()
            .permissions(ARCHIVE_MODE)
            .sync(true)
            .extension(compression.archive_extension()),
    )?;
    let write_failed = |source| Error::CreateFailed {
        path: destination.clone(),
        source,
    };

    let encoder = compression
        .encoder(file.as_file())
        .map_err(|e| match e {
            Error::CodecInit { source, .. } => write_failed(source),
            other => other,
        })?;
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);

    let skip = file.path().file_name().map(OsString::from);
    let members = append_tree(&mut builder, source, skip.as_deref()).map_err(write_failed)?;

    let encoder = builder.into_inner().map_err(write_failed)?;
    encoder.finish().map_err(write_failed)?;

    cancel.check()?;
    let published = file.commit()?;
    info!(members, path = %published.display(), "archive created");
    Ok(published)
}

/// `<base><ext>` for the given codec.
pub fn archive_path(base: &Path, compression: Compression) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(compression.archive_extension());
    PathBuf::from(name)
}

/// Serialize everything below `source` in sorted order, parents first.
fn append_tree<W: Write>(
    builder: &mut tar::Builder<W>,
    source: &Path,
    skip: Option<&std::ffi::OsStr>,
) -> io::Result<usize> {
    let mut links = HardLinks::default();
    let mut members = 0usize;

    for entry in WalkDir::new(source)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry?;
        if skip.is_some() && skip == Some(entry.file_name()) {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(io::Error::other)?;
        let file_type = entry.file_type();
        debug!(member = %relative.display(), "adding");

        if file_type.is_dir() {
            builder.append_dir(relative, entry.path())?;
        } else if file_type.is_file() {
            let metadata = entry.metadata()?;
            match links.first_path(&metadata, relative) {
                Some(first) => {
                    let mut header = tar::Header::new_gnu();
                    header.set_metadata_in_mode(&metadata, tar::HeaderMode::Complete);
                    header.set_entry_type(tar::EntryType::Link);
                    header.set_size(0);
                    builder.append_link(&mut header, relative, first)?;
                }
                None => builder.append_path_with_name(entry.path(), relative)?,
            }
        } else {
            builder.append_path_with_name(entry.path(), relative)?;
        }
        members += 1;
    }

    Ok(members)
}

/// First archived path of every multiply-linked inode.
#[derive(Default)]
struct HardLinks {
    #[cfg(unix)]
    seen: std::collections::HashMap<(u64, u64), PathBuf>,
}

impl HardLinks {
    /// The path to link to when this inode was already written.
    #[cfg(unix)]
    fn first_path(&mut self, metadata: &std::fs::Metadata, relative: &Path) -> Option<PathBuf> {
        use std::collections::hash_map::Entry;
        use std::os::unix::fs::MetadataExt;

        if metadata.nlink() < 2 {
            return None;
        }
        match self.seen.entry((metadata.dev(), metadata.ino())) {
            Entry::Occupied(first) => Some(first.get().clone()),
            Entry::Vacant(slot) => {
                slot.insert(relative.to_path_buf());
                None
            }
        }
    }

    #[cfg(not(unix))]
    fn first_path(&mut self, _metadata: &std::fs::Metadata, _relative: &Path) -> Option<PathBuf> {
        None
    }
}
