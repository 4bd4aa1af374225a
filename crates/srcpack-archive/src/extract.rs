//! Archive extraction for tar and cpio streams.
//!
//! Each container provides a [`MemberSource`]; [`extract_members`] drives
//! it through the materializer, collecting solution files and advisories.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::{debug, info, info_span};

use crate::entry::{ArchiveMember, Extraction};
use crate::error::{Error, Result};
use crate::format::{ArchiveFormat, Compression};
use crate::materialize::materialize;
use crate::options::CancelFlag;

mod cpio;
mod tar;

pub use cpio::{CpioHeader, CpioMembers, CpioReader};
pub use tar::TarMembers;

/// A container format read sequentially, one member at a time.
pub trait MemberSource {
    fn archive_path(&self) -> &Path;

    /// Call `visit` for every member in stream order with a reader over
    /// that member's content. Stops at the first error.
    fn for_each_member(
        &mut self,
        visit: &mut dyn FnMut(ArchiveMember, &mut dyn Read) -> Result<()>,
    ) -> Result<()>;
}

/// Extract `archive` into `out_dir`, choosing the container from its file
/// name (`.cpio`, `.obscpio`, `.tar`, `.tar.gz` or `.tar.zst`).
///
/// Unsupported names are rejected before anything is opened or created.
pub fn extract_archive(archive: impl AsRef<Path>, out_dir: impl AsRef<Path>) -> Result<Extraction> {
    extract_archive_with(archive, out_dir, &CancelFlag::new())
}

pub fn extract_archive_with(
    archive: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    cancel: &CancelFlag,
) -> Result<Extraction> {
    let archive = archive.as_ref();
    match ArchiveFormat::from_path(archive)? {
        ArchiveFormat::Cpio => extract_cpio(archive, out_dir, cancel),
        ArchiveFormat::Tar(compression) => {
            extract_tar_with(archive, out_dir.as_ref(), compression, cancel)
        }
    }
}

/// Extract a tar archive whose codec is given by its last extension
/// (`.tar`, `.gz`, `.bz2` or `.zst`).
pub fn extract_tar(
    archive: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    cancel: &CancelFlag,
) -> Result<Extraction> {
    let archive = archive.as_ref();
    let compression = Compression::from_suffix(archive)?;
    extract_tar_with(archive, out_dir.as_ref(), compression, cancel)
}

fn extract_tar_with(
    archive: &Path,
    out_dir: &Path,
    compression: Compression,
    cancel: &CancelFlag,
) -> Result<Extraction> {
    let _span = info_span!("extract", archive = %archive.display(), format = "tar", %compression)
        .entered();
    cancel.check()?;

    let file = open(archive)?;
    let decoder = compression.decoder(file).map_err(|e| match e {
        Error::CodecInit { source, .. } => Error::Decompress {
            archive: archive.to_path_buf(),
            source,
        },
        other => other,
    })?;
    let mut members = TarMembers::new(archive, decoder);
    extract_members(&mut members, out_dir, cancel)
}

pub fn extract_cpio(
    archive: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    cancel: &CancelFlag,
) -> Result<Extraction> {
    let archive = archive.as_ref();
    let _span = info_span!("extract", archive = %archive.display(), format = "cpio").entered();
    cancel.check()?;

    let file = open(archive)?;
    let mut members = CpioMembers::new(archive, file);
    extract_members(&mut members, out_dir.as_ref(), cancel)
}

/// Materialize every member of `source` under `out_dir`.
pub fn extract_members<S: MemberSource + ?Sized>(
    source: &mut S,
    out_dir: &Path,
    cancel: &CancelFlag,
) -> Result<Extraction> {
    info!(archive = %source.archive_path().display(), out_dir = %out_dir.display(), "extracting");

    let mut extraction = Extraction::default();
    let mut members = 0usize;
    source.for_each_member(&mut |member, content| {
        cancel.check()?;
        debug!(member = %member.path.display(), kind = ?member.kind, size = member.size, "member");

        let advisories = materialize(out_dir, &member, content)?;
        extraction.advisories.extend(advisories);
        if member.is_solution() {
            extraction.solutions.push(member.path);
        }
        members += 1;
        Ok(())
    })?;

    info!(
        members,
        solutions = extraction.solutions.len(),
        advisories = extraction.advisories.len(),
        "extraction finished"
    );
    Ok(extraction)
}

fn open(archive: &Path) -> Result<BufReader<File>> {
    File::open(archive)
        .map(BufReader::new)
        .map_err(|source| Error::Open {
            archive: archive.to_path_buf(),
            source,
        })
}
