//! Extraction of tar and cpio source archives onto disk, and atomic
//! creation of compressed tarballs.
//!
//! # Architecture
//!
//! - `format.rs` - container selection and compression codecs
//! - `entry.rs` - archive members, advisories and extraction results
//! - `sanitize.rs` - member path resolution under the output root
//! - `materialize.rs` - one member onto disk
//! - `extract/` - tar and cpio member sources
//! - `create.rs` - directory tree into a published archive
//!
//! Fatal problems are returned as [`Error`]. Metadata that could not be
//! applied, and members of unsupported types, are reported as
//! [`Advisory`] values for the caller to surface.

pub use create::{ARCHIVE_MODE, archive_path, create_archive, create_archive_with};
pub use entry::{Advisory, ArchiveMember, Extraction, MemberKind, SOLUTION_SUFFIX};
pub use error::{Error, Result};
pub use extract::{
    CpioHeader, CpioMembers, CpioReader, MemberSource, TarMembers, extract_archive,
    extract_archive_with, extract_cpio, extract_members, extract_tar,
};
pub use format::{ArchiveFormat, Compression, Decoder, Encoder};
pub use materialize::materialize;
pub use options::CancelFlag;
pub use sanitize::resolve_member_path;

mod create;
pub mod entry;
mod error;
pub mod extract;
pub mod format;
mod materialize;
mod options;
mod sanitize;
