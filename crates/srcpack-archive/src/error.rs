use std::io;
use std::path::PathBuf;

use crate::format::Compression;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported archive format '{}'", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("unknown compression type '{0}'")]
    UnknownCompression(String),

    #[error("{0} compression is only supported for reading")]
    ReadOnlyCompression(Compression),

    #[error("{0} support was not compiled in")]
    CodecDisabled(Compression),

    #[error("failed to initialize {compression} codec: {source}")]
    CodecInit {
        compression: Compression,
        source: io::Error,
    },

    #[error("failed to open archive '{}': {source}", archive.display())]
    Open { archive: PathBuf, source: io::Error },

    #[error("failed to initialize decompression of '{}': {source}", archive.display())]
    Decompress { archive: PathBuf, source: io::Error },

    #[error("failed to read archive '{}': {source}", archive.display())]
    ReadArchive { archive: PathBuf, source: io::Error },

    #[error("member '{}' resolves outside of the output directory", member.display())]
    UnsafePath { member: PathBuf },

    #[error("failed to ensure parent directory '{}': {source}", path.display())]
    DirectoryCreationFailed { path: PathBuf, source: srcpack_fs::Error },

    #[error("failed to extract member '{}': {source}", member.display())]
    ExtractionFailed { member: PathBuf, source: io::Error },

    #[error("short write extracting member '{}': {written}/{expected} bytes", member.display())]
    ShortWrite {
        member: PathBuf,
        written: u64,
        expected: u64,
    },

    #[error("hard link '{}' points at '{}', which has not been extracted", member.display(), target.display())]
    MissingLinkTarget { member: PathBuf, target: PathBuf },

    #[error("failed to create hard link '{}': {source}", member.display())]
    HardlinkCreationFailed { member: PathBuf, source: srcpack_fs::Error },

    #[error("failed to create symlink '{}' -> '{}': {source}", member.display(), target.display())]
    SymlinkCreationFailed {
        member: PathBuf,
        target: PathBuf,
        source: srcpack_fs::Error,
    },

    #[error("failed to write archive '{}': {source}", path.display())]
    CreateFailed { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Fs(#[from] srcpack_fs::Error),

    #[error("operation cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, Error>;
