use std::fmt;
use std::path::PathBuf;

use srcpack_fs::FileTime;

/// Suffix of the build marker files collected during extraction.
pub const SOLUTION_SUFFIX: &str = ".sln";

/// One member of an archive stream, as handed to the materializer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveMember {
    /// Name relative to the archive root.
    pub path: PathBuf,
    pub mode: u32,
    pub size: u64,
    pub mtime: FileTime,
    /// `None` leaves the access time unchanged.
    pub atime: Option<FileTime>,
    pub kind: MemberKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemberKind {
    Directory,
    /// Target is relative to the output root and must already be on disk.
    HardLink { target: PathBuf },
    /// Target is stored verbatim.
    Symlink { target: PathBuf },
    File,
    /// Devices, fifos, sockets and anything else that is skipped.
    Other,
}

impl ArchiveMember {
    pub fn is_solution(&self) -> bool {
        self.path.to_string_lossy().ends_with(SOLUTION_SUFFIX)
    }

    pub fn link_target(&self) -> Option<&PathBuf> {
        match &self.kind {
            MemberKind::HardLink { target } | MemberKind::Symlink { target } => Some(target),
            _ => None,
        }
    }
}

/// A non-fatal problem reported alongside a successful result.
#[derive(Debug)]
pub enum Advisory {
    UnsupportedMember { member: PathBuf },
    Permissions { member: PathBuf, source: srcpack_fs::Error },
    Times { member: PathBuf, source: srcpack_fs::Error },
}

impl Advisory {
    pub fn member(&self) -> &std::path::Path {
        match self {
            Self::UnsupportedMember { member }
            | Self::Permissions { member, .. }
            | Self::Times { member, .. } => member,
        }
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedMember { member } => {
                write!(f, "skipping unsupported member '{}'", member.display())
            }
            Self::Permissions { member, source } => {
                write!(f, "could not set mode of '{}': {source}", member.display())
            }
            Self::Times { member, source } => {
                write!(f, "could not set times of '{}': {source}", member.display())
            }
        }
    }
}

/// Outcome of a successful extraction.
#[derive(Debug, Default)]
pub struct Extraction {
    /// Member paths ending in [`SOLUTION_SUFFIX`], in archive order.
    pub solutions: Vec<PathBuf>,
    pub advisories: Vec<Advisory>,
}
