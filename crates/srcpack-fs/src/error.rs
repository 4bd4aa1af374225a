use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to write '{}': {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to create directory '{}': {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("link target '{}' does not exist", target.display())]
    MissingTarget { target: PathBuf },

    #[error("failed to set permissions on '{}': {source}", path.display())]
    Permissions { path: PathBuf, source: io::Error },

    #[error("failed to set file times on '{}': {source}", path.display())]
    Times { path: PathBuf, source: io::Error },

    #[error("failed to persist '{}' as '{}': {source}", from.display(), to.display())]
    Persist {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The path the failed operation was acting on.
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Write { path, .. }
            | Self::CreateDir { path, .. }
            | Self::Permissions { path, .. }
            | Self::Times { path, .. } => path,
            Self::MissingTarget { target } => target,
            Self::Persist { to, .. } => to,
        }
    }
}
