//! Filesystem primitives used to materialize archive members and to publish
//! finished archives.
//!
//! - `primitives/dir.rs` - directory chains created with a mode
//! - `primitives/hardlink.rs` - hard links whose target must already exist
//! - `primitives/symlink.rs` - symlinks with verbatim targets
//! - `primitives/atomic_write.rs` - temp-then-rename publishing
//! - `permissions.rs` - mode bits and file times

mod error;
mod permissions;
pub mod primitives;

pub use error::{Error, Result};
pub use filetime::FileTime;
pub use permissions::{set_mode, set_times};
pub use primitives::{
    AtomicFile, AtomicWriteOptions, DEFAULT_DIR_MODE, create_dir_all, hard_link, symlink,
};
