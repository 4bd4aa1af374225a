pub mod atomic_write;
pub mod dir;
pub mod hardlink;
pub mod symlink;

pub use atomic_write::{AtomicFile, AtomicWriteOptions};
pub use dir::{DEFAULT_DIR_MODE, create_dir_all};
pub use hardlink::hard_link;
pub use symlink::symlink;
