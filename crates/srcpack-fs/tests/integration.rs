use srcpack_fs::{
    AtomicFile, AtomicWriteOptions, DEFAULT_DIR_MODE, Error, FileTime, create_dir_all, hard_link,
    set_mode, set_times,
};
use std::io::Write;
use tempfile::tempdir;

#[test]
fn test_atomic_file_basic() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("packages.tar");

    let file = AtomicFile::create(&path, AtomicWriteOptions::new()).unwrap();
    file.as_file().write_all(b"hello world").unwrap();
    let published = file.commit().unwrap();

    assert_eq!(published, path);
    assert_eq!(std::fs::read(&path).unwrap(), b"hello world");
}

#[test]
fn test_atomic_file_replaces_existing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("existing.tar");
    std::fs::write(&path, "original").unwrap();

    let file = AtomicFile::create(&path, AtomicWriteOptions::new()).unwrap();
    file.as_file().write_all(b"new content").unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), b"original");
    file.commit().unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), b"new content");
}

#[test]
fn test_atomic_file_abandoned_leaves_nothing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("abandoned.tar.gz");

    {
        let file = AtomicFile::create(&path, AtomicWriteOptions::new()).unwrap();
        file.as_file().write_all(b"partial").unwrap();
    }

    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_atomic_file_missing_directory() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing/out.tar");

    let err = AtomicFile::create(&path, AtomicWriteOptions::new()).unwrap_err();
    assert!(matches!(err, Error::Write { .. }));
}

#[cfg(unix)]
#[test]
fn test_hard_link_shares_inode() {
    use std::os::unix::fs::MetadataExt;

    let dir = tempdir().unwrap();
    let src = dir.path().join("source.txt");
    let dest = dir.path().join("hardlink.txt");
    std::fs::write(&src, "shared content").unwrap();

    hard_link(&src, &dest).unwrap();

    let src_meta = std::fs::metadata(&src).unwrap();
    let dest_meta = std::fs::metadata(&dest).unwrap();
    assert_eq!(src_meta.ino(), dest_meta.ino());
    assert_eq!(src_meta.nlink(), 2);
}

#[test]
fn test_hard_link_missing_target_is_distinct() {
    let dir = tempdir().unwrap();
    let err = hard_link(dir.path().join("nope"), dir.path().join("link")).unwrap_err();
    assert!(matches!(err, Error::MissingTarget { .. }));
    assert_eq!(err.path(), dir.path().join("nope"));
}

#[cfg(unix)]
#[test]
fn test_directory_mode_and_times() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    let path = dir.path().join("nested/dir");
    create_dir_all(&path, DEFAULT_DIR_MODE).unwrap();

    set_mode(&path, 0o750).unwrap();
    let modified = FileTime::from_unix_time(1_234_567_890, 0);
    set_times(&path, None, modified).unwrap();

    let metadata = std::fs::metadata(&path).unwrap();
    assert_eq!(metadata.permissions().mode() & 0o7777, 0o750);
    assert_eq!(FileTime::from_last_modification_time(&metadata), modified);
}

#[cfg(unix)]
#[test]
fn test_symlink_functionality() {
    use srcpack_fs::symlink;

    let dir = tempdir().unwrap();
    let target = dir.path().join("target_file");
    let link = dir.path().join("symlink");

    std::fs::write(&target, "target content").unwrap();
    symlink("target_file", &link).unwrap();

    assert!(link.is_symlink());
    assert_eq!(std::fs::read(&link).unwrap(), b"target content");
}
