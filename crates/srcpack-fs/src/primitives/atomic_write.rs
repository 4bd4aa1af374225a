use crate::{Error, Result, set_mode};
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Clone, Copy, Debug, Default)]
pub struct AtomicWriteOptions {
    pub permissions: Option<u32>,
    pub sync: bool,
    /// Suffix kept at the end of the temporary file name.
    pub extension: Option<&'static str>,
}

impl AtomicWriteOptions {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn permissions(mut self, mode: u32) -> Self {
        self.permissions = Some(mode);
        self
    }
    pub fn sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }
    pub fn extension(mut self, extension: &'static str) -> Self {
        self.extension = Some(extension);
        self
    }
}

/// A file that only appears at its destination once [`AtomicFile::commit`] succeeds.
///
/// Content is written to a uniquely named temporary file next to the
/// destination, so the final rename never crosses a filesystem boundary.
/// Dropping an uncommitted `AtomicFile` removes the temporary file.
#[derive(Debug)]
pub struct AtomicFile {
    temp: NamedTempFile,
    destination: PathBuf,
    options: AtomicWriteOptions,
}

impl AtomicFile {
    /// Create the temporary file for `destination`.
    ///
    /// For a destination `out/my.pkg.tar.gz` created with the extension
    /// `.tar.gz` the temporary file is named `out/my.pkg.<random>.tar.gz`.
    /// Without an extension only the part after the last dot is kept.
    pub fn create(destination: impl AsRef<Path>, options: AtomicWriteOptions) -> Result<Self> {
        let destination = destination.as_ref().to_path_buf();
        let parent = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let file_name = destination
            .file_name()
            .ok_or_else(|| Error::Write {
                path: destination.clone(),
                source: std::io::Error::other("destination has no file name"),
            })?
            .to_string_lossy()
            .into_owned();
        let (stem, extension) = split_extension(&file_name, options.extension);

        let temp = tempfile::Builder::new()
            .prefix(&format!("{stem}."))
            .suffix(extension)
            .tempfile_in(parent)
            .map_err(|e| Error::Write {
                path: destination.clone(),
                source: e,
            })?;

        Ok(Self {
            temp,
            destination,
            options,
        })
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn as_file(&self) -> &File {
        self.temp.as_file()
    }

    /// Apply the final permissions and rename the temporary file into place.
    pub fn commit(self) -> Result<PathBuf> {
        let Self {
            temp,
            destination,
            options,
        } = self;

        if options.sync {
            temp.as_file().sync_all().map_err(|e| Error::Write {
                path: temp.path().to_path_buf(),
                source: e,
            })?;
        }

        if let Some(mode) = options.permissions {
            set_mode(temp.path(), mode)?;
        }

        temp.persist(&destination).map_err(|e| {
            let from = e.file.path().to_path_buf();
            Error::Persist {
                from,
                to: destination.clone(),
                source: e.error,
            }
        })?;

        Ok(destination)
    }
}

/// Split `my.pkg.tar.gz` into `("my.pkg", ".tar.gz")` given `.tar.gz`,
/// or into `("my.pkg.tar", ".gz")` given nothing.
///
/// A leading dot belongs to the stem.
fn split_extension<'a>(file_name: &'a str, extension: Option<&str>) -> (&'a str, &'a str) {
    let stem = extension
        .and_then(|ext| file_name.strip_suffix(ext))
        .filter(|stem| !stem.is_empty());
    if let Some(stem) = stem {
        return file_name.split_at(stem.len());
    }
    match file_name.rfind('.') {
        Some(index) if index > 0 => file_name.split_at(index),
        _ => (file_name, ""),
    }
}
