use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Files kept directly inside each `<id>/<version>/` directory.
const PACKAGE_SUFFIXES: &[&str] = &[".nupkg", ".nupkg.sha512", ".nuspec"];

/// Strip a restored NuGet package tree down to its package files.
#[derive(Debug, clap::Args)]
pub struct Prune {
    dir: PathBuf,
}

impl Prune {
    pub fn run(self) -> anyhow::Result<()> {
        let removed = prune(&self.dir)?;
        info!(removed, dir = %self.dir.display(), "pruned package tree");
        Ok(())
    }
}

/// Keep only the `<id>/<version>/` directories and the package files
/// directly inside them. Returns the number of paths removed.
pub fn prune(root: &Path) -> anyhow::Result<usize> {
    info!(root = %root.display(), "removing extraneous files");

    let mut doomed = Vec::new();
    let mut walker = WalkDir::new(root).min_depth(1).sort_by_file_name().into_iter();
    while let Some(entry) = walker.next() {
        let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
        let is_dir = entry.file_type().is_dir();

        let keep = match entry.depth() {
            1 | 2 => is_dir,
            3 => !is_dir && is_package_file(&entry.file_name().to_string_lossy()),
            _ => false,
        };
        if keep {
            continue;
        }
        if is_dir {
            walker.skip_current_dir();
        }
        doomed.push((entry.into_path(), is_dir));
    }

    for (path, is_dir) in &doomed {
        debug!(path = %path.display(), "removing");
        let result = if *is_dir {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        result.with_context(|| format!("failed to remove {}", path.display()))?;
    }
    Ok(doomed.len())
}

fn is_package_file(name: &str) -> bool {
    PACKAGE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}
