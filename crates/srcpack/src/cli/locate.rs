use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use tracing::{debug, info};

/// Archive extensions, in order of preference.
const ARCHIVE_EXTENSIONS: &[&str] = &[".obscpio", ".tar", ".tar.gz", ".tar.zst"];

const SERVICE_PREFIX: &str = "_service:";

/// Print the source archive belonging to the `*.spec` file in a directory.
#[derive(Debug, clap::Args)]
pub struct Locate {
    #[arg(long, default_value = ".")]
    dir: PathBuf,
}

impl Locate {
    pub fn run(self) -> anyhow::Result<()> {
        let archive = locate_archive(&self.dir)?;
        println!("{}", archive.display());
        Ok(())
    }
}

/// Find the archive for the first spec file in `dir` that has one.
///
/// For a spec `<stem>.spec` the candidates are `<stem>*<ext>`, then
/// `_service:*<stem>*<ext>`, for each extension in turn. Services rename
/// spec files to `_service:<service>:<stem>.spec`; only the part after the
/// last colon counts as the stem then.
pub fn locate_archive(dir: &Path) -> anyhow::Result<PathBuf> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))? {
        let entry = entry.with_context(|| format!("failed to list {}", dir.display()))?;
        if let Ok(name) = entry.file_name().into_string() {
            names.push(name);
        }
    }
    names.sort();

    for spec in names.iter().filter_map(|n| n.strip_suffix(".spec")) {
        let stem = spec_stem(spec);
        debug!(spec, stem, "looking for archive");
        if let Some(archive) = find_candidate(&names, stem) {
            info!(archive, "found archive");
            return Ok(dir.join(archive));
        }
    }

    bail!("failed to auto-detect archive name in {}", dir.display())
}

fn spec_stem(spec: &str) -> &str {
    if spec.starts_with(SERVICE_PREFIX) {
        spec.rsplit(':').next().unwrap_or(spec)
    } else {
        spec
    }
}

fn find_candidate<'a>(names: &'a [String], stem: &str) -> Option<&'a str> {
    let patterns: [fn(&str, &str, &str) -> bool; 2] = [matches_plain, matches_service];
    for matches in patterns {
        for ext in ARCHIVE_EXTENSIONS {
            if let Some(name) = names.iter().find(|name| matches(name, stem, ext)) {
                return Some(name.as_str());
            }
        }
    }
    None
}

/// `<stem>*<ext>`
fn matches_plain(name: &str, stem: &str, ext: &str) -> bool {
    name.strip_prefix(stem).is_some_and(|rest| rest.ends_with(ext))
}

/// `_service:*<stem>*<ext>`
fn matches_service(name: &str, stem: &str, ext: &str) -> bool {
    name.strip_prefix(SERVICE_PREFIX)
        .and_then(|rest| rest.strip_suffix(ext))
        .is_some_and(|middle| middle.contains(stem))
}
