use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{info, warn};

use super::locate::locate_archive;

/// Extract a source archive and print the solution files it contains.
#[derive(Debug, clap::Args)]
pub struct Extract {
    /// Archive to extract; found next to the `*.spec` file when omitted.
    #[arg(long)]
    archive: Option<PathBuf>,
    /// Directory to extract into.
    out_dir: PathBuf,
}

impl Extract {
    pub fn run(self) -> anyhow::Result<()> {
        let archive = match self.archive {
            Some(archive) => archive,
            None => locate_archive(Path::new("."))?,
        };
        info!(archive = %archive.display(), "using archive");

        let extraction = srcpack_archive::extract_archive(&archive, &self.out_dir)
            .with_context(|| format!("failed to extract {}", archive.display()))?;

        for advisory in &extraction.advisories {
            warn!(member = %advisory.member().display(), "{advisory}");
        }
        for solution in &extraction.solutions {
            println!("{}", solution.display());
        }
        Ok(())
    }
}
