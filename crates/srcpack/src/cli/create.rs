use std::path::PathBuf;

use anyhow::Context;
use srcpack_archive::Compression;

/// Pack a directory into `<outdir>/<output><ext>`.
#[derive(Debug, clap::Args)]
pub struct Create {
    /// Directory to archive.
    source: PathBuf,
    /// Base name of the archive, without extension.
    #[arg(long, default_value = "packages")]
    output: String,
    #[arg(long)]
    outdir: Option<PathBuf>,
    /// none, gzip or zstd.
    #[arg(long, default_value_t = Compression::Gzip)]
    compression: Compression,
}

impl Create {
    pub fn base(&self) -> PathBuf {
        match &self.outdir {
            Some(dir) => dir.join(&self.output),
            None => PathBuf::from(&self.output),
        }
    }

    pub fn run(self) -> anyhow::Result<()> {
        let base = self.base();
        let archive = srcpack_archive::create_archive(&self.source, &base, self.compression)
            .with_context(|| format!("failed to archive {}", self.source.display()))?;
        println!("{}", archive.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(outdir: Option<&str>) -> Create {
        Create {
            source: PathBuf::from("src"),
            output: "packages".to_string(),
            outdir: outdir.map(PathBuf::from),
            compression: Compression::Gzip,
        }
    }

    #[test]
    fn base_joins_outdir() {
        assert_eq!(create(Some("out")).base(), PathBuf::from("out/packages"));
        assert_eq!(create(None).base(), PathBuf::from("packages"));
    }
}
