//! `srcpack` command line.
//!
//! Extracts source archives into a tree (reporting the `.sln` files found),
//! locates the archive belonging to a package's spec file, prunes restored
//! NuGet trees, and packs a directory into a compressed tarball.

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

mod cli;

#[derive(Parser, Debug)]
#[command(name = "srcpack", about = "Source archive extraction and packaging", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    /// More logging; repeat for trace output.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    #[command(alias = "x")]
    Extract(cli::extract::Extract),
    #[command(alias = "c")]
    Create(cli::create::Create),
    Locate(cli::locate::Locate),
    Prune(cli::prune::Prune),
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!(?cli, "parsed arguments");

    let result = match cli.command {
        Command::Extract(cmd) => cmd.run(),
        Command::Create(cmd) => cmd.run(),
        Command::Locate(cmd) => cmd.run(),
        Command::Prune(cmd) => cmd.run(),
    };

    if let Err(e) = result {
        tracing::error!("{e:#}");
        eprintln!("Error: {e:?}");
        std::process::exit(1);
    }
}
