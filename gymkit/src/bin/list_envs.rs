//! Prints every registered environment id, one per line, sorted.

use std::io;

use anyhow::Result;
use clap::Parser;

use gymkit::{catalog, registry};

#[derive(Parser, Debug)]
#[command(name = "gymkit-list-envs", version)]
#[command(about = "List registered environment ids", long_about = None)]
struct Args {}

fn main() -> Result<()> {
    gymkit::logging::init();
    let _args = Args::parse();

    registry::init()?;
    let mut out = io::stdout().lock();
    let count = registry::with_registry(|registry| catalog::write(registry, &mut out))??;
    tracing::debug!(count, "listed environments");
    Ok(())
}
