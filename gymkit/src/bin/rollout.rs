//! Makes an environment, prints its spaces and those of its flattened
//! observation, then takes random actions, resetting after every episode.
//!
//! Usage: cargo run --bin gymkit-rollout -- --env FrozenLake-v1 -o is_slippery=false

use std::io;

use anyhow::{Result, anyhow};
use clap::Parser;

use gymkit::registry::{self, EnvOptions, OptionPair, Registry};
use gymkit::rollout::{self, RolloutConfig};

#[derive(Parser, Debug)]
#[command(name = "gymkit-rollout", version)]
#[command(about = "Run an environment with random actions", long_about = None)]
struct Args {
    /// Environment id
    #[arg(long, default_value = "Blackjack-v1")]
    env: String,

    /// Number of steps to take
    #[arg(long, default_value_t = 1000)]
    steps: u64,

    /// Seed for the first reset and the action sampler
    #[arg(long)]
    seed: Option<u64>,

    /// human, ansi, rgb_array or none
    #[arg(long, default_value = "human")]
    render_mode: String,

    /// Environment option as key=value, repeatable
    #[arg(short = 'o', long = "option", value_name = "KEY=VALUE")]
    options: Vec<OptionPair>,
}

fn main() -> Result<()> {
    gymkit::logging::init();
    let args = Args::parse();

    let defaults = RolloutConfig::default();
    // Blackjack starts from natural=false, sab=false; -o overrides either
    let mut options = if args.env == defaults.env_id {
        defaults.options
    } else {
        EnvOptions::new()
    };
    options
        .set("render_mode", args.render_mode.clone().into())
        .map_err(|e| anyhow!("invalid --render-mode: {e}"))?;
    for OptionPair { key, value } in args.options {
        options
            .set(&key, value)
            .map_err(|e| anyhow!("invalid option `{key}`: {e}"))?;
    }

    let config = RolloutConfig {
        env_id: args.env,
        options,
        iterations: args.steps,
        seed: args.seed,
    };

    registry::init()?;
    let summary = registry::with_registry(|registry: &Registry| {
        rollout::run(registry, &config, &mut io::stdout().lock())
    })??;

    tracing::info!(
        resets = summary.resets,
        episodes = summary.episodes,
        "done"
    );
    Ok(())
}
