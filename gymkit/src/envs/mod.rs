//! Environments shipped with the crate.
mod blackjack;
mod cartpole;
mod frozen_lake;

pub use blackjack::Blackjack;
pub use cartpole::CartPole;
pub use frozen_lake::{FrozenLake, MAP_4X4, MAP_8X8};

use crate::env::ConfigurationError;
use crate::registry::{EnvSpec, Registry};

/// Registers every built-in environment with its default options.
pub fn register_builtins(registry: &mut Registry) -> Result<(), ConfigurationError> {
    registry.register(
        EnvSpec::new("Blackjack-v1", Blackjack::entry_point)
            .kwarg("natural", false)
            .kwarg("sab", false),
    )?;
    registry.register(
        EnvSpec::new("CartPole-v1", CartPole::entry_point)
            .max_episode_steps(500)
            .reward_threshold(475.0),
    )?;
    registry.register(
        EnvSpec::new("FrozenLake-v1", FrozenLake::entry_point)
            .kwarg("map_name", "4x4")
            .max_episode_steps(100)
            .reward_threshold(0.70),
    )?;
    registry.register(
        EnvSpec::new("FrozenLake8x8-v1", FrozenLake::entry_point)
            .kwarg("map_name", "8x8")
            .max_episode_steps(200)
            .reward_threshold(0.85),
    )?;
    Ok(())
}
