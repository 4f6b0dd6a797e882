// gymkit/src/rollout/mod.rs
//! Random-action rollouts: make an environment, describe its spaces, then
//! drive it with uniformly sampled actions.
mod errors;

pub use errors::RolloutError;

use std::fmt;
use std::io::Write;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::env::{Env, EnvError, FlattenObservation, RenderMode};
use crate::registry::{EnvOptions, Registry};
use crate::spaces::{Space, format_shape};

#[derive(Debug, Clone, PartialEq)]
pub struct RolloutConfig {
    pub env_id: String,
    pub options: EnvOptions,
    pub iterations: u64,
    /// Seeds the first reset and the action sampler.
    pub seed: Option<u64>,
}

impl Default for RolloutConfig {
    fn default() -> Self {
        Self {
            env_id: "Blackjack-v1".to_string(),
            options: EnvOptions::new()
                .with_render_mode(RenderMode::Human)
                .with("natural", false)
                .with("sab", false),
            iterations: 1000,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RolloutSummary {
    pub iterations: u64,
    /// Includes the initial reset.
    pub resets: u64,
    /// Finished episodes; an episode still running at the end is not counted.
    pub episodes: u64,
    pub total_reward: f64,
    pub episode_returns: Vec<f64>,
}

/// The spaces of an environment, before and after flattening.
#[derive(Debug, Clone, PartialEq)]
pub struct SpaceReport {
    pub action_space: Space,
    pub observation_space: Space,
    pub flattened_observation_space: Space,
}

impl SpaceReport {
    /// Inspects `env`, flattening its observation space through a
    /// [`FlattenObservation`] that borrows it.
    pub fn describe<E: Env>(env: &mut E) -> Self {
        let action_space = env.action_space().clone();
        let observation_space = env.observation_space().clone();
        let wrapped = FlattenObservation::new(env);
        Self {
            action_space,
            observation_space,
            flattened_observation_space: wrapped.observation_space().clone(),
        }
    }
}

impl fmt::Display for SpaceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines = [
            ("Action space", &self.action_space),
            ("Observation space", &self.observation_space),
            ("Wrapped observation space", &self.flattened_observation_space),
        ];
        for (i, (label, space)) in lines.into_iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            writeln!(f, "{label}: {space}")?;
            write!(f, "{label} shape: {}", format_shape(space.shape().as_deref()))?;
        }
        Ok(())
    }
}

/// Takes `iterations` random steps in an env that was just reset, resetting
/// whenever an episode terminates or is truncated.
pub fn drive<E, R>(env: &mut E, iterations: u64, rng: &mut R) -> Result<RolloutSummary, EnvError>
where
    E: Env + ?Sized,
    R: Rng + ?Sized,
{
    let mut summary = RolloutSummary {
        iterations,
        resets: 1,
        episodes: 0,
        total_reward: 0.0,
        episode_returns: Vec::new(),
    };

    let mut episode_return = 0.0;
    for _ in 0..iterations {
        let action = env.action_space().sample(&mut *rng);
        let step = env.step(&action)?;
        episode_return += step.reward;
        summary.total_reward += step.reward;

        if step.is_done() {
            tracing::debug!(
                terminated = step.terminated,
                truncated = step.truncated,
                episode_return,
                "episode finished"
            );
            summary.episodes += 1;
            summary.episode_returns.push(episode_return);
            episode_return = 0.0;
            env.reset(None)?;
            summary.resets += 1;
        }
    }
    Ok(summary)
}

/// Makes `config.env_id`, writes its space report and initial observation to
/// `out`, drives it for `config.iterations` steps and closes it.
///
/// The handle is closed on every path: explicitly on success, on drop when an
/// error cuts the run short.
pub fn run<W: Write>(
    registry: &Registry,
    config: &RolloutConfig,
    out: &mut W,
) -> Result<RolloutSummary, RolloutError> {
    let mut env = registry.make(&config.env_id, &config.options)?;

    let report = SpaceReport::describe(&mut env);
    writeln!(out, "{report}")?;

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let (observation, info) = env.reset(config.seed)?;
    writeln!(out, "Initial observation: {observation}")?;
    writeln!(out, "Initial info: {}", serde_json::Value::Object(info))?;
    let summary = drive(&mut env, config.iterations, &mut rng)?;

    env.close()?;
    tracing::info!(
        env_id = %config.env_id,
        iterations = summary.iterations,
        episodes = summary.episodes,
        total_reward = summary.total_reward,
        "rollout finished"
    );
    Ok(summary)
}
