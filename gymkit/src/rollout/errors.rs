use thiserror::Error;

use crate::env::EnvError;

#[derive(Error, Debug)]
pub enum RolloutError {
    #[error(transparent)]
    Env(#[from] EnvError),

    #[error("failed to write rollout output: {0}")]
    Output(#[from] std::io::Error),
}
