use std::fmt;

use uuid::Uuid;

use crate::env::errors::EnvError;
use crate::env::traits::Env;
use crate::env::types::{EnvMetadata, Info, RenderFrame, Step};
use crate::spaces::{Element, Space};

/// An environment made through the registry.
///
/// Owns the (already wrapped) environment and closes it exactly once: either
/// through [`EnvHandle::close`] or, failing that, on drop.
pub struct EnvHandle {
    id: Uuid,
    env_id: String,
    env: Box<dyn Env>,
    closed: bool,
}

// Manual Debug implementation, the boxed env has no Debug bound
impl fmt::Debug for EnvHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvHandle")
            .field("id", &self.id)
            .field("env_id", &self.env_id)
            .field("closed", &self.closed)
            .finish()
    }
}

impl EnvHandle {
    pub(crate) fn new(env_id: impl Into<String>, env: Box<dyn Env>) -> Self {
        let handle = Self {
            id: Uuid::new_v4(),
            env_id: env_id.into(),
            env,
            closed: false,
        };
        tracing::info!(handle = %handle.id, env_id = %handle.env_id, "environment created");
        handle
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The registry id this handle was made from.
    pub fn env_id(&self) -> &str {
        &self.env_id
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<(), EnvError> {
        if self.closed {
            Err(EnvError::Closed)
        } else {
            Ok(())
        }
    }
}

impl Env for EnvHandle {
    fn metadata(&self) -> &EnvMetadata {
        self.env.metadata()
    }

    fn action_space(&self) -> &Space {
        self.env.action_space()
    }

    fn observation_space(&self) -> &Space {
        self.env.observation_space()
    }

    fn reset(&mut self, seed: Option<u64>) -> Result<(Element, Info), EnvError> {
        self.ensure_open()?;
        tracing::debug!(handle = %self.id, ?seed, "reset");
        self.env.reset(seed)
    }

    fn step(&mut self, action: &Element) -> Result<Step, EnvError> {
        self.ensure_open()?;
        self.env.step(action)
    }

    fn render(&mut self) -> Result<Option<RenderFrame>, EnvError> {
        self.ensure_open()?;
        self.env.render()
    }

    /// Idempotent; only the first call reaches the environment.
    fn close(&mut self) -> Result<(), EnvError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        tracing::info!(handle = %self.id, env_id = %self.env_id, "environment closed");
        self.env.close()
    }
}

impl Drop for EnvHandle {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.close() {
                tracing::warn!(handle = %self.id, "failed to close environment on drop: {e}");
            }
        }
    }
}
