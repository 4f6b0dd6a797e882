use crate::env::errors::EnvError;
use crate::env::types::{EnvMetadata, Info, RenderFrame, Step};
use crate::spaces::{Element, Space};

/// A simulated decision process: observations out, actions in.
///
/// Object safe so the registry can hand out `Box<dyn Env>`; wrappers take any
/// `E: Env`, including `&mut EnvHandle`, which lets a wrapper borrow a handle
/// for a while and give it back.
pub trait Env: Send {
    fn metadata(&self) -> &EnvMetadata;
    fn action_space(&self) -> &Space;
    fn observation_space(&self) -> &Space;

    /// Start a new episode. A seed reseeds the environment's own RNG.
    fn reset(&mut self, seed: Option<u64>) -> Result<(Element, Info), EnvError>;
    fn step(&mut self, action: &Element) -> Result<Step, EnvError>;

    fn render(&mut self) -> Result<Option<RenderFrame>, EnvError> {
        Ok(None)
    }

    fn close(&mut self) -> Result<(), EnvError> {
        Ok(())
    }
}

impl<E: Env + ?Sized> Env for Box<E> {
    fn metadata(&self) -> &EnvMetadata {
        (**self).metadata()
    }

    fn action_space(&self) -> &Space {
        (**self).action_space()
    }

    fn observation_space(&self) -> &Space {
        (**self).observation_space()
    }

    fn reset(&mut self, seed: Option<u64>) -> Result<(Element, Info), EnvError> {
        (**self).reset(seed)
    }

    fn step(&mut self, action: &Element) -> Result<Step, EnvError> {
        (**self).step(action)
    }

    fn render(&mut self) -> Result<Option<RenderFrame>, EnvError> {
        (**self).render()
    }

    fn close(&mut self) -> Result<(), EnvError> {
        (**self).close()
    }
}

impl<E: Env + ?Sized> Env for &mut E {
    fn metadata(&self) -> &EnvMetadata {
        (**self).metadata()
    }

    fn action_space(&self) -> &Space {
        (**self).action_space()
    }

    fn observation_space(&self) -> &Space {
        (**self).observation_space()
    }

    fn reset(&mut self, seed: Option<u64>) -> Result<(Element, Info), EnvError> {
        (**self).reset(seed)
    }

    fn step(&mut self, action: &Element) -> Result<Step, EnvError> {
        (**self).step(action)
    }

    fn render(&mut self) -> Result<Option<RenderFrame>, EnvError> {
        (**self).render()
    }

    fn close(&mut self) -> Result<(), EnvError> {
        (**self).close()
    }
}

/// Rejects actions outside `space`.
pub fn ensure_action(space: &Space, action: &Element) -> Result<(), EnvError> {
    if space.contains(action) {
        Ok(())
    } else {
        Err(EnvError::InvalidAction {
            action: action.to_string(),
            space: space.to_string(),
        })
    }
}
