use crate::env::errors::EnvError;
use crate::env::traits::Env;
use crate::env::types::{EnvMetadata, Info, RenderFrame, Step};
use crate::spaces::{self, Element, Space};

/// Presents observations of the wrapped env as a flat `Box` vector.
///
/// Works over an owned env or a `&mut` borrow of one; in the latter case the
/// original is usable again once the wrapper is dropped.
pub struct FlattenObservation<E> {
    env: E,
    observation_space: Space,
}

impl<E: Env> FlattenObservation<E> {
    pub fn new(env: E) -> Self {
        let observation_space = spaces::flatten_space(env.observation_space());
        Self {
            env,
            observation_space,
        }
    }

    pub fn inner(&self) -> &E {
        &self.env
    }

    pub fn into_inner(self) -> E {
        self.env
    }

    fn flatten(&self, observation: &Element) -> Result<Element, EnvError> {
        let flat = spaces::flatten(self.env.observation_space(), observation)?;
        Ok(Element::Array(flat))
    }
}

impl<E: Env> Env for FlattenObservation<E> {
    fn metadata(&self) -> &EnvMetadata {
        self.env.metadata()
    }

    fn action_space(&self) -> &Space {
        self.env.action_space()
    }

    fn observation_space(&self) -> &Space {
        &self.observation_space
    }

    fn reset(&mut self, seed: Option<u64>) -> Result<(Element, Info), EnvError> {
        let (observation, info) = self.env.reset(seed)?;
        Ok((self.flatten(&observation)?, info))
    }

    fn step(&mut self, action: &Element) -> Result<Step, EnvError> {
        let mut step = self.env.step(action)?;
        step.observation = self.flatten(&step.observation)?;
        Ok(step)
    }

    fn render(&mut self) -> Result<Option<RenderFrame>, EnvError> {
        self.env.render()
    }

    fn close(&mut self) -> Result<(), EnvError> {
        self.env.close()
    }
}

/// Truncates episodes after a fixed number of steps.
pub struct TimeLimit<E> {
    env: E,
    max_episode_steps: u32,
    elapsed: Option<u32>,
}

impl<E: Env> TimeLimit<E> {
    pub fn new(env: E, max_episode_steps: u32) -> Self {
        Self {
            env,
            max_episode_steps,
            elapsed: None,
        }
    }

    pub fn max_episode_steps(&self) -> u32 {
        self.max_episode_steps
    }

    /// Steps taken in the current episode, `None` before the first reset.
    pub fn elapsed_steps(&self) -> Option<u32> {
        self.elapsed
    }
}

impl<E: Env> Env for TimeLimit<E> {
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
        let out = self.env.reset(seed)?;
        self.elapsed = Some(0);
        Ok(out)
    }

    fn step(&mut self, action: &Element) -> Result<Step, EnvError> {
        let Some(elapsed) = self.elapsed.as_mut() else {
            return Err(EnvError::Step("cannot call step before reset".into()));
        };
        let mut step = self.env.step(action)?;
        *elapsed += 1;
        if *elapsed >= self.max_episode_steps {
            step.truncated = true;
        }
        Ok(step)
    }

    fn render(&mut self) -> Result<Option<RenderFrame>, EnvError> {
        self.env.render()
    }

    fn close(&mut self) -> Result<(), EnvError> {
        self.env.close()
    }
}

/// Refuses to step an env that has no episode in progress.
pub struct OrderEnforcing<E> {
    env: E,
    has_reset: bool,
    episode_over: bool,
}

impl<E: Env> OrderEnforcing<E> {
    pub fn new(env: E) -> Self {
        Self {
            env,
            has_reset: false,
            episode_over: false,
        }
    }

    pub fn has_reset(&self) -> bool {
        self.has_reset
    }
}

impl<E: Env> Env for OrderEnforcing<E> {
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
        let out = self.env.reset(seed)?;
        self.has_reset = true;
        self.episode_over = false;
        Ok(out)
    }

    fn step(&mut self, action: &Element) -> Result<Step, EnvError> {
        if !self.has_reset {
            return Err(EnvError::Step("cannot call step before reset".into()));
        }
        if self.episode_over {
            return Err(EnvError::Step(
                "episode is over, call reset before stepping again".into(),
            ));
        }
        let step = self.env.step(action)?;
        self.episode_over = step.is_done();
        Ok(step)
    }

    fn render(&mut self) -> Result<Option<RenderFrame>, EnvError> {
        if !self.has_reset {
            return Err(EnvError::Reset("cannot call render before reset".into()));
        }
        self.env.render()
    }

    fn close(&mut self) -> Result<(), EnvError> {
        self.env.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::types::RenderMode;

    static METADATA: EnvMetadata = EnvMetadata {
        render_modes: &[RenderMode::Ansi],
        render_fps: None,
    };

    // Walks 0..=3 and terminates on reaching 3.
    struct Counter {
        action_space: Space,
        observation_space: Space,
        state: i64,
    }

    impl Counter {
        fn new() -> Self {
            Self {
                action_space: Space::discrete(2).unwrap(),
                observation_space: Space::discrete(4).unwrap(),
                state: 0,
            }
        }
    }

    impl Env for Counter {
        fn metadata(&self) -> &EnvMetadata {
            &METADATA
        }

        fn action_space(&self) -> &Space {
            &self.action_space
        }

        fn observation_space(&self) -> &Space {
            &self.observation_space
        }

        fn reset(&mut self, _seed: Option<u64>) -> Result<(Element, Info), EnvError> {
            self.state = 0;
            Ok((Element::Int(0), Info::new()))
        }

        fn step(&mut self, action: &Element) -> Result<Step, EnvError> {
            self.state = (self.state + action.as_int().unwrap_or(0)).min(3);
            Ok(Step::new(Element::Int(self.state), 1.0, self.state == 3, false))
        }
    }

    #[test]
    fn flatten_wraps_observations() {
        let mut env = FlattenObservation::new(Counter::new());
        assert_eq!(env.observation_space().shape(), Some(vec![4]));
        let (obs, _) = env.reset(None).unwrap();
        assert_eq!(obs, Element::Array(vec![1.0, 0.0, 0.0, 0.0]));
        let step = env.step(&Element::Int(1)).unwrap();
        assert_eq!(step.observation, Element::Array(vec![0.0, 1.0, 0.0, 0.0]));
        assert!(env.observation_space().contains(&step.observation));
    }

    #[test]
    fn flatten_can_borrow_and_give_back() {
        let mut base = Counter::new();
        {
            let wrapped = FlattenObservation::new(&mut base);
            assert_eq!(wrapped.observation_space().to_string(), "Box(0, 1, (4,), int64)");
        }
        base.reset(None).unwrap();
        let step = base.step(&Element::Int(1)).unwrap();
        assert_eq!(step.observation, Element::Int(1));
    }

    #[test]
    fn time_limit_truncates() {
        let mut env = TimeLimit::new(Counter::new(), 2);
        assert!(matches!(env.step(&Element::Int(0)), Err(EnvError::Step(_))));
        env.reset(None).unwrap();
        assert!(!env.step(&Element::Int(0)).unwrap().truncated);
        let step = env.step(&Element::Int(0)).unwrap();
        assert!(step.truncated);
        assert!(!step.terminated);
        assert_eq!(env.elapsed_steps(), Some(2));
        env.reset(None).unwrap();
        assert_eq!(env.elapsed_steps(), Some(0));
    }

    #[test]
    fn order_enforcing_requires_reset_between_episodes() {
        let mut env = OrderEnforcing::new(Counter::new());
        assert!(matches!(env.step(&Element::Int(1)), Err(EnvError::Step(_))));
        assert!(matches!(env.render(), Err(EnvError::Reset(_))));
        env.reset(None).unwrap();
        assert!(env.has_reset());
        env.step(&Element::Int(1)).unwrap();
        env.step(&Element::Int(1)).unwrap();
        assert!(env.step(&Element::Int(1)).unwrap().terminated);
        assert!(matches!(env.step(&Element::Int(1)), Err(EnvError::Step(_))));
        env.reset(None).unwrap();
        assert!(env.step(&Element::Int(0)).is_ok());
    }

    #[test]
    fn order_enforcing_sees_truncation_from_inner_limit() {
        let mut env = OrderEnforcing::new(TimeLimit::new(Counter::new(), 1));
        env.reset(None).unwrap();
        assert!(env.step(&Element::Int(0)).unwrap().truncated);
        assert!(env.step(&Element::Int(0)).is_err());
    }
}
