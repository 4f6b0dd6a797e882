//! Classic cart-pole balancing.
//!
//! A pole is hinged to a cart on a frictionless track; actions push the cart
//! left (`0`) or right (`1`) with a fixed force. The episode terminates when
//! the pole leans more than 12 degrees or the cart leaves the track.
//! Observation: `[x, x_dot, theta, theta_dot]`.

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::env::{
    Env, EnvError, EnvMetadata, Info, RenderFrame, RenderMode, Step, ensure_action, show_human,
};
use crate::registry::Kwargs;
use crate::spaces::{BoxSpace, Dtype, Element, Space, SpaceError};

static METADATA: EnvMetadata = EnvMetadata {
    render_modes: &[RenderMode::Human, RenderMode::Ansi],
    render_fps: Some(50),
};

const GRAVITY: f64 = 9.8;
const MASS_CART: f64 = 1.0;
const MASS_POLE: f64 = 0.1;
const TOTAL_MASS: f64 = MASS_CART + MASS_POLE;
const HALF_POLE_LENGTH: f64 = 0.5;
const POLE_MASS_LENGTH: f64 = MASS_POLE * HALF_POLE_LENGTH;
const FORCE_MAG: f64 = 10.0;
const TAU: f64 = 0.02;
const THETA_THRESHOLD: f64 = 12.0 * 2.0 * PI / 360.0;
const X_THRESHOLD: f64 = 2.4;

pub struct CartPole {
    sutton_barto_reward: bool,
    render_mode: Option<RenderMode>,
    action_space: Space,
    observation_space: Space,
    rng: StdRng,
    state: Option<[f64; 4]>,
    steps_beyond_terminated: Option<u32>,
}

impl CartPole {
    pub fn new(sutton_barto_reward: bool, render_mode: Option<RenderMode>) -> Result<Self, SpaceError> {
        // Twice the termination bounds, so failing observations still fit.
        let high = vec![
            (X_THRESHOLD * 2.0) as f32,
            f32::MAX,
            (THETA_THRESHOLD * 2.0) as f32,
            f32::MAX,
        ];
        let low = high.iter().map(|h| -h).collect();
        Ok(Self {
            sutton_barto_reward,
            render_mode,
            action_space: Space::discrete(2)?,
            observation_space: Space::Box(BoxSpace::new(low, high, vec![4], Dtype::Float32)?),
            rng: StdRng::from_os_rng(),
            state: None,
            steps_beyond_terminated: None,
        })
    }

    pub(crate) fn entry_point(
        kwargs: &mut Kwargs,
        render_mode: Option<RenderMode>,
    ) -> Result<Box<dyn Env>, EnvError> {
        let sutton_barto_reward = kwargs.bool("sutton_barto_reward", false)?;
        Ok(Box::new(Self::new(sutton_barto_reward, render_mode)?))
    }

    fn observation(state: &[f64; 4]) -> Element {
        Element::Array(state.iter().map(|&v| v as f32).collect())
    }

    fn ansi(&self) -> String {
        const WIDTH: usize = 41;
        let Some([x, _, theta, _]) = self.state else {
            return "CartPole: not started".to_string();
        };
        let mut track = vec!['-'; WIDTH];
        let t = ((x + X_THRESHOLD) / (2.0 * X_THRESHOLD)).clamp(0.0, 1.0);
        let pos = (t * (WIDTH - 1) as f64).round() as usize;
        track[pos] = if theta > 0.05 {
            '/'
        } else if theta < -0.05 {
            '\\'
        } else {
            '|'
        };
        format!(
            "[{}] x={x:+.3} theta={theta:+.3}",
            track.into_iter().collect::<String>()
        )
    }

    fn render_human(&self) {
        if self.render_mode == Some(RenderMode::Human) {
            show_human(&RenderFrame::Text(self.ansi()));
        }
    }
}

impl Env for CartPole {
    fn metadata(&self) -> &EnvMetadata {
        &METADATA
    }

    fn action_space(&self) -> &Space {
        &self.action_space
    }

    fn observation_space(&self) -> &Space {
        &self.observation_space
    }

    fn reset(&mut self, seed: Option<u64>) -> Result<(Element, Info), EnvError> {
        if let Some(seed) = seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
        let state: [f64; 4] = std::array::from_fn(|_| self.rng.random_range(-0.05..0.05));
        self.state = Some(state);
        self.steps_beyond_terminated = None;
        self.render_human();
        Ok((Self::observation(&state), Info::new()))
    }

    fn step(&mut self, action: &Element) -> Result<Step, EnvError> {
        ensure_action(&self.action_space, action)?;
        let Some([mut x, mut x_dot, mut theta, mut theta_dot]) = self.state else {
            return Err(EnvError::Step("cart-pole not started, call reset first".into()));
        };

        let force = if action.as_int() == Some(1) { FORCE_MAG } else { -FORCE_MAG };
        let (sin_theta, cos_theta) = theta.sin_cos();
        let temp = (force + POLE_MASS_LENGTH * theta_dot * theta_dot * sin_theta) / TOTAL_MASS;
        let theta_acc = (GRAVITY * sin_theta - cos_theta * temp)
            / (HALF_POLE_LENGTH * (4.0 / 3.0 - MASS_POLE * cos_theta * cos_theta / TOTAL_MASS));
        let x_acc = temp - POLE_MASS_LENGTH * theta_acc * cos_theta / TOTAL_MASS;

        // Euler
        x += TAU * x_dot;
        x_dot += TAU * x_acc;
        theta += TAU * theta_dot;
        theta_dot += TAU * theta_acc;
        let state = [x, x_dot, theta, theta_dot];
        self.state = Some(state);

        let terminated = x.abs() > X_THRESHOLD || theta.abs() > THETA_THRESHOLD;
        let reward = if !terminated {
            if self.sutton_barto_reward { 0.0 } else { 1.0 }
        } else if self.steps_beyond_terminated.is_none() {
            // Pole just fell
            self.steps_beyond_terminated = Some(0);
            if self.sutton_barto_reward { -1.0 } else { 1.0 }
        } else {
            tracing::warn!("step called after the episode terminated, call reset first");
            if let Some(n) = self.steps_beyond_terminated.as_mut() {
                *n += 1;
            }
            if self.sutton_barto_reward { -1.0 } else { 0.0 }
        };

        self.render_human();
        Ok(Step::new(Self::observation(&state), reward, terminated, false))
    }

    fn render(&mut self) -> Result<Option<RenderFrame>, EnvError> {
        match self.render_mode {
            Some(RenderMode::Ansi) => Ok(Some(RenderFrame::Text(self.ansi()))),
            Some(RenderMode::Human) => {
                show_human(&RenderFrame::Text(self.ansi()));
                Ok(None)
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_is_small() {
        let mut env = CartPole::new(false, None).unwrap();
        let (obs, _) = env.reset(Some(5)).unwrap();
        let values = obs.as_array().unwrap();
        assert_eq!(values.len(), 4);
        assert!(values.iter().all(|v| v.abs() < 0.05));
        assert!(env.observation_space().contains(&obs));
    }

    #[test]
    fn pushing_one_way_topples_the_pole() {
        let mut env = CartPole::new(false, None).unwrap();
        env.reset(Some(0)).unwrap();
        let mut steps = 0;
        loop {
            let step = env.step(&Element::Int(1)).unwrap();
            steps += 1;
            assert!(env.observation_space().contains(&step.observation));
            assert_eq!(step.reward, 1.0);
            if step.terminated {
                break;
            }
            assert!(steps < 200, "pole never fell");
        }
        // Stepping past the end pays nothing.
        assert_eq!(env.step(&Element::Int(1)).unwrap().reward, 0.0);
    }

    #[test]
    fn sutton_barto_reward_penalizes_failure() {
        let mut env = CartPole::new(true, None).unwrap();
        env.reset(Some(0)).unwrap();
        let mut last = env.step(&Element::Int(0)).unwrap();
        assert_eq!(last.reward, 0.0);
        while !last.terminated {
            last = env.step(&Element::Int(0)).unwrap();
        }
        assert_eq!(last.reward, -1.0);
    }

    #[test]
    fn space_description() {
        let env = CartPole::new(false, None).unwrap();
        assert_eq!(env.observation_space().shape(), Some(vec![4]));
        assert_eq!(env.action_space().to_string(), "Discrete(2)");
    }

    #[test]
    fn step_before_reset_is_an_error() {
        let mut env = CartPole::new(false, None).unwrap();
        assert!(matches!(env.step(&Element::Int(0)), Err(EnvError::Step(_))));
    }
}
