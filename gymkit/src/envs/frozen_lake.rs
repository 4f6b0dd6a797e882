//! Crossing a frozen lake from start (`S`) to goal (`G`) without falling into
//! a hole (`H`). Frozen tiles (`F`) are safe.
//!
//! Actions: `0` left, `1` down, `2` right, `3` up. On slippery ice the agent
//! moves in the intended direction with probability 1/3 and in each of the
//! two perpendicular directions with probability 1/3. Reaching the goal pays
//! 1; every other transition pays 0. Holes and the goal end the episode.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

use crate::env::{
    ConfigurationError, Env, EnvError, EnvMetadata, Info, RenderFrame, RenderMode, Step,
    ensure_action, show_human,
};
use crate::registry::Kwargs;
use crate::spaces::{Element, Space, SpaceError};

static METADATA: EnvMetadata = EnvMetadata {
    render_modes: &[RenderMode::Human, RenderMode::Ansi],
    render_fps: Some(4),
};

pub const MAP_4X4: [&str; 4] = ["SFFF", "FHFH", "FFFH", "HFFG"];

pub const MAP_8X8: [&str; 8] = [
    "SFFFFFFF", "FFFFFFFF", "FFFHFFFF", "FFFFFHFF", "FFFHFFFF", "FHHFFFHF", "FHFFHFHF", "FFFHFFFG",
];

const LEFT: usize = 0;
const DOWN: usize = 1;
const RIGHT: usize = 2;
const UP: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tile {
    Start,
    Frozen,
    Hole,
    Goal,
}

impl Tile {
    fn parse(c: char) -> Option<Self> {
        match c {
            'S' => Some(Self::Start),
            'F' => Some(Self::Frozen),
            'H' => Some(Self::Hole),
            'G' => Some(Self::Goal),
            _ => None,
        }
    }

    fn symbol(self) -> char {
        match self {
            Self::Start => 'S',
            Self::Frozen => 'F',
            Self::Hole => 'H',
            Self::Goal => 'G',
        }
    }

    fn is_terminal(self) -> bool {
        matches!(self, Self::Hole | Self::Goal)
    }
}

pub struct FrozenLake {
    rows: usize,
    cols: usize,
    tiles: Vec<Tile>,
    start: usize,
    is_slippery: bool,
    render_mode: Option<RenderMode>,
    action_space: Space,
    observation_space: Space,
    rng: StdRng,
    state: Option<usize>,
    last_action: Option<usize>,
}

impl FrozenLake {
    /// Builds a lake from rows of `S`/`F`/`H`/`G`. The map must be
    /// rectangular and hold exactly one start tile.
    pub fn new<S: AsRef<str>>(
        desc: &[S],
        is_slippery: bool,
        render_mode: Option<RenderMode>,
    ) -> Result<Self, ConfigurationError> {
        let invalid = ConfigurationError::InvalidMap;
        let rows = desc.len();
        let cols = desc.first().map_or(0, |row| row.as_ref().chars().count());
        if rows == 0 || cols == 0 {
            return Err(invalid("map is empty".into()));
        }

        let mut tiles = Vec::with_capacity(rows * cols);
        for (r, row) in desc.iter().enumerate() {
            let row = row.as_ref();
            if row.chars().count() != cols {
                let reason = format!("row {r} has {} tiles, expected {cols}", row.chars().count());
                return Err(invalid(reason));
            }
            for c in row.chars() {
                let tile = Tile::parse(c).ok_or_else(|| invalid(format!("unknown tile `{c}` in row {r}")))?;
                tiles.push(tile);
            }
        }

        let starts: Vec<usize> = tiles
            .iter()
            .enumerate()
            .filter(|(_, t)| **t == Tile::Start)
            .map(|(i, _)| i)
            .collect();
        let &[start] = starts.as_slice() else {
            let reason = format!("map needs exactly one start tile, found {}", starts.len());
            return Err(invalid(reason));
        };
        let space_error = |e: SpaceError| invalid(e.to_string());

        Ok(Self {
            rows,
            cols,
            tiles,
            start,
            is_slippery,
            render_mode,
            action_space: Space::discrete(4).map_err(space_error)?,
            observation_space: Space::discrete((rows * cols) as u64).map_err(space_error)?,
            rng: StdRng::from_os_rng(),
            state: None,
            last_action: None,
        })
    }

    pub(crate) fn entry_point(
        kwargs: &mut Kwargs,
        render_mode: Option<RenderMode>,
    ) -> Result<Box<dyn Env>, EnvError> {
        let desc = kwargs.strings("desc")?;
        let map_name = kwargs.string("map_name", "4x4")?;
        let is_slippery = kwargs.bool("is_slippery", true)?;

        // A custom map wins over `map_name`.
        let lake = match desc {
            Some(desc) => Self::new(&desc, is_slippery, render_mode)?,
            None => {
                let map: &[&str] = match map_name.as_str() {
                    "4x4" => &MAP_4X4,
                    "8x8" => &MAP_8X8,
                    other => {
                        return Err(ConfigurationError::InvalidOption {
                            env: kwargs.env().to_string(),
                            key: "map_name".into(),
                            reason: format!("expected `4x4` or `8x8`, got `{other}`"),
                        }
                        .into());
                    }
                };
                Self::new(map, is_slippery, render_mode)?
            }
        };
        Ok(Box::new(lake))
    }

    fn moved(&self, state: usize, action: usize) -> usize {
        let (mut row, mut col) = (state / self.cols, state % self.cols);
        match action {
            LEFT => col = col.saturating_sub(1),
            DOWN => row = (row + 1).min(self.rows - 1),
            RIGHT => col = (col + 1).min(self.cols - 1),
            UP => row = row.saturating_sub(1),
            _ => {}
        }
        row * self.cols + col
    }

    fn ansi(&self) -> String {
        let mut out = String::new();
        if let Some(action) = self.last_action {
            let name = ["Left", "Down", "Right", "Up"][action];
            out.push_str(&format!("  ({name})\n"));
        }
        for r in 0..self.rows {
            for c in 0..self.cols {
                let i = r * self.cols + c;
                let symbol = self.tiles[i].symbol();
                if self.state == Some(i) {
                    out.push('[');
                    out.push(symbol);
                    out.push(']');
                } else {
                    out.push(' ');
                    out.push(symbol);
                    out.push(' ');
                }
            }
            if r + 1 < self.rows {
                out.push('\n');
            }
        }
        out
    }

    fn render_human(&self) {
        if self.render_mode == Some(RenderMode::Human) {
            show_human(&RenderFrame::Text(self.ansi()));
        }
    }
}

impl Env for FrozenLake {
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
        self.state = Some(self.start);
        self.last_action = None;
        self.render_human();

        let mut info = Info::new();
        info.insert("prob".into(), json!(1.0));
        Ok((Element::Int(self.start as i64), info))
    }

    fn step(&mut self, action: &Element) -> Result<Step, EnvError> {
        ensure_action(&self.action_space, action)?;
        let Some(state) = self.state else {
            return Err(EnvError::Step("agent not placed on the lake, call reset first".into()));
        };
        let intended = action.as_int().unwrap_or_default() as usize;

        let (direction, prob) = if self.is_slippery {
            // One of intended-1, intended, intended+1, equally likely.
            let offset = self.rng.random_range(0..3);
            ((intended + 3 + offset) % 4, 1.0 / 3.0)
        } else {
            (intended, 1.0)
        };

        let next = self.moved(state, direction);
        let tile = self.tiles[next];
        self.state = Some(next);
        self.last_action = Some(direction);
        self.render_human();

        let reward = if tile == Tile::Goal { 1.0 } else { 0.0 };
        let mut step = Step::new(Element::Int(next as i64), reward, tile.is_terminal(), false);
        step.info.insert("prob".into(), json!(prob));
        Ok(step)
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
    use serde_json::Map;

    fn walk(env: &mut FrozenLake, actions: &[usize]) -> Step {
        let mut last = None;
        for &a in actions {
            last = Some(env.step(&Element::Int(a as i64)).unwrap());
        }
        last.unwrap()
    }

    #[test]
    fn deterministic_path_reaches_the_goal() {
        let mut env = FrozenLake::new(&MAP_4X4, false, None).unwrap();
        let (obs, info) = env.reset(Some(0)).unwrap();
        assert_eq!(obs, Element::Int(0));
        assert_eq!(info.get("prob"), Some(&json!(1.0)));

        let step = walk(&mut env, &[DOWN, DOWN, RIGHT, RIGHT, DOWN]);
        assert_eq!(step.observation, Element::Int(14));
        assert!(!step.terminated);
        let step = walk(&mut env, &[RIGHT]);
        assert_eq!(step.observation, Element::Int(15));
        assert!(step.terminated);
        assert_eq!(step.reward, 1.0);
    }

    #[test]
    fn holes_end_the_episode_without_reward() {
        let mut env = FrozenLake::new(&MAP_4X4, false, None).unwrap();
        env.reset(None).unwrap();
        let step = walk(&mut env, &[RIGHT, DOWN]);
        assert_eq!(step.observation, Element::Int(5));
        assert!(step.terminated);
        assert_eq!(step.reward, 0.0);
    }

    #[test]
    fn walls_keep_the_agent_in_place() {
        let mut env = FrozenLake::new(&MAP_4X4, false, None).unwrap();
        env.reset(None).unwrap();
        assert_eq!(walk(&mut env, &[LEFT]).observation, Element::Int(0));
        assert_eq!(walk(&mut env, &[UP]).observation, Element::Int(0));
    }

    #[test]
    fn slippery_moves_never_go_backwards() {
        let mut env = FrozenLake::new(&MAP_8X8, true, None).unwrap();
        env.reset(Some(3)).unwrap();
        for _ in 0..100 {
            env.state = Some(9);
            let step = env.step(&Element::Int(RIGHT as i64)).unwrap();
            // right, or perpendicular up/down; never left to 8
            assert!([10, 1, 17].contains(&step.observation.as_int().unwrap()));
            assert_eq!(step.info.get("prob"), Some(&json!(1.0 / 3.0)));
        }
    }

    #[test]
    fn custom_maps_are_validated() {
        assert!(FrozenLake::new(&["SF", "HG"], true, None).is_ok());
        assert_eq!(
            FrozenLake::new(&["SF", "H"], true, None).err(),
            Some(ConfigurationError::InvalidMap("row 1 has 1 tiles, expected 2".into()))
        );
        assert!(FrozenLake::new(&["SX", "HG"], true, None).is_err());
        assert!(FrozenLake::new(&["FF", "HG"], true, None).is_err());
        assert!(FrozenLake::new::<&str>(&[], true, None).is_err());
    }

    #[test]
    fn entry_point_reads_kwargs() {
        let mut values = Map::new();
        values.insert("map_name".into(), json!("8x8"));
        let mut kwargs = Kwargs::new("FrozenLake-v1", values);
        let env = FrozenLake::entry_point(&mut kwargs, None).unwrap();
        assert_eq!(env.observation_space().to_string(), "Discrete(64)");

        let mut values = Map::new();
        values.insert("map_name".into(), json!("3x3"));
        let mut kwargs = Kwargs::new("FrozenLake-v1", values);
        assert!(matches!(
            FrozenLake::entry_point(&mut kwargs, None),
            Err(EnvError::Configuration(ConfigurationError::InvalidOption { .. }))
        ));
    }

    #[test]
    fn ansi_render_marks_the_agent() {
        let mut env = FrozenLake::new(&["SF", "HG"], false, Some(RenderMode::Ansi)).unwrap();
        env.reset(None).unwrap();
        let frame = env.render().unwrap();
        assert_eq!(frame, Some(RenderFrame::Text("[S] F \n H  G ".into())));
    }
}
