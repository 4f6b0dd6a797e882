use crate::spaces::Element;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Auxiliary diagnostics returned alongside observations.
pub type Info = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    pub observation: Element,
    pub reward: f64,
    pub terminated: bool,
    pub truncated: bool,
    pub info: Info,
}

impl Step {
    pub fn new(observation: Element, reward: f64, terminated: bool, truncated: bool) -> Self {
        Self {
            observation,
            reward,
            terminated,
            truncated,
            info: Info::new(),
        }
    }

    /// True once the episode is over and the env needs a reset.
    pub fn is_done(&self) -> bool {
        self.terminated || self.truncated
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    Human,
    Ansi,
    RgbArray,
}

impl RenderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderMode::Human => "human",
            RenderMode::Ansi => "ansi",
            RenderMode::RgbArray => "rgb_array",
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RenderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "human" => Ok(RenderMode::Human),
            "ansi" => Ok(RenderMode::Ansi),
            "rgb_array" => Ok(RenderMode::RgbArray),
            other => Err(format!(
                "unknown render mode `{other}`, expected human, ansi or rgb_array"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderFrame {
    Text(String),
}

impl fmt::Display for RenderFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderFrame::Text(text) => f.write_str(text),
        }
    }
}

/// Static facts about an environment.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvMetadata {
    pub render_modes: &'static [RenderMode],
    pub render_fps: Option<u32>,
}

impl EnvMetadata {
    pub fn supports(&self, mode: RenderMode) -> bool {
        self.render_modes.contains(&mode)
    }
}
