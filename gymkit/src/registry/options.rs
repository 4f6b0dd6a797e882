use std::str::FromStr;

use serde_json::{Map, Value};

use crate::env::{ConfigurationError, RenderMode};

/// Options passed to [`Registry::make`](super::Registry::make).
///
/// `render_mode` and `max_episode_steps` are understood by the registry
/// itself; everything in `kwargs` goes to the environment's entry point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvOptions {
    pub render_mode: Option<RenderMode>,
    pub max_episode_steps: Option<u32>,
    pub kwargs: Map<String, Value>,
}

impl EnvOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_render_mode(mut self, mode: RenderMode) -> Self {
        self.render_mode = Some(mode);
        self
    }

    pub fn with_max_episode_steps(mut self, steps: u32) -> Self {
        self.max_episode_steps = Some(steps);
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    /// Routes `key` to the matching field, or into `kwargs`.
    pub fn set(&mut self, key: &str, value: Value) -> Result<(), String> {
        match key {
            "render_mode" => {
                self.render_mode = match value {
                    Value::Null => None,
                    Value::String(s) if s == "none" => None,
                    Value::String(s) => Some(s.parse()?),
                    other => return Err(format!("render_mode must be a string, got {other}")),
                };
            }
            "max_episode_steps" => {
                self.max_episode_steps = match value {
                    Value::Null => None,
                    other => Some(
                        other
                            .as_u64()
                            .and_then(|n| u32::try_from(n).ok())
                            .filter(|&n| n > 0)
                            .ok_or_else(|| {
                                format!("max_episode_steps must be a positive integer, got {other}")
                            })?,
                    ),
                };
            }
            _ => {
                self.kwargs.insert(key.to_string(), value);
            }
        }
        Ok(())
    }

    pub fn from_pairs<I>(pairs: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = OptionPair>,
    {
        let mut options = Self::new();
        for OptionPair { key, value } in pairs {
            options.set(&key, value)?;
        }
        Ok(options)
    }
}

/// One `key=value` option. The value is read as JSON when it parses and as a
/// plain string otherwise, so `natural=false` is a bool and `map_name=8x8`
/// a string.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionPair {
    pub key: String,
    pub value: Value,
}

impl FromStr for OptionPair {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, raw) = s
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got `{s}`"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("missing option name in `{s}`"));
        }
        let raw = raw.trim();
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        Ok(Self {
            key: key.to_string(),
            value,
        })
    }
}

/// Keyword arguments handed to an entry point. Each read removes the key, so
/// whatever is left over afterwards was not understood by the environment.
#[derive(Debug)]
pub struct Kwargs {
    env: String,
    values: Map<String, Value>,
}

impl Kwargs {
    pub fn new(env: impl Into<String>, values: Map<String, Value>) -> Self {
        Self {
            env: env.into(),
            values,
        }
    }

    pub fn env(&self) -> &str {
        &self.env
    }

    fn invalid(&self, key: &str, reason: impl Into<String>) -> ConfigurationError {
        ConfigurationError::InvalidOption {
            env: self.env.clone(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn bool(&mut self, key: &str, default: bool) -> Result<bool, ConfigurationError> {
        match self.values.remove(key) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(b),
            Some(other) => Err(self.invalid(key, format!("expected a bool, got {other}"))),
        }
    }

    pub fn string(&mut self, key: &str, default: &str) -> Result<String, ConfigurationError> {
        match self.values.remove(key) {
            None => Ok(default.to_string()),
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(self.invalid(key, format!("expected a string, got {other}"))),
        }
    }

    pub fn strings(&mut self, key: &str) -> Result<Option<Vec<String>>, ConfigurationError> {
        match self.values.remove(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    other => Err(self.invalid(key, format!("expected strings, got {other}"))),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Some),
            Some(other) => Err(self.invalid(key, format!("expected a list of strings, got {other}"))),
        }
    }

    /// Errors on the first option nobody consumed.
    pub fn finish(self) -> Result<(), ConfigurationError> {
        match self.values.into_iter().next() {
            None => Ok(()),
            Some((key, _)) => Err(ConfigurationError::UnknownOption { env: self.env, key }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pairs_parse_as_json_then_string() {
        let p: OptionPair = "natural=false".parse().unwrap();
        assert_eq!(p.value, json!(false));
        let p: OptionPair = "map_name=8x8".parse().unwrap();
        assert_eq!(p.value, json!("8x8"));
        let p: OptionPair = r#"desc=["SF","HG"]"#.parse().unwrap();
        assert_eq!(p.value, json!(["SF", "HG"]));
        assert!("natural".parse::<OptionPair>().is_err());
        assert!("=1".parse::<OptionPair>().is_err());
    }

    #[test]
    fn reserved_keys_route_to_fields() {
        let pairs = ["render_mode=ansi", "max_episode_steps=20", "sab=true"]
            .into_iter()
            .map(|p| p.parse().unwrap());
        let options = EnvOptions::from_pairs(pairs).unwrap();
        assert_eq!(options.render_mode, Some(RenderMode::Ansi));
        assert_eq!(options.max_episode_steps, Some(20));
        assert_eq!(options.kwargs.get("sab"), Some(&json!(true)));
        assert!(!options.kwargs.contains_key("render_mode"));

        let mut options = EnvOptions::new().with_render_mode(RenderMode::Human);
        options.set("render_mode", json!("none")).unwrap();
        assert_eq!(options.render_mode, None);
        assert!(options.set("render_mode", json!("window")).is_err());
        assert!(options.set("max_episode_steps", json!(-1)).is_err());
        assert!(options.set("max_episode_steps", json!(0)).is_err());
        assert_eq!(options.max_episode_steps, None);
        options.set("max_episode_steps", json!(1)).unwrap();
        assert_eq!(options.max_episode_steps, Some(1));
    }

    #[test]
    fn kwargs_track_unconsumed_keys() {
        let mut values = Map::new();
        values.insert("natural".into(), json!(true));
        values.insert("bogus".into(), json!(1));
        let mut kwargs = Kwargs::new("Blackjack-v1", values);
        assert!(kwargs.bool("natural", false).unwrap());
        assert!(!kwargs.bool("sab", false).unwrap());
        assert_eq!(
            kwargs.finish(),
            Err(ConfigurationError::UnknownOption {
                env: "Blackjack-v1".into(),
                key: "bogus".into()
            })
        );
    }

    #[test]
    fn kwargs_reject_wrong_types() {
        let mut values = Map::new();
        values.insert("natural".into(), json!("yes"));
        let mut kwargs = Kwargs::new("Blackjack-v1", values);
        assert!(matches!(
            kwargs.bool("natural", false),
            Err(ConfigurationError::InvalidOption { .. })
        ));
    }
}
