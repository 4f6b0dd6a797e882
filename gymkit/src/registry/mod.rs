// gymkit/src/registry/mod.rs
mod global;
mod options;

pub use global::{ids, init, make, register, with_registry};
pub use options::{EnvOptions, Kwargs, OptionPair};

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::env::{
    ConfigurationError, Env, EnvError, EnvHandle, OrderEnforcing, RenderMode, TimeLimit,
};

/// Builds a fresh, unwrapped environment. Options it does not read are
/// reported back to the caller as unknown.
pub type EntryPoint = fn(&mut Kwargs, Option<RenderMode>) -> Result<Box<dyn Env>, EnvError>;

/// `[namespace/]name[-vN]`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EnvId {
    pub namespace: Option<String>,
    pub name: String,
    pub version: Option<u32>,
}

impl FromStr for EnvId {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ConfigurationError::MalformedId(s.to_string());
        let valid = |part: &str| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '.' | '-'))
        };

        let (namespace, rest) = match s.split_once('/') {
            Some((ns, rest)) => (Some(ns), rest),
            None => (None, s),
        };
        if namespace.is_some_and(|ns| !valid(ns)) {
            return Err(malformed());
        }

        let (name, version) = match rest.rsplit_once("-v") {
            Some((name, digits)) if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) => {
                (name, Some(digits.parse().map_err(|_| malformed())?))
            }
            _ => (rest, None),
        };
        if !valid(name) {
            return Err(malformed());
        }

        Ok(Self {
            namespace: namespace.map(str::to_string),
            name: name.to_string(),
            version,
        })
    }
}

impl fmt::Display for EnvId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ns) = &self.namespace {
            write!(f, "{ns}/")?;
        }
        f.write_str(&self.name)?;
        if let Some(v) = self.version {
            write!(f, "-v{v}")?;
        }
        Ok(())
    }
}

/// Everything the registry knows about one environment id.
#[derive(Debug, Clone)]
pub struct EnvSpec {
    pub id: String,
    pub entry_point: EntryPoint,
    pub max_episode_steps: Option<u32>,
    pub reward_threshold: Option<f64>,
    pub nondeterministic: bool,
    pub order_enforce: bool,
    /// Defaults for the entry point, overridden by caller options.
    pub kwargs: Map<String, Value>,
}

impl EnvSpec {
    pub fn new(id: impl Into<String>, entry_point: EntryPoint) -> Self {
        Self {
            id: id.into(),
            entry_point,
            max_episode_steps: None,
            reward_threshold: None,
            nondeterministic: false,
            order_enforce: true,
            kwargs: Map::new(),
        }
    }

    pub fn max_episode_steps(mut self, steps: u32) -> Self {
        self.max_episode_steps = Some(steps);
        self
    }

    pub fn reward_threshold(mut self, threshold: f64) -> Self {
        self.reward_threshold = Some(threshold);
        self
    }

    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    pub fn nondeterministic(mut self) -> Self {
        self.nondeterministic = true;
        self
    }

    pub fn without_order_enforcing(mut self) -> Self {
        self.order_enforce = false;
        self
    }
}

/// Maps environment ids to their specs. Ids iterate in ascending order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    specs: BTreeMap<String, EnvSpec>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the environments shipped with this crate.
    pub fn with_builtins() -> Result<Self, ConfigurationError> {
        let mut registry = Self::new();
        crate::envs::register_builtins(&mut registry)?;
        Ok(registry)
    }

    pub fn register(&mut self, spec: EnvSpec) -> Result<(), ConfigurationError> {
        let parsed: EnvId = spec.id.parse()?;
        if parsed.to_string() != spec.id {
            return Err(ConfigurationError::MalformedId(spec.id));
        }
        if self.specs.contains_key(&spec.id) {
            return Err(ConfigurationError::DuplicateId(spec.id));
        }
        tracing::debug!(id = %spec.id, "registered environment");
        self.specs.insert(spec.id.clone(), spec);
        Ok(())
    }

    pub fn spec(&self, id: &str) -> Result<&EnvSpec, ConfigurationError> {
        if let Some(spec) = self.specs.get(id) {
            return Ok(spec);
        }
        let wanted: EnvId = id.parse()?;
        Err(ConfigurationError::UnknownEnvironment {
            id: id.to_string(),
            suggestion: self.suggest(&wanted),
        })
    }

    // Same name under another version first, then a case-insensitive match.
    fn suggest(&self, wanted: &EnvId) -> Option<String> {
        let known: Vec<EnvId> = self.specs.keys().filter_map(|k| k.parse().ok()).collect();
        known
            .iter()
            .filter(|k| k.namespace == wanted.namespace && k.name == wanted.name)
            .max_by_key(|k| k.version)
            .or_else(|| {
                let lower = wanted.to_string().to_lowercase();
                known.iter().find(|k| k.to_string().to_lowercase() == lower)
            })
            .map(|k| k.to_string())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.specs.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Registered ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.specs.keys().map(String::as_str)
    }

    pub fn specs(&self) -> impl Iterator<Item = &EnvSpec> {
        self.specs.values()
    }

    /// Builds the environment registered under `id`.
    ///
    /// The result is wrapped in [`TimeLimit`] when the spec or the options set
    /// a step limit, and in [`OrderEnforcing`] unless the spec opted out.
    pub fn make(&self, id: &str, options: &EnvOptions) -> Result<EnvHandle, EnvError> {
        let spec = self.spec(id)?;

        let mut values = spec.kwargs.clone();
        values.extend(options.kwargs.clone());
        let mut kwargs = Kwargs::new(id, values);
        let env = (spec.entry_point)(&mut kwargs, options.render_mode)?;
        kwargs.finish()?;

        if let Some(mode) = options.render_mode {
            let metadata = env.metadata();
            if !metadata.supports(mode) {
                return Err(ConfigurationError::UnsupportedRenderMode {
                    env: id.to_string(),
                    mode: mode.to_string(),
                    supported: metadata.render_modes.iter().map(|m| m.to_string()).collect(),
                }
                .into());
            }
        }

        let mut env = env;
        if let Some(limit) = options.max_episode_steps.or(spec.max_episode_steps) {
            env = Box::new(TimeLimit::new(env, limit));
        }
        if spec.order_enforce {
            env = Box::new(OrderEnforcing::new(env));
        }
        Ok(EnvHandle::new(id, env))
    }
}
