// gymkit/src/spaces/mod.rs
mod errors;
mod flatten;

pub use errors::SpaceError;
pub use flatten::{flatdim, flatten, flatten_space, unflatten};

use rand::Rng;
use rand_distr::{Distribution, Exp1, StandardNormal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dtype {
    Float32,
    Int64,
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dtype::Float32 => f.write_str("float32"),
            Dtype::Int64 => f.write_str("int64"),
        }
    }
}

/// A (possibly unbounded) box in R^n. Bounds are stored row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxSpace {
    low: Vec<f32>,
    high: Vec<f32>,
    shape: Vec<usize>,
    dtype: Dtype,
}

impl BoxSpace {
    pub fn new(
        low: Vec<f32>,
        high: Vec<f32>,
        shape: Vec<usize>,
        dtype: Dtype,
    ) -> Result<Self, SpaceError> {
        let size: usize = shape.iter().product();
        if low.len() != size || high.len() != size {
            return Err(SpaceError::InvalidBounds(format!(
                "got {} low and {} high values for shape {}",
                low.len(),
                high.len(),
                format_shape(Some(&shape))
            )));
        }
        // NaN bounds fail this comparison too
        if let Some(i) = (0..size).find(|&i| !(low[i] <= high[i])) {
            return Err(SpaceError::InvalidBounds(format!(
                "low[{i}] = {:?} is not below high[{i}] = {:?}",
                low[i], high[i]
            )));
        }
        if dtype == Dtype::Int64 {
            if let Some(i) = (0..size).find(|&i| low[i].ceil() > high[i].floor()) {
                return Err(SpaceError::InvalidBounds(format!(
                    "no integer between low[{i}] = {:?} and high[{i}] = {:?}",
                    low[i], high[i]
                )));
            }
        }
        Ok(Self {
            low,
            high,
            shape,
            dtype,
        })
    }

    /// Same scalar bounds for every dimension.
    pub fn uniform(low: f32, high: f32, shape: Vec<usize>, dtype: Dtype) -> Result<Self, SpaceError> {
        let size: usize = shape.iter().product();
        Self::new(vec![low; size], vec![high; size], shape, dtype)
    }

    pub fn low(&self) -> &[f32] {
        &self.low
    }

    pub fn high(&self) -> &[f32] {
        &self.high
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    pub fn size(&self) -> usize {
        self.low.len()
    }

    pub fn contains(&self, values: &[f32]) -> bool {
        values.len() == self.size()
            && values.iter().enumerate().all(|(i, &v)| {
                v >= self.low[i]
                    && v <= self.high[i]
                    && (self.dtype == Dtype::Float32 || v.fract() == 0.0)
            })
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f32> {
        (0..self.size()).map(|i| self.sample_dim(i, rng)).collect()
    }

    // Bounded dims are uniform, unbounded ones normal, half-bounded ones a
    // shifted exponential.
    fn sample_dim<R: Rng + ?Sized>(&self, i: usize, rng: &mut R) -> f32 {
        let (low, high) = (self.low[i], self.high[i]);
        let value = match (low.is_finite(), high.is_finite()) {
            (true, true) => {
                if self.dtype == Dtype::Int64 {
                    let (lo, hi) = (low.ceil() as i64, high.floor() as i64);
                    return rng.random_range(lo..=hi) as f32;
                }
                let u: f64 = rng.random();
                low as f64 + (high as f64 - low as f64) * u
            }
            (false, false) => StandardNormal.sample(rng),
            (true, false) => {
                let e: f64 = Exp1.sample(rng);
                low as f64 + e
            }
            (false, true) => {
                let e: f64 = Exp1.sample(rng);
                high as f64 - e
            }
        };
        match self.dtype {
            Dtype::Float32 => (value as f32).clamp(low, high),
            Dtype::Int64 => (value.floor() as f32).clamp(low.ceil(), high.floor()),
        }
    }
}

/// Describes the legal values of an observation or action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Space {
    Discrete { n: u64, start: i64 },
    Box(BoxSpace),
    MultiBinary { n: usize },
    MultiDiscrete { nvec: Vec<u64> },
    Tuple { subspaces: Vec<Space> },
    Dict { subspaces: BTreeMap<String, Space> },
}

impl Space {
    pub fn discrete(n: u64) -> Result<Self, SpaceError> {
        Self::discrete_from(n, 0)
    }

    pub fn discrete_from(n: u64, start: i64) -> Result<Self, SpaceError> {
        if n == 0 {
            return Err(SpaceError::Empty("Discrete(0)".into()));
        }
        Ok(Space::Discrete { n, start })
    }

    pub fn multi_binary(n: usize) -> Self {
        Space::MultiBinary { n }
    }

    pub fn multi_discrete(nvec: Vec<u64>) -> Result<Self, SpaceError> {
        if let Some(i) = nvec.iter().position(|&n| n == 0) {
            return Err(SpaceError::Empty(format!("MultiDiscrete dimension {i} of {nvec:?}")));
        }
        Ok(Space::MultiDiscrete { nvec })
    }

    pub fn tuple(subspaces: Vec<Space>) -> Self {
        Space::Tuple { subspaces }
    }

    pub fn dict<K: Into<String>>(subspaces: impl IntoIterator<Item = (K, Space)>) -> Self {
        Space::Dict {
            subspaces: subspaces.into_iter().map(|(k, s)| (k.into(), s)).collect(),
        }
    }

    /// `None` for composite spaces, which have no single shape.
    pub fn shape(&self) -> Option<Vec<usize>> {
        match self {
            Space::Discrete { .. } => Some(Vec::new()),
            Space::Box(b) => Some(b.shape.clone()),
            Space::MultiBinary { n } => Some(vec![*n]),
            Space::MultiDiscrete { nvec } => Some(vec![nvec.len()]),
            Space::Tuple { .. } | Space::Dict { .. } => None,
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Element {
        match self {
            Space::Discrete { n, start } => Element::Int(start + rng.random_range(0..*n) as i64),
            Space::Box(b) => Element::Array(b.sample(rng)),
            Space::MultiBinary { n } => {
                Element::Binary((0..*n).map(|_| rng.random_range(0..=1u8)).collect())
            }
            Space::MultiDiscrete { nvec } => Element::Ints(
                nvec.iter()
                    .map(|&n| rng.random_range(0..n) as i64)
                    .collect(),
            ),
            Space::Tuple { subspaces } => {
                Element::Tuple(subspaces.iter().map(|s| s.sample(rng)).collect())
            }
            Space::Dict { subspaces } => Element::Dict(
                subspaces
                    .iter()
                    .map(|(k, s)| (k.clone(), s.sample(rng)))
                    .collect(),
            ),
        }
    }

    pub fn contains(&self, element: &Element) -> bool {
        match (self, element) {
            (Space::Discrete { n, start }, Element::Int(x)) => {
                *x >= *start && ((*x - *start) as u64) < *n
            }
            (Space::Box(b), Element::Array(v)) => b.contains(v),
            (Space::MultiBinary { n }, Element::Binary(v)) => {
                v.len() == *n && v.iter().all(|&b| b <= 1)
            }
            (Space::MultiDiscrete { nvec }, Element::Ints(v)) => {
                v.len() == nvec.len() && v.iter().zip(nvec).all(|(&x, &n)| x >= 0 && (x as u64) < n)
            }
            (Space::Tuple { subspaces }, Element::Tuple(v)) => {
                v.len() == subspaces.len() && subspaces.iter().zip(v).all(|(s, e)| s.contains(e))
            }
            (Space::Dict { subspaces }, Element::Dict(m)) => {
                m.len() == subspaces.len()
                    && subspaces
                        .iter()
                        .all(|(k, s)| m.get(k).is_some_and(|e| s.contains(e)))
            }
            _ => false,
        }
    }
}

impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Space::Discrete { n, start: 0 } => write!(f, "Discrete({n})"),
            Space::Discrete { n, start } => write!(f, "Discrete({n}, start={start})"),
            Space::Box(b) => {
                let shape = format_shape(Some(&b.shape));
                let scalar_low = b.low.windows(2).all(|w| w[0] == w[1]);
                let scalar_high = b.high.windows(2).all(|w| w[0] == w[1]);
                if scalar_low && scalar_high && !b.low.is_empty() {
                    write!(
                        f,
                        "Box({}, {}, {shape}, {})",
                        format_bound(b.low[0], b.dtype),
                        format_bound(b.high[0], b.dtype),
                        b.dtype
                    )
                } else {
                    write!(
                        f,
                        "Box({}, {}, {shape}, {})",
                        format_bounds(&b.low, b.dtype),
                        format_bounds(&b.high, b.dtype),
                        b.dtype
                    )
                }
            }
            Space::MultiBinary { n } => write!(f, "MultiBinary({n})"),
            Space::MultiDiscrete { nvec } => {
                let parts: Vec<String> = nvec.iter().map(|n| n.to_string()).collect();
                write!(f, "MultiDiscrete([{}])", parts.join(" "))
            }
            Space::Tuple { subspaces } => {
                let parts: Vec<String> = subspaces.iter().map(|s| s.to_string()).collect();
                write!(f, "Tuple({})", parts.join(", "))
            }
            Space::Dict { subspaces } => {
                let parts: Vec<String> = subspaces
                    .iter()
                    .map(|(k, s)| format!("'{k}': {s}"))
                    .collect();
                write!(f, "Dict({})", parts.join(", "))
            }
        }
    }
}

fn format_bound(v: f32, dtype: Dtype) -> String {
    match dtype {
        Dtype::Int64 if v.is_finite() => format!("{}", v as i64),
        _ => format!("{v:?}"),
    }
}

fn format_bounds(values: &[f32], dtype: Dtype) -> String {
    let parts: Vec<String> = values.iter().map(|&v| format_bound(v, dtype)).collect();
    format!("[{}]", parts.join(" "))
}

/// Renders a shape the way tuples print: `()`, `(45,)`, `(2, 3)`, or `None`.
pub fn format_shape(shape: Option<&[usize]>) -> String {
    match shape {
        None => "None".to_string(),
        Some([]) => "()".to_string(),
        Some([n]) => format!("({n},)"),
        Some(dims) => {
            let parts: Vec<String> = dims.iter().map(|d| d.to_string()).collect();
            format!("({})", parts.join(", "))
        }
    }
}

/// A point in some [`Space`]. Box values are stored flat, row-major.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Element {
    Int(i64),
    Array(Vec<f32>),
    Binary(Vec<u8>),
    Ints(Vec<i64>),
    Tuple(Vec<Element>),
    Dict(BTreeMap<String, Element>),
}

impl Element {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Element::Int(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[f32]> {
        match self {
            Element::Array(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join<T: ToString>(items: &[T], sep: &str) -> String {
            items.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(sep)
        }
        match self {
            Element::Int(x) => write!(f, "{x}"),
            Element::Array(v) => {
                let parts: Vec<String> = v.iter().map(|x| format!("{x:?}")).collect();
                write!(f, "[{}]", parts.join(" "))
            }
            Element::Binary(v) => write!(f, "[{}]", join(v, " ")),
            Element::Ints(v) => write!(f, "[{}]", join(v, " ")),
            Element::Tuple(v) if v.len() == 1 => write!(f, "({},)", v[0]),
            Element::Tuple(v) => write!(f, "({})", join(v, ", ")),
            Element::Dict(m) => {
                let parts: Vec<String> = m.iter().map(|(k, e)| format!("'{k}': {e}")).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

impl From<i64> for Element {
    fn from(x: i64) -> Self {
        Element::Int(x)
    }
}

impl From<Vec<f32>> for Element {
    fn from(v: Vec<f32>) -> Self {
        Element::Array(v)
    }
}
