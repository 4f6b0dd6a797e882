use super::{BoxSpace, Dtype, Element, Space, SpaceError};
use std::collections::BTreeMap;

/// Number of values an element of `space` occupies once flattened.
pub fn flatdim(space: &Space) -> usize {
    match space {
        Space::Discrete { n, .. } => *n as usize,
        Space::Box(b) => b.size(),
        Space::MultiBinary { n } => *n,
        Space::MultiDiscrete { nvec } => nvec.iter().map(|&n| n as usize).sum(),
        Space::Tuple { subspaces } => subspaces.iter().map(flatdim).sum(),
        Space::Dict { subspaces } => subspaces.values().map(flatdim).sum(),
    }
}

/// The one-dimensional box that flattened elements of `space` live in.
pub fn flatten_space(space: &Space) -> Space {
    let mut low = Vec::with_capacity(flatdim(space));
    let mut high = Vec::with_capacity(low.capacity());
    let dtype = flat_bounds(space, &mut low, &mut high);
    Space::Box(BoxSpace {
        shape: vec![low.len()],
        low,
        high,
        dtype,
    })
}

fn flat_bounds(space: &Space, low: &mut Vec<f32>, high: &mut Vec<f32>) -> Dtype {
    match space {
        Space::Discrete { n, .. } => one_hot_bounds(low, high, *n as usize),
        Space::MultiBinary { n } => one_hot_bounds(low, high, *n),
        Space::MultiDiscrete { nvec } => {
            one_hot_bounds(low, high, nvec.iter().map(|&n| n as usize).sum())
        }
        Space::Box(b) => {
            low.extend_from_slice(&b.low);
            high.extend_from_slice(&b.high);
            b.dtype
        }
        Space::Tuple { subspaces } => {
            merge_dtypes(subspaces.iter().map(|s| flat_bounds(s, low, high)))
        }
        Space::Dict { subspaces } => {
            merge_dtypes(subspaces.values().map(|s| flat_bounds(s, low, high)))
        }
    }
}

fn one_hot_bounds(low: &mut Vec<f32>, high: &mut Vec<f32>, len: usize) -> Dtype {
    low.extend(std::iter::repeat_n(0.0, len));
    high.extend(std::iter::repeat_n(1.0, len));
    Dtype::Int64
}

fn merge_dtypes(dtypes: impl Iterator<Item = Dtype>) -> Dtype {
    dtypes.fold(Dtype::Int64, |acc, d| {
        if acc == Dtype::Float32 || d == Dtype::Float32 {
            Dtype::Float32
        } else {
            Dtype::Int64
        }
    })
}

pub fn flatten(space: &Space, element: &Element) -> Result<Vec<f32>, SpaceError> {
    let mut out = Vec::with_capacity(flatdim(space));
    flatten_into(space, element, &mut out)?;
    Ok(out)
}

fn flatten_into(space: &Space, element: &Element, out: &mut Vec<f32>) -> Result<(), SpaceError> {
    let mismatch = || SpaceError::KindMismatch {
        space: space.to_string(),
        element: element.to_string(),
    };
    match (space, element) {
        (Space::Discrete { n, start }, Element::Int(x)) => {
            if !space.contains(element) {
                return Err(mismatch());
            }
            push_one_hot(out, *n as usize, (x - start) as usize);
        }
        (Space::Box(b), Element::Array(values)) => {
            if values.len() != b.size() {
                return Err(SpaceError::LengthMismatch {
                    expected: b.size(),
                    actual: values.len(),
                });
            }
            out.extend_from_slice(values);
        }
        (Space::MultiBinary { n }, Element::Binary(bits)) => {
            if bits.len() != *n {
                return Err(SpaceError::LengthMismatch {
                    expected: *n,
                    actual: bits.len(),
                });
            }
            out.extend(bits.iter().map(|&b| b as f32));
        }
        (Space::MultiDiscrete { nvec }, Element::Ints(values)) => {
            if !space.contains(element) {
                return Err(mismatch());
            }
            for (&n, &x) in nvec.iter().zip(values) {
                push_one_hot(out, n as usize, x as usize);
            }
        }
        (Space::Tuple { subspaces }, Element::Tuple(items)) => {
            if items.len() != subspaces.len() {
                return Err(mismatch());
            }
            for (s, e) in subspaces.iter().zip(items) {
                flatten_into(s, e, out)?;
            }
        }
        (Space::Dict { subspaces }, Element::Dict(items)) => {
            if items.len() != subspaces.len() {
                return Err(mismatch());
            }
            for (key, s) in subspaces {
                let e = items.get(key).ok_or_else(mismatch)?;
                flatten_into(s, e, out)?;
            }
        }
        _ => return Err(mismatch()),
    }
    Ok(())
}

fn push_one_hot(out: &mut Vec<f32>, len: usize, index: usize) {
    let at = out.len();
    out.resize(at + len, 0.0);
    out[at + index] = 1.0;
}

/// Inverse of [`flatten`].
pub fn unflatten(space: &Space, flat: &[f32]) -> Result<Element, SpaceError> {
    let expected = flatdim(space);
    if flat.len() != expected {
        return Err(SpaceError::LengthMismatch {
            expected,
            actual: flat.len(),
        });
    }
    let mut pos = 0;
    take(space, flat, &mut pos)
}

fn take(space: &Space, flat: &[f32], pos: &mut usize) -> Result<Element, SpaceError> {
    let element = match space {
        Space::Discrete { n, start } => {
            let index = one_hot_index(segment(flat, pos, *n as usize))?;
            Element::Int(start + index as i64)
        }
        Space::Box(b) => Element::Array(segment(flat, pos, b.size()).to_vec()),
        Space::MultiBinary { n } => {
            Element::Binary(segment(flat, pos, *n).iter().map(|&v| u8::from(v != 0.0)).collect())
        }
        Space::MultiDiscrete { nvec } => {
            let mut values = Vec::with_capacity(nvec.len());
            for &n in nvec {
                values.push(one_hot_index(segment(flat, pos, n as usize))? as i64);
            }
            Element::Ints(values)
        }
        Space::Tuple { subspaces } => {
            let mut items = Vec::with_capacity(subspaces.len());
            for s in subspaces {
                items.push(take(s, flat, pos)?);
            }
            Element::Tuple(items)
        }
        Space::Dict { subspaces } => {
            let mut items = BTreeMap::new();
            for (key, s) in subspaces {
                items.insert(key.clone(), take(s, flat, pos)?);
            }
            Element::Dict(items)
        }
    };
    Ok(element)
}

fn segment<'a>(flat: &'a [f32], pos: &mut usize, len: usize) -> &'a [f32] {
    let s = &flat[*pos..*pos + len];
    *pos += len;
    s
}

fn one_hot_index(values: &[f32]) -> Result<usize, SpaceError> {
    let invalid = || SpaceError::InvalidOneHot {
        segment: values.to_vec(),
    };
    let mut hot = None;
    for (i, &v) in values.iter().enumerate() {
        if v == 1.0 && hot.is_none() {
            hot = Some(i);
        } else if v != 0.0 {
            return Err(invalid());
        }
    }
    hot.ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn blackjack_obs_space() -> Space {
        Space::tuple(vec![
            Space::discrete(32).unwrap(),
            Space::discrete(11).unwrap(),
            Space::discrete(2).unwrap(),
        ])
    }

    #[test]
    fn tuple_of_discretes_flattens_to_one_hot_box() {
        let space = blackjack_obs_space();
        assert_eq!(flatdim(&space), 45);

        let flat_space = flatten_space(&space);
        assert_eq!(flat_space.shape(), Some(vec![45]));
        assert_eq!(flat_space.to_string(), "Box(0, 1, (45,), int64)");

        let obs = Element::Tuple(vec![Element::Int(14), Element::Int(10), Element::Int(1)]);
        let flat = flatten(&space, &obs).unwrap();
        assert_eq!(flat.len(), 45);
        assert_eq!(flat.iter().filter(|&&v| v == 1.0).count(), 3);
        assert_eq!(flat[14], 1.0);
        assert_eq!(flat[32 + 10], 1.0);
        assert_eq!(flat[32 + 11 + 1], 1.0);
        assert!(flat_space.contains(&Element::Array(flat)));
    }

    #[test]
    fn flatten_then_unflatten_recovers_structure() {
        let space = Space::dict([
            ("card", Space::discrete_from(10, 1).unwrap()),
            (
                "pos",
                Space::Box(BoxSpace::uniform(-2.0, 2.0, vec![2, 2], Dtype::Float32).unwrap()),
            ),
            ("flags", Space::multi_binary(3)),
            ("dice", Space::multi_discrete(vec![4, 6]).unwrap()),
            ("pair", blackjack_obs_space()),
        ]);
        let flat_space = flatten_space(&space);
        assert_eq!(flat_space.shape(), Some(vec![flatdim(&space)]));

        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let x = space.sample(&mut rng);
            let flat = flatten(&space, &x).unwrap();
            assert!(flat_space.contains(&Element::Array(flat.clone())));
            assert_eq!(unflatten(&space, &flat).unwrap(), x);
        }
    }

    #[test]
    fn box_flattens_row_major() {
        let b = BoxSpace::new(
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
            vec![10.0; 6],
            vec![2, 3],
            Dtype::Float32,
        )
        .unwrap();
        let space = Space::Box(b);
        match flatten_space(&space) {
            Space::Box(flat) => {
                assert_eq!(flat.shape(), &[6]);
                assert_eq!(flat.low(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
                assert_eq!(flat.dtype(), Dtype::Float32);
            }
            other => panic!("expected a box, got {other}"),
        }
    }

    #[test]
    fn mixed_composites_flatten_to_float() {
        let space = Space::tuple(vec![
            Space::discrete(2).unwrap(),
            Space::Box(BoxSpace::uniform(0.0, 1.0, vec![1], Dtype::Float32).unwrap()),
        ]);
        match flatten_space(&space) {
            Space::Box(flat) => assert_eq!(flat.dtype(), Dtype::Float32),
            other => panic!("expected a box, got {other}"),
        }
    }

    #[test]
    fn rejects_mismatched_input() {
        let space = blackjack_obs_space();
        let err = unflatten(&space, &[0.0; 10]).unwrap_err();
        assert_eq!(err, SpaceError::LengthMismatch { expected: 45, actual: 10 });

        let mut two_hot = vec![0.0; 45];
        two_hot[0] = 1.0;
        two_hot[1] = 1.0;
        assert!(matches!(
            unflatten(&space, &two_hot),
            Err(SpaceError::InvalidOneHot { .. })
        ));

        let out_of_range = Element::Tuple(vec![Element::Int(40), Element::Int(1), Element::Int(0)]);
        assert!(matches!(
            flatten(&space, &out_of_range),
            Err(SpaceError::KindMismatch { .. })
        ));
    }
}
