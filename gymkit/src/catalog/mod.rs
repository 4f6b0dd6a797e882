//! Listing registered environment ids.
mod errors;

pub use errors::CatalogError;

use std::io::Write;

use crate::registry::{self, Registry};

/// Every id in `registry`, ascending.
pub fn list(registry: &Registry) -> Vec<String> {
    let mut ids: Vec<String> = registry.ids().map(str::to_string).collect();
    ids.sort();
    ids
}

/// Writes one id per line.
pub fn write<W: Write>(registry: &Registry, out: &mut W) -> Result<usize, CatalogError> {
    let ids = list(registry);
    for id in &ids {
        writeln!(out, "{id}")?;
    }
    Ok(ids.len())
}

/// Ids in the process-wide registry, ascending. Fails with
/// `RegistryUnavailable` until [`registry::init`] has run.
pub fn list_registered() -> Result<Vec<String>, CatalogError> {
    let ids = registry::with_registry(list)?;
    tracing::debug!(count = ids.len(), "listed registered environments");
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::EnvSpec;

    #[test]
    fn lists_sorted_ids() {
        let mut registry = Registry::with_builtins().unwrap();
        let entry = registry.spec("CartPole-v1").unwrap().entry_point;
        registry.register(EnvSpec::new("Acrobot-v1", entry)).unwrap();
        registry.register(EnvSpec::new("ALE/Pong-v5", entry)).unwrap();

        let ids = list(&registry);
        assert_eq!(
            ids,
            [
                "ALE/Pong-v5",
                "Acrobot-v1",
                "Blackjack-v1",
                "CartPole-v1",
                "FrozenLake-v1",
                "FrozenLake8x8-v1"
            ]
        );
    }

    #[test]
    fn writes_one_id_per_line() {
        let registry = Registry::with_builtins().unwrap();
        let mut out = Vec::new();
        let count = write(&registry, &mut out).unwrap();
        assert_eq!(count, 4);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Blackjack-v1\nCartPole-v1\nFrozenLake-v1\nFrozenLake8x8-v1\n"
        );
    }

    #[test]
    fn empty_registry_writes_nothing() {
        let mut out = Vec::new();
        assert_eq!(write(&Registry::new(), &mut out).unwrap(), 0);
        assert!(out.is_empty());
    }
}
