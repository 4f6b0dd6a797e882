use std::sync::{OnceLock, RwLock, RwLockReadGuard};

use crate::env::{EnvError, EnvHandle};
use crate::registry::{EnvOptions, EnvSpec, Registry};

// Process-wide registry, filled with the built-ins by `init`
static GLOBAL_REGISTRY: OnceLock<RwLock<Registry>> = OnceLock::new();

/// Initializes the process-wide registry. Safe to call more than once.
pub fn init() -> Result<(), EnvError> {
    if GLOBAL_REGISTRY.get().is_none() {
        let registry = Registry::with_builtins()?;
        // Losing a race here is fine, the winner registered the same built-ins
        let _ = GLOBAL_REGISTRY.set(RwLock::new(registry));
    }
    Ok(())
}

fn global() -> Result<&'static RwLock<Registry>, EnvError> {
    GLOBAL_REGISTRY.get().ok_or_else(|| {
        EnvError::RegistryUnavailable("registry is not initialized, call registry::init first".into())
    })
}

fn read() -> Result<RwLockReadGuard<'static, Registry>, EnvError> {
    global()?
        .read()
        .map_err(|_| EnvError::RegistryUnavailable("registry lock is poisoned".into()))
}

/// Runs `f` against the process-wide registry.
pub fn with_registry<T>(f: impl FnOnce(&Registry) -> T) -> Result<T, EnvError> {
    let registry = read()?;
    Ok(f(&*registry))
}

pub fn register(spec: EnvSpec) -> Result<(), EnvError> {
    let mut registry = global()?
        .write()
        .map_err(|_| EnvError::RegistryUnavailable("registry lock is poisoned".into()))?;
    registry.register(spec)?;
    Ok(())
}

pub fn make(id: &str, options: &EnvOptions) -> Result<EnvHandle, EnvError> {
    read()?.make(id, options)
}

/// All registered ids, ascending.
pub fn ids() -> Result<Vec<String>, EnvError> {
    with_registry(|registry| registry.ids().map(str::to_string).collect())
}
