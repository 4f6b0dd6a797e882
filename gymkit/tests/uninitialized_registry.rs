// Runs as its own binary: nothing here may call `registry::init`.
use gymkit::catalog::{self, CatalogError};
use gymkit::env::EnvError;
use gymkit::registry::{self, EnvOptions};

#[test]
fn queries_fail_until_init() {
    assert!(matches!(
        catalog::list_registered(),
        Err(CatalogError::Registry(EnvError::RegistryUnavailable(_)))
    ));
    assert!(matches!(
        registry::ids(),
        Err(EnvError::RegistryUnavailable(_))
    ));
    assert!(matches!(
        registry::make("Blackjack-v1", &EnvOptions::new()),
        Err(EnvError::RegistryUnavailable(_))
    ));
}
