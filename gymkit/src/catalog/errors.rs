use thiserror::Error;

use crate::env::EnvError;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error(transparent)]
    Registry(#[from] EnvError),

    #[error("failed to write catalog: {0}")]
    Output(#[from] std::io::Error),
}
