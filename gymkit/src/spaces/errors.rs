use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpaceError {
    #[error("expected {expected} values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("element {element} does not belong to {space}")]
    KindMismatch { space: String, element: String },

    #[error("segment {segment:?} is not a one-hot vector")]
    InvalidOneHot { segment: Vec<f32> },

    #[error("invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("{0} has no values")]
    Empty(String),
}
