/// Errors produced by the layout engine.
///
/// Only caller-contract violations surface here: structural defects inside
/// an accepted layout body are repaired by the normalizer, never raised.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Field descriptor at index {index} has neither a code nor a resolvable type")]
    MissingFieldIdentity { index: usize },

    #[error("Internal error: {0}")]
    Internal(String),
}
