use kinform_core::CoreError;

use crate::store::StoreError;

/// Errors surfaced by the tool entry points.
///
/// Argument-presence checks are strict, unlike the normalizer's internal
/// leniency: a missing required argument is always fatal. Store failures
/// pass through unchanged as the store's own error.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Missing required argument: {name}")]
    MissingArgument { name: &'static str },

    #[error("Invalid argument {name}: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
