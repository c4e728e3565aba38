//! Editor error types

use bf_model::{ModelError, MutationError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EditError>;

#[derive(Error, Debug)]
pub enum EditError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Mutation error: {0}")]
    Mutation(#[from] MutationError),

    #[error("Shadow block {block_type} spawns itself")]
    ShadowCycle { block_type: String },

    #[error("Document error: {0}")]
    Document(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EditError {
    pub fn unregistered(block_type: impl Into<String>) -> Self {
        EditError::Model(ModelError::unregistered(block_type))
    }

    pub fn document(message: impl Into<String>) -> Self {
        EditError::Document(message.into())
    }

    /// True for the configuration error raised by an unknown block type
    pub fn is_unregistered(&self) -> bool {
        matches!(self, EditError::Model(ModelError::UnregisteredType { .. }))
    }
}
