//! Model error types

use crate::node::NodeId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Unregistered block type: {block_type}")]
    UnregisteredType { block_type: String },

    #[error("Node not found: {id}")]
    NodeNotFound { id: NodeId },

    #[error("Node {id} has no slot named {slot}")]
    SlotNotFound { id: NodeId, slot: String },

    #[error("Slot {slot} on node {id} does not accept connections")]
    NotConnectable { id: NodeId, slot: String },

    #[error("Connecting {child} under {parent} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },

    #[error("Node ids exhausted")]
    IdsExhausted,

    #[error("Mutation error: {0}")]
    Mutation(#[from] MutationError),
}

impl ModelError {
    pub fn unregistered(block_type: impl Into<String>) -> Self {
        Self::UnregisteredType {
            block_type: block_type.into(),
        }
    }

    pub fn slot_not_found(id: NodeId, slot: impl Into<String>) -> Self {
        Self::SlotNotFound {
            id,
            slot: slot.into(),
        }
    }
}

/// Errors raised while reading a persisted mutation record
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Malformed mutation attribute {attribute}: {message}")]
    Malformed { attribute: String, message: String },

    #[error("Mutation kind mismatch: expected {expected}, found {found}")]
    KindMismatch { expected: String, found: String },
}

impl MutationError {
    pub fn malformed(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            attribute: attribute.into(),
            message: message.into(),
        }
    }
}
