//! Block graph model
//!
//! Nodes, slots and fields of a block program, the static shape
//! declarations of block types and the per-node mutation state that
//! changes a node's slot set at edit time.

pub mod error;
pub mod mutation;
pub mod node;
pub mod shape;
pub mod workspace;

pub use error::{ModelError, MutationError, Result};
pub use mutation::{
    ConnectionMode, MutationKind, MutationRecord, MutationState, OptionKind, MAX_REPEAT_COUNT,
};
pub use node::{Connection, FieldValue, Node, NodeId, Slot, SlotKind};
pub use shape::{FieldSpec, MutationShape, ShapeCatalog, ShapeDescriptor, SlotSpec};
pub use workspace::Workspace;
