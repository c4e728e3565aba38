//! Structural editing of block workspaces
//!
//! Keeps node slots in step with mutation state, applies edit operations,
//! runs the lint checks and reads/writes workspace documents.

pub mod document;
pub mod error;
pub mod mutation_store;
pub mod operations;
pub mod reconcile;
pub mod validation;

pub use document::{BlockDocument, WorkspaceDocument};
pub use error::{EditError, Result};
pub use mutation_store::MutationStore;
pub use operations::{EditOperation, EditOperationBuilder, EditOutcome, Editor};
pub use reconcile::{instantiate, Orphan, OrphanPool, ReconcileReport, ShapeSynchronizer};
pub use validation::{
    check_dropdown_options, check_duplicate_names, lint_workspace, Diagnostic, LintReport,
    FIELD_NAME_KEY, INPUT_NAME_KEY,
};
