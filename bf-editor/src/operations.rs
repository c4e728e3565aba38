//! Edit operations on a workspace

use crate::error::Result;
use crate::mutation_store::MutationStore;
use crate::reconcile::{instantiate, ReconcileReport};
use crate::validation::{lint_workspace, LintReport, FIELD_NAME_KEY, INPUT_NAME_KEY};
use bf_model::{FieldValue, MutationState, NodeId, ShapeCatalog, Workspace};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A single structural or field edit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditOperation {
    /// Instantiate a block type at top level
    Create { block_type: String },
    SetField {
        node: NodeId,
        field: String,
        value: FieldValue,
    },
    SetMutation { node: NodeId, state: MutationState },
    Attach {
        parent: NodeId,
        slot: String,
        child: NodeId,
    },
    ConnectNext { prev: NodeId, next: NodeId },
    Detach { node: NodeId },
    Remove { node: NodeId, heal_stack: bool },
    SetEnabled { node: NodeId, enabled: bool },
}

impl EditOperation {
    /// Node the operation is aimed at, if it already exists
    pub fn target(&self) -> Option<NodeId> {
        match self {
            EditOperation::Create { .. } => None,
            EditOperation::SetField { node, .. }
            | EditOperation::SetMutation { node, .. }
            | EditOperation::Detach { node }
            | EditOperation::Remove { node, .. }
            | EditOperation::SetEnabled { node, .. } => Some(*node),
            EditOperation::Attach { parent, .. } => Some(*parent),
            EditOperation::ConnectNext { prev, .. } => Some(*prev),
        }
    }
}

/// What applying an operation produced
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    Created(NodeId),
    Reconciled(ReconcileReport),
    /// Value-slot occupant moved to top level by an attach
    Displaced(Option<NodeId>),
    Removed(Vec<NodeId>),
    Done,
}

/// Applies operations to a workspace, keeping slots reconciled and
/// warnings current
pub struct Editor<'a> {
    workspace: Workspace,
    catalog: &'a dyn ShapeCatalog,
    history: Vec<EditOperation>,
    name_keys: Vec<String>,
    auto_lint: bool,
}

impl<'a> Editor<'a> {
    pub fn new(catalog: &'a dyn ShapeCatalog) -> Self {
        Self::with_workspace(Workspace::new(), catalog)
    }

    pub fn with_workspace(workspace: Workspace, catalog: &'a dyn ShapeCatalog) -> Self {
        Self {
            workspace,
            catalog,
            history: Vec::new(),
            name_keys: vec![FIELD_NAME_KEY.to_string(), INPUT_NAME_KEY.to_string()],
            auto_lint: true,
        }
    }

    pub fn name_keys(mut self, keys: Vec<String>) -> Self {
        self.name_keys = keys;
        self
    }

    pub fn auto_lint(mut self, enabled: bool) -> Self {
        self.auto_lint = enabled;
        self
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn into_workspace(self) -> Workspace {
        self.workspace
    }

    pub fn history(&self) -> &[EditOperation] {
        &self.history
    }

    /// Apply one operation. Failed operations are not recorded.
    pub fn apply(&mut self, op: EditOperation) -> Result<EditOutcome> {
        let outcome = self.apply_inner(&op)?;
        debug!("Applied {:?}", op);
        self.history.push(op);
        if self.auto_lint {
            self.lint();
        }
        Ok(outcome)
    }

    pub fn apply_all(
        &mut self,
        ops: impl IntoIterator<Item = EditOperation>,
    ) -> Result<Vec<EditOutcome>> {
        ops.into_iter().map(|op| self.apply(op)).collect()
    }

    fn apply_inner(&mut self, op: &EditOperation) -> Result<EditOutcome> {
        let ws = &mut self.workspace;
        match op {
            EditOperation::Create { block_type } => {
                Ok(EditOutcome::Created(instantiate(ws, self.catalog, block_type)?))
            }
            EditOperation::SetField { node, field, value } => {
                let driver = self
                    .catalog
                    .shape(&ws.node(*node)?.block_type)
                    .and_then(|shape| shape.mutation.as_ref())
                    .filter(|m| m.driven_by == Some(field.as_str()))
                    .map(|m| m.kind);
                match driver {
                    Some(kind) => {
                        let state = MutationState::from_field(kind, value)?;
                        let report = MutationStore::new(self.catalog).set_state(ws, *node, state)?;
                        ws.set_field(*node, field, value.clone())?;
                        Ok(EditOutcome::Reconciled(report))
                    }
                    None => {
                        ws.set_field(*node, field, value.clone())?;
                        Ok(EditOutcome::Done)
                    }
                }
            }
            EditOperation::SetMutation { node, state } => {
                let report = MutationStore::new(self.catalog).set_state(ws, *node, state.clone())?;
                Ok(EditOutcome::Reconciled(report))
            }
            EditOperation::Attach {
                parent,
                slot,
                child,
            } => Ok(EditOutcome::Displaced(ws.attach(*parent, slot, *child)?)),
            EditOperation::ConnectNext { prev, next } => {
                ws.connect_next(*prev, *next)?;
                Ok(EditOutcome::Done)
            }
            EditOperation::Detach { node } => {
                ws.detach(*node)?;
                Ok(EditOutcome::Done)
            }
            EditOperation::Remove { node, heal_stack } => {
                Ok(EditOutcome::Removed(ws.remove(*node, *heal_stack)?))
            }
            EditOperation::SetEnabled { node, enabled } => {
                ws.set_enabled(*node, *enabled)?;
                Ok(EditOutcome::Done)
            }
        }
    }

    /// Re-run every lint check over the workspace
    pub fn lint(&mut self) -> LintReport {
        let keys: Vec<&str> = self.name_keys.iter().map(String::as_str).collect();
        lint_workspace(&mut self.workspace, &keys)
    }
}

/// Builder for operation sequences
#[derive(Debug, Default)]
pub struct EditOperationBuilder {
    ops: Vec<EditOperation>,
}

impl EditOperationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(mut self, block_type: impl Into<String>) -> Self {
        self.ops.push(EditOperation::Create {
            block_type: block_type.into(),
        });
        self
    }

    pub fn set_field(mut self, node: NodeId, field: impl Into<String>, value: FieldValue) -> Self {
        self.ops.push(EditOperation::SetField {
            node,
            field: field.into(),
            value,
        });
        self
    }

    pub fn set_mutation(mut self, node: NodeId, state: MutationState) -> Self {
        self.ops.push(EditOperation::SetMutation { node, state });
        self
    }

    pub fn attach(mut self, parent: NodeId, slot: impl Into<String>, child: NodeId) -> Self {
        self.ops.push(EditOperation::Attach {
            parent,
            slot: slot.into(),
            child,
        });
        self
    }

    pub fn connect_next(mut self, prev: NodeId, next: NodeId) -> Self {
        self.ops.push(EditOperation::ConnectNext { prev, next });
        self
    }

    pub fn remove(mut self, node: NodeId, heal_stack: bool) -> Self {
        self.ops.push(EditOperation::Remove { node, heal_stack });
        self
    }

    pub fn build(self) -> Vec<EditOperation> {
        self.ops
    }
}
