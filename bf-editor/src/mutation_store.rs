//! Mutation state access for nodes
//!
//! Every state change goes through the shape synchronizer before
//! returning, so a node's slots always match its stored state.

use crate::error::{EditError, Result};
use crate::reconcile::{ReconcileReport, ShapeSynchronizer};
use bf_model::{MutationKind, MutationRecord, MutationState, NodeId, ShapeCatalog, Workspace};
use tracing::debug;

pub struct MutationStore<'a> {
    catalog: &'a dyn ShapeCatalog,
    spawn_shadows: bool,
}

impl<'a> MutationStore<'a> {
    pub fn new(catalog: &'a dyn ShapeCatalog) -> Self {
        Self {
            catalog,
            spawn_shadows: true,
        }
    }

    /// Store used while loading documents, which carry their own shadows
    pub fn for_loading(catalog: &'a dyn ShapeCatalog) -> Self {
        Self {
            catalog,
            spawn_shadows: false,
        }
    }

    fn synchronizer(&self) -> ShapeSynchronizer<'a> {
        let sync = ShapeSynchronizer::new(self.catalog);
        if self.spawn_shadows {
            sync
        } else {
            sync.without_shadows()
        }
    }

    fn kind_of(&self, ws: &Workspace, id: NodeId) -> Result<MutationKind> {
        let block_type = &ws.node(id)?.block_type;
        self.catalog
            .shape(block_type)
            .map(|shape| shape.mutation_kind())
            .ok_or_else(|| EditError::unregistered(block_type.clone()))
    }

    pub fn get_state(&self, ws: &Workspace, id: NodeId) -> Result<MutationState> {
        Ok(ws.node(id)?.mutation.clone())
    }

    /// Replace the state of `id` and reconcile its slots
    pub fn set_state(
        &self,
        ws: &mut Workspace,
        id: NodeId,
        state: MutationState,
    ) -> Result<ReconcileReport> {
        let mirrored = state.field_value();
        let report = self.synchronizer().reconcile(ws, id, state)?;

        let block_type = ws.node(id)?.block_type.clone();
        let driver = self
            .catalog
            .shape(&block_type)
            .and_then(|shape| shape.mutation.as_ref())
            .and_then(|m| m.driven_by);
        if let Some((field, value)) = driver.zip(mirrored) {
            ws.node_mut(id)?.fields.insert(field.to_string(), value);
        }
        Ok(report)
    }

    pub fn serialize(state: &MutationState) -> MutationRecord {
        MutationRecord::from_state(state)
    }

    pub fn deserialize(kind: MutationKind, record: &MutationRecord) -> Result<MutationState> {
        Ok(MutationState::from_record(kind, record)?)
    }

    /// Snapshot the state of `id`
    pub fn save(&self, ws: &Workspace, id: NodeId) -> Result<MutationRecord> {
        Ok(Self::serialize(&ws.node(id)?.mutation))
    }

    /// Rebuild the state of `id` from a persisted record, upgrading legacy
    /// encodings, and reconcile
    pub fn restore(
        &self,
        ws: &mut Workspace,
        id: NodeId,
        record: &MutationRecord,
    ) -> Result<ReconcileReport> {
        let kind = self.kind_of(ws, id)?;
        let state = Self::deserialize(kind, record)?;
        debug!("Restoring {} mutation on {}", kind, id);
        self.set_state(ws, id, state)
    }
}
