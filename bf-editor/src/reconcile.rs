//! Shape reconciliation
//!
//! Brings a node's slot list in line with the slots its shape requires for
//! a mutation state. Slots that disappear hand their children to an
//! [`OrphanPool`] keyed by the slot's ordinal position; new slots at the
//! same position and with the same constraint tag take those children
//! back, anything left over is destroyed.

use crate::error::{EditError, Result};
use bf_model::{
    Connection, FieldValue, MutationError, MutationState, NodeId, ShapeCatalog, ShapeDescriptor,
    Slot, SlotKind, SlotSpec, Workspace, MAX_REPEAT_COUNT,
};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use tracing::debug;

/// A slot vacated during reconciliation
#[derive(Debug, Clone, PartialEq)]
pub struct Orphan {
    pub slot: String,
    pub kind: SlotKind,
    pub check: Option<String>,
    pub child: Option<NodeId>,
    pub fields: IndexMap<String, FieldValue>,
}

impl Orphan {
    fn fits(&self, spec: &SlotSpec) -> bool {
        self.kind == spec.kind && self.check == spec.check
    }
}

/// Vacated slots by ordinal position
#[derive(Debug, Default)]
pub struct OrphanPool {
    entries: BTreeMap<usize, Orphan>,
}

impl OrphanPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, position: usize, orphan: Orphan) {
        self.entries.insert(position, orphan);
    }

    /// Take the orphan at `position` if it can fill a slot declared by `spec`
    pub fn claim(&mut self, position: usize, spec: &SlotSpec) -> Option<Orphan> {
        if self.entries.get(&position)?.fits(spec) {
            self.entries.remove(&position)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_remaining(self) -> impl Iterator<Item = (usize, Orphan)> {
        self.entries.into_iter()
    }
}

/// What a reconciliation pass changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    /// Children moved from a removed slot into a new one
    pub reattached: Vec<(String, NodeId)>,
    /// Children destroyed because no slot could take them
    pub discarded: Vec<NodeId>,
    pub shadows: Vec<NodeId>,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.reattached.is_empty()
            && self.discarded.is_empty()
            && self.shadows.is_empty()
    }
}

/// Reconciles node slots against shape descriptors from a catalog
pub struct ShapeSynchronizer<'a> {
    catalog: &'a dyn ShapeCatalog,
    spawn_shadows: bool,
}

impl<'a> ShapeSynchronizer<'a> {
    pub fn new(catalog: &'a dyn ShapeCatalog) -> Self {
        Self {
            catalog,
            spawn_shadows: true,
        }
    }

    /// Leave new slots empty instead of filling them with shadow blocks
    pub fn without_shadows(mut self) -> Self {
        self.spawn_shadows = false;
        self
    }

    fn shape(&self, block_type: &str) -> Result<&'a ShapeDescriptor> {
        self.catalog
            .shape(block_type)
            .ok_or_else(|| EditError::unregistered(block_type))
    }

    /// Reject a state before anything is touched
    fn validate(&self, shape: &ShapeDescriptor, state: &MutationState) -> Result<Vec<SlotSpec>> {
        let expected = shape.mutation_kind();
        if state.kind() != expected {
            return Err(MutationError::KindMismatch {
                expected: expected.to_string(),
                found: state.kind().to_string(),
            }
            .into());
        }
        if let Some(count) = state.count().filter(|n| *n > MAX_REPEAT_COUNT) {
            return Err(MutationError::malformed(
                expected.to_string(),
                format!("count {} exceeds the maximum of {}", count, MAX_REPEAT_COUNT),
            )
            .into());
        }
        let required = shape.required_slots(state);
        if self.spawn_shadows {
            self.check_shadows(&required, &mut vec![shape.block_type.clone()])?;
        }
        Ok(required)
    }

    /// Resolve every shadow that filling `required` would spawn, including
    /// the shadows of those shadows
    fn check_shadows(&self, required: &[SlotSpec], path: &mut Vec<String>) -> Result<()> {
        for spec in required {
            let Some(shadow_type) = &spec.shadow else { continue };
            if path.contains(shadow_type) {
                return Err(EditError::ShadowCycle {
                    block_type: shadow_type.clone(),
                });
            }
            let shadow = self.shape(shadow_type)?;
            let nested = shadow.required_slots(&shadow.default_mutation());
            path.push(shadow_type.clone());
            self.check_shadows(&nested, path)?;
            path.pop();
        }
        Ok(())
    }

    /// Make the slots of `id` exactly those required by `state`
    pub fn reconcile(
        &self,
        ws: &mut Workspace,
        id: NodeId,
        state: MutationState,
    ) -> Result<ReconcileReport> {
        let block_type = ws.node(id)?.block_type.clone();
        let shape = self.shape(&block_type)?;
        let required = self.validate(shape, &state)?;

        let mut report = ReconcileReport::default();
        let mut pool = OrphanPool::new();
        let old_slots = std::mem::take(&mut ws.node_mut(id)?.slots);

        // Vacate slots that are no longer required
        let mut kept: Vec<Slot> = Vec::new();
        for (position, slot) in old_slots.into_iter().enumerate() {
            let still_required = required
                .iter()
                .any(|spec| slot.same_identity(&spec.name, spec.kind, spec.check.as_deref()));
            if still_required {
                kept.push(slot);
                continue;
            }
            if let Some(child) = slot.target {
                if let Ok(node) = ws.node_mut(child) {
                    node.parent = None;
                }
            }
            report.removed.push(slot.name.clone());
            pool.insert(
                position,
                Orphan {
                    slot: slot.name,
                    kind: slot.kind,
                    check: slot.check,
                    child: slot.target,
                    fields: slot.fields,
                },
            );
        }

        // Rebuild in required order
        let mut slots = Vec::with_capacity(required.len());
        let mut fresh = Vec::new();
        for (position, spec) in required.iter().enumerate() {
            if let Some(at) = kept.iter().position(|s| s.name == spec.name) {
                slots.push(kept.remove(at));
                continue;
            }

            let mut slot = Slot::new(spec.name.clone(), spec.kind, spec.check.clone());
            for field in &spec.fields {
                slot.fields.insert(field.name.clone(), field.default.clone());
            }
            report.added.push(spec.name.clone());

            if let Some(orphan) = pool.claim(position, spec) {
                for (name, value) in orphan.fields {
                    if let Some(existing) = slot.fields.get_mut(&name) {
                        *existing = value;
                    }
                }
                if let Some(child) = orphan.child {
                    slot.target = Some(child);
                    report.reattached.push((spec.name.clone(), child));
                }
            }
            fresh.push(position);
            slots.push(slot);
        }

        for (name, child) in &report.reattached {
            if let Ok(node) = ws.node_mut(*child) {
                node.parent = Some(Connection::Slot {
                    node: id,
                    slot: name.clone(),
                });
            }
        }

        let node = ws.node_mut(id)?;
        node.slots = slots;
        node.mutation = state;

        for (_, orphan) in pool.into_remaining() {
            if let Some(child) = orphan.child {
                ws.dispose(child)?;
                report.discarded.push(child);
            }
        }

        if self.spawn_shadows {
            for position in fresh {
                let spec = &required[position];
                let Some(shadow_type) = &spec.shadow else { continue };
                if ws.slot_target(id, &spec.name)?.is_some() {
                    continue;
                }
                let shadow = instantiate(ws, self.catalog, shadow_type)?;
                ws.node_mut(shadow)?.shadow = true;
                ws.attach(id, &spec.name, shadow)?;
                report.shadows.push(shadow);
            }
        }

        if !report.is_noop() {
            debug!(
                "Reconciled {} ({}): +{:?} -{:?} reattached={} discarded={}",
                id,
                block_type,
                report.added,
                report.removed,
                report.reattached.len(),
                report.discarded.len()
            );
        }
        Ok(report)
    }
}

/// Create a node of `block_type` with default fields, default mutation
/// state and the slots that state requires
pub fn instantiate(
    ws: &mut Workspace,
    catalog: &dyn ShapeCatalog,
    block_type: &str,
) -> Result<NodeId> {
    let synchronizer = ShapeSynchronizer::new(catalog);
    let shape = synchronizer.shape(block_type)?;
    let state = shape.default_mutation();
    synchronizer.validate(shape, &state)?;

    let id = ws.add_node(block_type)?;
    let node = ws.node_mut(id)?;
    for field in &shape.fields {
        node.fields.insert(field.name.clone(), field.default.clone());
    }
    let driver = shape.mutation.as_ref().and_then(|m| m.driven_by);
    if let Some((field, value)) = driver.zip(state.field_value()) {
        node.fields.insert(field.to_string(), value);
    }

    if let Err(e) = synchronizer.reconcile(ws, id, state) {
        ws.dispose(id)?;
        return Err(e);
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bf_model::{FieldSpec, MutationKind, MutationShape, OptionKind};
    use std::collections::HashMap;

    fn option_rows(state: &MutationState) -> Vec<SlotSpec> {
        state
            .option_kinds()
            .iter()
            .enumerate()
            .map(|(i, kind)| match kind {
                OptionKind::Text => SlotSpec::dummy(format!("OPTION{}", i))
                    .check("text")
                    .field(FieldSpec::text(format!("USER{}", i), "option")),
                OptionKind::Image => SlotSpec::dummy(format!("OPTION{}", i))
                    .check("image")
                    .field(FieldSpec::text(format!("SRC{}", i), "star.gif")),
            })
            .collect()
    }

    fn type_rows(state: &MutationState) -> Vec<SlotSpec> {
        (0..state.count().unwrap_or(0))
            .map(|i| SlotSpec::value(format!("TYPE{}", i)).check("Type"))
            .collect()
    }

    /// Third row onwards is filled by a shadow whose own shadow is unknown
    fn deep_rows(state: &MutationState) -> Vec<SlotSpec> {
        (0..state.count().unwrap_or(0))
            .map(|i| {
                let slot = SlotSpec::value(format!("TYPE{}", i)).check("Type");
                if i >= 2 {
                    slot.shadow("outer")
                } else {
                    slot
                }
            })
            .collect()
    }

    fn catalog() -> HashMap<String, ShapeDescriptor> {
        let shapes = vec![
            ShapeDescriptor::new("dropdown")
                .field(FieldSpec::text("FIELDNAME", "NAME"))
                .mutation(MutationShape::new(MutationKind::OptionKinds, option_rows)),
            ShapeDescriptor::new("group")
                .output(Some("Type"))
                .mutation(MutationShape::new(MutationKind::TypeCount, type_rows)),
            ShapeDescriptor::new("shadowed")
                .slot(SlotSpec::value("A").check("Type").shadow("any"))
                .slot(SlotSpec::value("B").shadow("missing")),
            ShapeDescriptor::new("holder").slot(SlotSpec::value("A").check("Type").shadow("any")),
            ShapeDescriptor::new("any").output(Some("Type")),
            ShapeDescriptor::new("leaf").output(Some("Type")),
            ShapeDescriptor::new("deep_group")
                .output(Some("Type"))
                .mutation(MutationShape::new(MutationKind::TypeCount, deep_rows)),
            ShapeDescriptor::new("outer")
                .output(Some("Type"))
                .slot(SlotSpec::value("INNER").shadow("nope")),
            ShapeDescriptor::new("looping").slot(SlotSpec::value("SELF").shadow("looping")),
        ];
        shapes.into_iter().map(|s| (s.block_type.clone(), s)).collect()
    }

    fn slot_names(ws: &Workspace, id: NodeId) -> Vec<String> {
        ws.node(id).unwrap().slots.iter().map(|s| s.name.clone()).collect()
    }

    #[test]
    fn test_instantiate_uses_defaults() {
        let catalog = catalog();
        let mut ws = Workspace::new();
        let id = instantiate(&mut ws, &catalog, "group").unwrap();
        assert_eq!(slot_names(&ws, id), vec!["TYPE0", "TYPE1"]);
        assert_eq!(ws.node(id).unwrap().mutation, MutationState::TypeCount(2));
    }

    #[test]
    fn test_instantiate_spawns_shadows() {
        let catalog = catalog();
        let mut ws = Workspace::new();
        let id = instantiate(&mut ws, &catalog, "holder").unwrap();
        let shadow = ws.slot_target(id, "A").unwrap().unwrap();
        let node = ws.node(shadow).unwrap();
        assert!(node.shadow);
        assert_eq!(node.block_type, "any");
    }

    #[test]
    fn test_unknown_types_are_configuration_errors() {
        let catalog = catalog();
        let mut ws = Workspace::new();
        assert!(instantiate(&mut ws, &catalog, "nope").unwrap_err().is_unregistered());
        // Unresolvable shadow type is caught before the node is created
        assert!(instantiate(&mut ws, &catalog, "shadowed").unwrap_err().is_unregistered());
        assert!(ws.is_empty());
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let catalog = catalog();
        let sync = ShapeSynchronizer::new(&catalog);
        let mut ws = Workspace::new();
        let id = instantiate(&mut ws, &catalog, "group").unwrap();
        let child = instantiate(&mut ws, &catalog, "leaf").unwrap();
        ws.attach(id, "TYPE1", child).unwrap();

        let first = sync.reconcile(&mut ws, id, MutationState::TypeCount(3)).unwrap();
        assert_eq!(first.added, vec!["TYPE2"]);
        let before = ws.node(id).unwrap().clone();
        let second = sync.reconcile(&mut ws, id, MutationState::TypeCount(3)).unwrap();
        assert!(second.is_noop());
        assert_eq!(ws.node(id).unwrap(), &before);
    }

    #[test]
    fn test_shrinking_discards_children_of_removed_slots() {
        let catalog = catalog();
        let sync = ShapeSynchronizer::new(&catalog);
        let mut ws = Workspace::new();
        let id = instantiate(&mut ws, &catalog, "group").unwrap();
        let keep = instantiate(&mut ws, &catalog, "leaf").unwrap();
        let lose = instantiate(&mut ws, &catalog, "leaf").unwrap();
        ws.attach(id, "TYPE0", keep).unwrap();
        ws.attach(id, "TYPE1", lose).unwrap();

        let report = sync.reconcile(&mut ws, id, MutationState::TypeCount(1)).unwrap();
        assert_eq!(report.removed, vec!["TYPE1"]);
        assert_eq!(report.discarded, vec![lose]);
        assert!(!ws.contains(lose));
        assert_eq!(ws.slot_target(id, "TYPE0").unwrap(), Some(keep));
    }

    #[test]
    fn test_kind_change_at_same_position_drops_row_data() {
        let catalog = catalog();
        let sync = ShapeSynchronizer::new(&catalog);
        let mut ws = Workspace::new();
        let id = instantiate(&mut ws, &catalog, "dropdown").unwrap();
        ws.set_field(id, "USER0", FieldValue::text("first")).unwrap();
        ws.set_field(id, "USER1", FieldValue::text("second")).unwrap();

        let state = MutationState::OptionKinds(vec![OptionKind::Text, OptionKind::Image]);
        let report = sync.reconcile(&mut ws, id, state).unwrap();
        assert_eq!(report.removed, vec!["OPTION1", "OPTION2"]);
        assert_eq!(report.added, vec!["OPTION1"]);

        let node = ws.node(id).unwrap();
        assert_eq!(node.field_text("USER0").as_deref(), Some("first"));
        assert!(node.field("USER1").is_none());
        assert_eq!(node.field_text("SRC1").as_deref(), Some("star.gif"));
    }

    #[test]
    fn test_kind_mismatch_leaves_node_untouched() {
        let catalog = catalog();
        let sync = ShapeSynchronizer::new(&catalog);
        let mut ws = Workspace::new();
        let id = instantiate(&mut ws, &catalog, "group").unwrap();
        let before = ws.node(id).unwrap().clone();

        let err = sync
            .reconcile(&mut ws, id, MutationState::ParamCount(1))
            .unwrap_err();
        assert!(matches!(err, EditError::Mutation(MutationError::KindMismatch { .. })));
        assert_eq!(ws.node(id).unwrap(), &before);
    }

    #[test]
    fn test_failed_nested_shadow_leaves_slots_unchanged() {
        let catalog = catalog();
        let sync = ShapeSynchronizer::new(&catalog);
        let mut ws = Workspace::new();
        let id = instantiate(&mut ws, &catalog, "deep_group").unwrap();
        let before = ws.node(id).unwrap().clone();
        let count = ws.len();

        let err = sync
            .reconcile(&mut ws, id, MutationState::TypeCount(3))
            .unwrap_err();
        assert!(err.is_unregistered());
        assert_eq!(ws.node(id).unwrap(), &before);
        assert_eq!(slot_names(&ws, id), vec!["TYPE0", "TYPE1"]);
        assert_eq!(ws.len(), count);
    }

    #[test]
    fn test_self_spawning_shadow_is_rejected() {
        let catalog = catalog();
        let mut ws = Workspace::new();
        let err = instantiate(&mut ws, &catalog, "looping").unwrap_err();
        assert!(matches!(err, EditError::ShadowCycle { .. }));
        assert!(ws.is_empty());
    }

    #[test]
    fn test_oversized_count_is_rejected_before_reconciling() {
        let catalog = catalog();
        let sync = ShapeSynchronizer::new(&catalog);
        let mut ws = Workspace::new();
        let id = instantiate(&mut ws, &catalog, "group").unwrap();
        let before = ws.node(id).unwrap().clone();

        let state = MutationState::TypeCount(MAX_REPEAT_COUNT + 1);
        assert!(matches!(
            sync.reconcile(&mut ws, id, state),
            Err(EditError::Mutation(MutationError::Malformed { .. }))
        ));
        assert_eq!(ws.node(id).unwrap(), &before);
    }

    #[test]
    fn test_orphan_pool_matches_by_position_and_tag() {
        let mut pool = OrphanPool::new();
        pool.insert(
            2,
            Orphan {
                slot: "OUTPUTTYPE".into(),
                kind: SlotKind::Value,
                check: Some("Type".into()),
                child: Some(NodeId::new(9)),
                fields: IndexMap::new(),
            },
        );
        assert!(pool.claim(1, &SlotSpec::value("TOPTYPE").check("Type")).is_none());
        assert!(pool.claim(2, &SlotSpec::value("TOPTYPE").check("String")).is_none());
        let orphan = pool.claim(2, &SlotSpec::value("TOPTYPE").check("Type")).unwrap();
        assert_eq!(orphan.child, Some(NodeId::new(9)));
        assert!(pool.is_empty());
    }
}
