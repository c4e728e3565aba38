//! JSON workspace documents
//!
//! A document is a list of top-level block trees. Each block carries its
//! fields, the blocks plugged into its slots, the block after it and its
//! mutation record. Node ids are written for reference and reassigned in
//! document order on load.

use crate::error::{EditError, Result};
use crate::mutation_store::MutationStore;
use bf_model::{
    FieldValue, MutationRecord, MutationState, Node, NodeId, ShapeCatalog, SlotKind, Workspace,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

fn default_true() -> bool {
    true
}

fn is_true(value: &bool) -> bool {
    *value
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// One block and everything attached below it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDocument {
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub fields: IndexMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub inputs: IndexMap<String, BlockDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<Box<BlockDocument>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutation: Option<MutationRecord>,
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub shadow: bool,
}

impl BlockDocument {
    pub fn new(block_type: impl Into<String>) -> Self {
        Self {
            block_type: block_type.into(),
            id: None,
            fields: IndexMap::new(),
            inputs: IndexMap::new(),
            next: None,
            mutation: None,
            enabled: true,
            shadow: false,
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn input(mut self, slot: impl Into<String>, block: BlockDocument) -> Self {
        self.inputs.insert(slot.into(), block);
        self
    }

    pub fn then(mut self, next: BlockDocument) -> Self {
        self.next = Some(Box::new(next));
        self
    }

    pub fn mutation(mut self, record: MutationRecord) -> Self {
        self.mutation = Some(record);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Serializable form of a whole workspace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceDocument {
    pub blocks: Vec<BlockDocument>,
}

fn field_to_json(value: &FieldValue) -> serde_json::Value {
    match value {
        FieldValue::Number(n) => serde_json::Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .unwrap_or_else(|| serde_json::Value::String(value.as_text())),
        FieldValue::Boolean(b) => serde_json::Value::Bool(*b),
        other => serde_json::Value::String(other.as_text()),
    }
}

/// Read a JSON field value as the same variant as `like`
fn field_from_json(value: &serde_json::Value, like: Option<&FieldValue>) -> FieldValue {
    let text = match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    match (like, value) {
        (Some(FieldValue::Number(_)), _) => match value.as_f64().or_else(|| text.parse().ok()) {
            Some(n) => FieldValue::Number(n),
            None => FieldValue::Text(text),
        },
        (Some(FieldValue::Boolean(_)), serde_json::Value::Bool(b)) => FieldValue::Boolean(*b),
        (Some(FieldValue::Boolean(_)), _) => match FieldValue::Text(text.clone()).as_bool() {
            Some(b) => FieldValue::Boolean(b),
            None => FieldValue::Text(text),
        },
        (Some(FieldValue::Colour(_)), _) => FieldValue::Colour(text),
        (Some(FieldValue::Choice(_)), _) => FieldValue::Choice(text),
        (_, serde_json::Value::Number(n)) => n
            .as_f64()
            .map(FieldValue::Number)
            .unwrap_or(FieldValue::Text(text)),
        (_, serde_json::Value::Bool(b)) => FieldValue::Boolean(*b),
        _ => FieldValue::Text(text),
    }
}

impl WorkspaceDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture every top-level tree of `ws` in id order
    pub fn from_workspace(ws: &Workspace) -> Result<Self> {
        let blocks = ws
            .top_nodes()
            .into_iter()
            .map(|id| Self::block_from(ws, id))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { blocks })
    }

    fn block_from(ws: &Workspace, id: NodeId) -> Result<BlockDocument> {
        let node: &Node = ws.node(id)?;
        let mut block = BlockDocument::new(node.block_type.clone());
        block.id = Some(id.as_u32());
        block.enabled = node.enabled;
        block.shadow = node.shadow;

        for (name, value) in &node.fields {
            block.fields.insert(name.clone(), field_to_json(value));
        }
        for slot in &node.slots {
            for (name, value) in &slot.fields {
                block.fields.insert(name.clone(), field_to_json(value));
            }
            if let Some(child) = slot.target {
                block.inputs.insert(slot.name.clone(), Self::block_from(ws, child)?);
            }
        }
        if let Some(next) = node.next {
            block.next = Some(Box::new(Self::block_from(ws, next)?));
        }
        if node.mutation != MutationState::None {
            block.mutation = Some(MutationStore::serialize(&node.mutation));
        }
        Ok(block)
    }

    /// Build a workspace, restoring each block's mutation through the
    /// mutation store so legacy records are upgraded
    pub fn into_workspace(&self, catalog: &dyn ShapeCatalog) -> Result<Workspace> {
        let mut ws = Workspace::new();
        let store = MutationStore::for_loading(catalog);
        for block in &self.blocks {
            Self::build(&mut ws, catalog, &store, block)?;
        }
        debug!("Loaded {} top-level block(s), {} node(s)", self.blocks.len(), ws.len());
        Ok(ws)
    }

    fn build(
        ws: &mut Workspace,
        catalog: &dyn ShapeCatalog,
        store: &MutationStore<'_>,
        block: &BlockDocument,
    ) -> Result<NodeId> {
        let shape = catalog
            .shape(&block.block_type)
            .ok_or_else(|| EditError::unregistered(block.block_type.clone()))?;

        let id = ws.add_node(block.block_type.clone())?;
        {
            let node = ws.node_mut(id)?;
            node.enabled = block.enabled;
            node.shadow = block.shadow;
            for field in &shape.fields {
                node.fields.insert(field.name.clone(), field.default.clone());
            }
        }

        match &block.mutation {
            Some(record) => {
                store.restore(ws, id, record)?;
            }
            None => {
                store.set_state(ws, id, shape.default_mutation())?;
            }
        }

        for (name, value) in &block.fields {
            let like = ws.field(id, name).cloned();
            ws.set_field(id, name, field_from_json(value, like.as_ref()))?;
        }

        for (slot, child) in &block.inputs {
            let kind = ws
                .node(id)?
                .slot(slot)
                .map(|s| s.kind)
                .ok_or_else(|| bf_model::ModelError::slot_not_found(id, slot.clone()))?;
            if kind == SlotKind::Dummy {
                return Err(EditError::document(format!(
                    "block {} cannot hold a child in row {}",
                    block.block_type, slot
                )));
            }
            let child_id = Self::build(ws, catalog, store, child)?;
            ws.attach(id, slot, child_id)?;
        }

        if let Some(next) = &block.next {
            let next_id = Self::build(ws, catalog, store, next)?;
            ws.connect_next(id, next_id)?;
        }
        Ok(id)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let doc = Self::from_json(&content)?;
        info!("Read workspace document {}", path.display());
        Ok(doc)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_json()?)?;
        info!("Wrote workspace document {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bf_model::{
        FieldSpec, MutationKind, MutationShape, OptionKind, ShapeDescriptor, SlotSpec,
    };
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn option_rows(state: &MutationState) -> Vec<SlotSpec> {
        (0..state.option_kinds().len())
            .map(|i| {
                SlotSpec::dummy(format!("OPTION{}", i))
                    .check("text")
                    .field(FieldSpec::text(format!("USER{}", i), "option"))
            })
            .collect()
    }

    fn catalog() -> HashMap<String, ShapeDescriptor> {
        let shapes = vec![
            ShapeDescriptor::new("dropdown")
                .field(FieldSpec::text("FIELDNAME", "NAME"))
                .statement(Some("Field"))
                .mutation(MutationShape::new(MutationKind::OptionKinds, option_rows)),
            ShapeDescriptor::new("number")
                .field(FieldSpec::number("VALUE", 0.0))
                .field(FieldSpec::text("FIELDNAME", "NAME"))
                .statement(Some("Field")),
            ShapeDescriptor::new("holder")
                .statement_slot("FIELDS", Some("Field"))
                .slot(SlotSpec::value("TYPE").check("Type").shadow("any")),
            ShapeDescriptor::new("any").output(Some("Type")),
        ];
        shapes.into_iter().map(|s| (s.block_type.clone(), s)).collect()
    }

    fn sample() -> WorkspaceDocument {
        let dropdown = BlockDocument::new("dropdown")
            .field("FIELDNAME", "COLOUR")
            .field("USER1", "blue")
            .mutation(MutationRecord::new().with("options", "2"));
        let number = BlockDocument::new("number").field("VALUE", 42);
        WorkspaceDocument {
            blocks: vec![BlockDocument::new("holder").input("FIELDS", dropdown.then(number))],
        }
    }

    #[test]
    fn test_load_restores_structure_and_upgrades_mutation() {
        let catalog = catalog();
        let ws = sample().into_workspace(&catalog).unwrap();

        let holder = ws.top_nodes()[0];
        let dropdown = ws.slot_target(holder, "FIELDS").unwrap().unwrap();
        let node = ws.node(dropdown).unwrap();
        assert_eq!(
            node.mutation,
            MutationState::OptionKinds(vec![OptionKind::Text, OptionKind::Text])
        );
        assert_eq!(node.field_text("USER0").as_deref(), Some("option"));
        assert_eq!(node.field_text("USER1").as_deref(), Some("blue"));

        let number = node.next.unwrap();
        assert_eq!(ws.field(number, "VALUE"), Some(&FieldValue::Number(42.0)));
        // Documents carry their own shadows
        assert_eq!(ws.slot_target(holder, "TYPE").unwrap(), None);
    }

    #[test]
    fn test_save_writes_current_encoding() {
        let catalog = catalog();
        let ws = sample().into_workspace(&catalog).unwrap();
        let doc = WorkspaceDocument::from_workspace(&ws).unwrap();
        let dropdown = &doc.blocks[0].inputs["FIELDS"];
        assert_eq!(
            dropdown.mutation.as_ref().and_then(|m| m.get("options")),
            Some(r#"["text","text"]"#)
        );

        let reloaded = doc.into_workspace(&catalog).unwrap();
        let again = WorkspaceDocument::from_workspace(&reloaded).unwrap();
        assert_eq!(again, doc);
    }

    #[test]
    fn test_unknown_block_type_fails() {
        let catalog = catalog();
        let doc = WorkspaceDocument {
            blocks: vec![BlockDocument::new("mystery")],
        };
        assert!(doc.into_workspace(&catalog).unwrap_err().is_unregistered());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("workspace.json");
        let doc = sample();
        doc.save(&path).unwrap();
        assert_eq!(WorkspaceDocument::load(&path).unwrap(), doc);
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{"blocks":[{"type":"number","fields":{"VALUE":3},"enabled":false}]}"#;
        let doc = WorkspaceDocument::from_json(json).unwrap();
        assert!(!doc.blocks[0].enabled);
        assert!(!doc.blocks[0].shadow);
        assert_eq!(doc.blocks[0].fields["VALUE"], serde_json::json!(3));
    }
}
