//! Block instances and their attachment points

use crate::mutation::MutationState;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Arena key of a node inside a [`crate::Workspace`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    pub fn new(id: u32) -> Self {
        NodeId(id)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Scalar value held by a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Boolean(bool),
    Colour(String),
    Choice(String),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn choice(value: impl Into<String>) -> Self {
        FieldValue::Choice(value.into())
    }

    /// Render the value the way a generator reads it.
    ///
    /// Integral numbers print without a fractional part, booleans print as
    /// `TRUE`/`FALSE` like checkbox fields do.
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Text(s) | FieldValue::Colour(s) | FieldValue::Choice(s) => s.clone(),
            FieldValue::Number(n) => format_number(*n),
            FieldValue::Boolean(true) => "TRUE".to_string(),
            FieldValue::Boolean(false) => "FALSE".to_string(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) | FieldValue::Choice(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            FieldValue::Text(s) | FieldValue::Choice(s) => match s.to_ascii_uppercase().as_str() {
                "TRUE" => Some(true),
                "FALSE" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_infinite() {
        if n > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_text())
    }
}

/// What a slot can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    /// Holds one value-producing node
    Value,
    /// Holds a statement chain
    Statement,
    /// A row of fields without a connection
    Dummy,
}

impl SlotKind {
    pub fn is_connectable(self) -> bool {
        !matches!(self, SlotKind::Dummy)
    }
}

/// A named attachment point on a node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub name: String,
    pub kind: SlotKind,
    /// Constraint tag consumed by the host for connection checks
    pub check: Option<String>,
    pub target: Option<NodeId>,
    /// Fields rendered on this slot's row
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub fields: IndexMap<String, FieldValue>,
}

impl Slot {
    pub fn new(name: impl Into<String>, kind: SlotKind, check: Option<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            check,
            target: None,
            fields: IndexMap::new(),
        }
    }

    /// Two slots are the same slot when name, kind and constraint tag agree
    pub fn same_identity(&self, name: &str, kind: SlotKind, check: Option<&str>) -> bool {
        self.name == name && self.kind == kind && self.check.as_deref() == check
    }
}

/// A node's link to whatever holds it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Connection {
    /// Attached into a slot of `node`
    Slot { node: NodeId, slot: String },
    /// Follows `node` in a statement chain
    Next { node: NodeId },
}

impl Connection {
    pub fn node(&self) -> NodeId {
        match self {
            Connection::Slot { node, .. } | Connection::Next { node } => *node,
        }
    }
}

/// One configured instance of a block type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub block_type: String,
    pub fields: IndexMap<String, FieldValue>,
    pub slots: Vec<Slot>,
    pub mutation: MutationState,
    pub next: Option<NodeId>,
    pub parent: Option<Connection>,
    pub enabled: bool,
    pub shadow: bool,
    /// Advisory diagnostic shown by the host
    pub warning: Option<String>,
}

impl Node {
    pub fn new(id: NodeId, block_type: impl Into<String>) -> Self {
        Self {
            id,
            block_type: block_type.into(),
            fields: IndexMap::new(),
            slots: Vec::new(),
            mutation: MutationState::None,
            next: None,
            parent: None,
            enabled: true,
            shadow: false,
            warning: None,
        }
    }

    /// Look a field up on the node itself, then on its slot rows
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .get(name)
            .or_else(|| self.slots.iter().find_map(|slot| slot.fields.get(name)))
    }

    pub fn field_text(&self, name: &str) -> Option<String> {
        self.field(name).map(FieldValue::as_text)
    }

    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().find(|slot| slot.name == name)
    }

    pub fn slot_mut(&mut self, name: &str) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|slot| slot.name == name)
    }

    pub fn slot_target(&self, name: &str) -> Option<NodeId> {
        self.slot(name).and_then(|slot| slot.target)
    }

    /// Node this one follows in a statement chain
    pub fn previous(&self) -> Option<NodeId> {
        match &self.parent {
            Some(Connection::Next { node }) => Some(*node),
            _ => None,
        }
    }

    pub fn is_top(&self) -> bool {
        self.parent.is_none()
    }
}
