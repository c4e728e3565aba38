//! Static shape declarations for block types

use crate::mutation::{MutationKind, MutationState};
use crate::node::{FieldValue, SlotKind};

/// A field with its initial value
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub default: FieldValue,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, default: FieldValue) -> Self {
        Self {
            name: name.into(),
            default,
        }
    }

    pub fn text(name: impl Into<String>, default: impl Into<String>) -> Self {
        Self::new(name, FieldValue::Text(default.into()))
    }

    pub fn number(name: impl Into<String>, default: f64) -> Self {
        Self::new(name, FieldValue::Number(default))
    }

    pub fn choice(name: impl Into<String>, default: impl Into<String>) -> Self {
        Self::new(name, FieldValue::Choice(default.into()))
    }

    pub fn boolean(name: impl Into<String>, default: bool) -> Self {
        Self::new(name, FieldValue::Boolean(default))
    }

    pub fn colour(name: impl Into<String>, default: impl Into<String>) -> Self {
        Self::new(name, FieldValue::Colour(default.into()))
    }
}

/// Declared slot of a block type
#[derive(Debug, Clone, PartialEq)]
pub struct SlotSpec {
    pub name: String,
    pub kind: SlotKind,
    pub check: Option<String>,
    /// Fields rendered on the slot's row
    pub fields: Vec<FieldSpec>,
    /// Block type spawned as a shadow when the slot is empty
    pub shadow: Option<String>,
}

impl SlotSpec {
    pub fn new(name: impl Into<String>, kind: SlotKind) -> Self {
        Self {
            name: name.into(),
            kind,
            check: None,
            fields: Vec::new(),
            shadow: None,
        }
    }

    pub fn value(name: impl Into<String>) -> Self {
        Self::new(name, SlotKind::Value)
    }

    pub fn statement(name: impl Into<String>) -> Self {
        Self::new(name, SlotKind::Statement)
    }

    pub fn dummy(name: impl Into<String>) -> Self {
        Self::new(name, SlotKind::Dummy)
    }

    pub fn check(mut self, check: impl Into<String>) -> Self {
        self.check = Some(check.into());
        self
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn shadow(mut self, block_type: impl Into<String>) -> Self {
        self.shadow = Some(block_type.into());
        self
    }
}

/// Dynamic part of a shape
#[derive(Debug, Clone)]
pub struct MutationShape {
    pub kind: MutationKind,
    pub default: MutationState,
    /// Fixed slot the mutation slots are placed in front of
    pub anchor: Option<&'static str>,
    /// Field whose value selects the state
    pub driven_by: Option<&'static str>,
    pub slots_for: fn(&MutationState) -> Vec<SlotSpec>,
}

impl MutationShape {
    pub fn new(kind: MutationKind, slots_for: fn(&MutationState) -> Vec<SlotSpec>) -> Self {
        Self {
            kind,
            default: kind.default_state(),
            anchor: None,
            driven_by: None,
            slots_for,
        }
    }

    pub fn with_default(mut self, default: MutationState) -> Self {
        self.default = default;
        self
    }

    pub fn before(mut self, anchor: &'static str) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn driven_by(mut self, field: &'static str) -> Self {
        self.driven_by = Some(field);
        self
    }
}

/// Static description of a block type
#[derive(Debug, Clone)]
pub struct ShapeDescriptor {
    pub block_type: String,
    pub fields: Vec<FieldSpec>,
    pub slots: Vec<SlotSpec>,
    /// `Some(check)` when the block has an output connection
    pub output: Option<Option<String>>,
    pub previous: Option<Option<String>>,
    pub next: Option<Option<String>>,
    pub colour: Option<String>,
    pub tooltip: String,
    pub help_url: String,
    /// Type name a type-describing block stands for
    pub value_type: Option<String>,
    pub mutation: Option<MutationShape>,
}

impl ShapeDescriptor {
    pub fn new(block_type: impl Into<String>) -> Self {
        Self {
            block_type: block_type.into(),
            fields: Vec::new(),
            slots: Vec::new(),
            output: None,
            previous: None,
            next: None,
            colour: None,
            tooltip: String::new(),
            help_url: String::new(),
            value_type: None,
            mutation: None,
        }
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn slot(mut self, slot: SlotSpec) -> Self {
        self.slots.push(slot);
        self
    }

    pub fn value_slot(self, name: impl Into<String>, check: Option<&str>) -> Self {
        let mut slot = SlotSpec::value(name);
        slot.check = check.map(str::to_string);
        self.slot(slot)
    }

    pub fn statement_slot(self, name: impl Into<String>, check: Option<&str>) -> Self {
        let mut slot = SlotSpec::statement(name);
        slot.check = check.map(str::to_string);
        self.slot(slot)
    }

    pub fn output(mut self, check: Option<&str>) -> Self {
        self.output = Some(check.map(str::to_string));
        self
    }

    /// Give the block both chain connections with the same check
    pub fn statement(mut self, check: Option<&str>) -> Self {
        self.previous = Some(check.map(str::to_string));
        self.next = Some(check.map(str::to_string));
        self
    }

    pub fn colour(mut self, colour: impl Into<String>) -> Self {
        self.colour = Some(colour.into());
        self
    }

    pub fn tooltip(mut self, tooltip: impl Into<String>) -> Self {
        self.tooltip = tooltip.into();
        self
    }

    pub fn help_url(mut self, url: impl Into<String>) -> Self {
        self.help_url = url.into();
        self
    }

    pub fn value_type(mut self, value_type: impl Into<String>) -> Self {
        self.value_type = Some(value_type.into());
        self
    }

    pub fn mutation(mut self, mutation: MutationShape) -> Self {
        self.mutation = Some(mutation);
        self
    }

    pub fn is_value_block(&self) -> bool {
        self.output.is_some()
    }

    pub fn mutation_kind(&self) -> MutationKind {
        self.mutation
            .as_ref()
            .map(|m| m.kind)
            .unwrap_or(MutationKind::None)
    }

    pub fn default_mutation(&self) -> MutationState {
        self.mutation
            .as_ref()
            .map(|m| m.default.clone())
            .unwrap_or_default()
    }

    /// Ordered slot list implied by `state`.
    ///
    /// Mutation slots go in front of the anchor slot, or after the fixed
    /// slots when there is no anchor or it is absent.
    pub fn required_slots(&self, state: &MutationState) -> Vec<SlotSpec> {
        let mut slots = self.slots.clone();
        let Some(mutation) = &self.mutation else {
            return slots;
        };
        let extra = (mutation.slots_for)(state);
        let at = mutation
            .anchor
            .and_then(|anchor| slots.iter().position(|s| s.name == anchor))
            .unwrap_or(slots.len());
        slots.splice(at..at, extra);
        slots
    }
}

/// Lookup of shape descriptors by block type
pub trait ShapeCatalog {
    fn shape(&self, block_type: &str) -> Option<&ShapeDescriptor>;

    fn contains(&self, block_type: &str) -> bool {
        self.shape(block_type).is_some()
    }
}

impl ShapeCatalog for std::collections::HashMap<String, ShapeDescriptor> {
    fn shape(&self, block_type: &str) -> Option<&ShapeDescriptor> {
        self.get(block_type)
    }
}
