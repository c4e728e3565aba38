//! Type blocks
//!
//! Each block stands for one type name; `type_group` is a union over a
//! variable number of TYPE slots.

use crate::generator::CodeGenerator;
use crate::language::Language;
use crate::order::OutputClass;
use crate::registry::{BlockEntry, BlockRegistry, Fragment};
use crate::Result;
use bf_model::{
    FieldSpec, MutationKind, MutationShape, MutationState, Node, ShapeDescriptor, SlotKind,
    SlotSpec,
};

pub const TYPE_CHECK: &str = "Type";
const TYPE_COLOUR: &str = "230";

fn any_type(gen: &mut CodeGenerator<'_>) -> &'static str {
    match gen.language() {
        Language::Python => {
            gen.provide_definition("typing_any", "from typing import Any");
            "Any"
        }
        Language::JavaScript => "*",
    }
}

fn union_separator(language: Language) -> &'static str {
    match language {
        Language::Python => " | ",
        Language::JavaScript => "|",
    }
}

/// Type name for one of the fixed type blocks
fn named_type(block_type: &str, language: Language) -> Option<&'static str> {
    let name = match (block_type, language) {
        ("type_boolean", Language::Python) => "bool",
        ("type_boolean", Language::JavaScript) => "boolean",
        ("type_number", Language::Python) => "float",
        ("type_number", Language::JavaScript) => "number",
        ("type_string", Language::Python) => "str",
        ("type_string", Language::JavaScript) => "string",
        ("type_list", Language::Python) => "list",
        ("type_list", Language::JavaScript) => "Array",
        _ => return None,
    };
    Some(name)
}

fn simple_type(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    let name = match named_type(&node.block_type, gen.language()) {
        Some(name) => name,
        None => any_type(gen),
    };
    Ok(Fragment::value(name, OutputClass::Atomic))
}

fn type_other(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    let name = gen.field_text(node, "TYPE");
    let name = if name.trim().is_empty() {
        any_type(gen).to_string()
    } else {
        name
    };
    Ok(Fragment::value(name, OutputClass::Atomic))
}

fn type_group(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    let ws = gen.workspace();
    let populated: Vec<&str> = node
        .slots
        .iter()
        .filter(|slot| slot.kind == SlotKind::Value)
        .filter(|slot| {
            slot.target
                .and_then(|target| ws.get(target))
                .is_some_and(|child| child.enabled)
        })
        .map(|slot| slot.name.as_str())
        .collect();

    match populated.as_slice() {
        [] => Ok(Fragment::value(any_type(gen), OutputClass::Atomic)),
        [only] => {
            let Some(target) = node.slot_target(only) else {
                return Ok(Fragment::value(any_type(gen), OutputClass::Atomic));
            };
            let (code, class) = gen.generate_value(target)?;
            Ok(Fragment::value(code, class))
        }
        slots => {
            let mut parts = Vec::with_capacity(slots.len());
            for slot in slots {
                parts.push(gen.value_to_code(node, slot, OutputClass::Union)?);
            }
            let separator = union_separator(gen.language());
            Ok(Fragment::value(parts.join(separator), OutputClass::Union))
        }
    }
}

fn type_rows(state: &MutationState) -> Vec<SlotSpec> {
    (0..state.count().unwrap_or(0))
        .map(|i| SlotSpec::value(format!("TYPE{}", i)).check(TYPE_CHECK))
        .collect()
}

fn type_block(block_type: &str, value_type: Option<&str>, tooltip: &str) -> ShapeDescriptor {
    let shape = ShapeDescriptor::new(block_type)
        .output(Some(TYPE_CHECK))
        .colour(TYPE_COLOUR)
        .tooltip(tooltip)
        .help_url("https://www.youtube.com/watch?v=s2_xaEvcVI0#t=602");
    match value_type {
        Some(value_type) => shape.value_type(value_type),
        None => shape,
    }
}

pub fn register(registry: &mut BlockRegistry) -> Result<()> {
    let simple = [
        ("type_null", None, "Any type is allowed."),
        ("type_boolean", Some("Boolean"), "Booleans (true/false) are allowed."),
        ("type_number", Some("Number"), "Numbers (int/float) are allowed."),
        ("type_string", Some("String"), "Strings (text) are allowed."),
        ("type_list", Some("Array"), "Arrays (lists) are allowed."),
    ];
    for (block_type, value_type, tooltip) in simple {
        registry.register_entry(
            BlockEntry::new(type_block(block_type, value_type, tooltip))
                .python(simple_type)
                .javascript(simple_type),
        )?;
    }

    registry.register_entry(
        BlockEntry::new(
            type_block("type_other", None, "Custom type to allow.")
                .field(FieldSpec::text("TYPE", "")),
        )
        .python(type_other)
        .javascript(type_other),
    )?;

    registry.register_entry(
        BlockEntry::new(
            type_block("type_group", None, "Allows more than one type to be accepted.")
                .mutation(MutationShape::new(MutationKind::TypeCount, type_rows)),
        )
        .python(type_group)
        .javascript(type_group),
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::standard_registry;
    use bf_editor::{instantiate, MutationStore};
    use bf_model::{FieldValue, NodeId, Workspace};

    fn group_with(ws: &mut Workspace, members: &[(usize, &str)], count: usize) -> NodeId {
        let registry = standard_registry().unwrap();
        let group = instantiate(ws, registry, "type_group").unwrap();
        MutationStore::new(registry)
            .set_state(ws, group, MutationState::TypeCount(count))
            .unwrap();
        for (index, block_type) in members {
            let child = instantiate(ws, registry, block_type).unwrap();
            ws.attach(group, &format!("TYPE{}", index), child).unwrap();
        }
        group
    }

    fn value(ws: &Workspace, id: NodeId, language: Language) -> (String, OutputClass) {
        CodeGenerator::new(ws, standard_registry().unwrap(), language)
            .generate_value(id)
            .unwrap()
    }

    #[test]
    fn test_group_skips_empty_slots() {
        let mut ws = Workspace::new();
        let group = group_with(&mut ws, &[(0, "type_number"), (2, "type_string")], 3);
        assert_eq!(
            value(&ws, group, Language::Python),
            ("float | str".to_string(), OutputClass::Union)
        );
        assert_eq!(
            value(&ws, group, Language::JavaScript),
            ("number|string".to_string(), OutputClass::Union)
        );
    }

    #[test]
    fn test_group_with_one_member_is_the_member() {
        let mut ws = Workspace::new();
        let group = group_with(&mut ws, &[(1, "type_boolean")], 2);
        assert_eq!(
            value(&ws, group, Language::Python),
            ("bool".to_string(), OutputClass::Atomic)
        );
    }

    #[test]
    fn test_empty_group_is_any() {
        let mut ws = Workspace::new();
        let group = group_with(&mut ws, &[], 2);
        assert_eq!(value(&ws, group, Language::JavaScript).0, "*");

        let mut gen = CodeGenerator::new(&ws, standard_registry().unwrap(), Language::Python);
        assert_eq!(gen.generate_value(group).unwrap().0, "Any");
        assert_eq!(gen.definitions(), vec!["from typing import Any"]);
    }

    #[test]
    fn test_nested_groups_flatten_without_parens() {
        let mut ws = Workspace::new();
        let inner = group_with(&mut ws, &[(0, "type_number"), (1, "type_string")], 2);
        let outer = group_with(&mut ws, &[(1, "type_list")], 2);
        ws.attach(outer, "TYPE0", inner).unwrap();
        assert_eq!(value(&ws, outer, Language::Python).0, "float | str | list");
    }

    #[test]
    fn test_type_other_uses_custom_name() {
        let registry = standard_registry().unwrap();
        let mut ws = Workspace::new();
        let id = instantiate(&mut ws, registry, "type_other").unwrap();
        assert_eq!(value(&ws, id, Language::JavaScript).0, "*");
        ws.set_field(id, "TYPE", FieldValue::text("Vector")).unwrap();
        assert_eq!(value(&ws, id, Language::Python).0, "Vector");
    }

    #[test]
    fn test_disabled_member_counts_as_empty() {
        let mut ws = Workspace::new();
        let group = group_with(&mut ws, &[(0, "type_number"), (1, "type_string")], 2);
        let member = ws.slot_target(group, "TYPE1").unwrap().unwrap();
        ws.set_enabled(member, false).unwrap();
        assert_eq!(value(&ws, group, Language::Python).0, "float");
    }
}
