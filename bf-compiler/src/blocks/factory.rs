//! Block factory blocks
//!
//! A `factory_base` with its input and field blocks describes a new block
//! type; the JavaScript generators turn that description into a Blockly
//! block definition.

use super::json_string;
use crate::generator::{prefix_lines, CodeGenerator};
use crate::order::OutputClass;
use crate::registry::{is_reserved, BlockEntry, BlockRegistry, Fragment};
use crate::Result;
use bf_editor::{Diagnostic, FIELD_NAME_KEY, INPUT_NAME_KEY};
use bf_model::{
    ConnectionMode, FieldSpec, FieldValue, MutationKind, MutationShape, MutationState, Node,
    OptionKind, ShapeDescriptor, SlotKind, SlotSpec, Workspace,
};

const FIELD_CHECK: &str = "Field";
const INPUT_CHECK: &str = "Input";
const FIELD_COLOUR: &str = "160";
const INPUT_COLOUR: &str = "210";
const IMAGE_SRC: &str = "https://www.gstatic.com/codesite/ph/images/star_on.gif";
const HELP_URL: &str = "https://www.youtube.com/watch?v=s2_xaEvcVI0";
const BLOCK_FACTORY_GUIDE: &str =
    "https://developers.google.com/blockly/guides/create-custom-blocks/block-factory";

/// Indent of statements inside the generated `init` function
const BODY_INDENT: &str = "    ";

fn connection_rows(state: &MutationState) -> Vec<SlotSpec> {
    let MutationState::Connections(mode) = state else {
        return Vec::new();
    };
    let type_row = |name: &str| SlotSpec::value(name).check("Type").shadow("type_null");
    let mut slots = Vec::new();
    if mode.has_output() {
        slots.push(type_row("OUTPUTTYPE"));
    }
    if mode.has_top() {
        slots.push(type_row("TOPTYPE"));
    }
    if mode.has_bottom() {
        slots.push(type_row("BOTTOMTYPE"));
    }
    slots
}

fn option_rows(state: &MutationState) -> Vec<SlotSpec> {
    state
        .option_kinds()
        .iter()
        .enumerate()
        .map(|(i, kind)| {
            let row = SlotSpec::dummy(format!("OPTION{}", i)).check(kind.as_str());
            match kind {
                OptionKind::Text => row
                    .field(FieldSpec::text(format!("USER{}", i), "option"))
                    .field(FieldSpec::text(format!("CPU{}", i), "OPTIONNAME")),
                OptionKind::Image => row
                    .field(FieldSpec::text(format!("SRC{}", i), IMAGE_SRC))
                    .field(FieldSpec::number(format!("WIDTH{}", i), 15.0))
                    .field(FieldSpec::number(format!("HEIGHT{}", i), 15.0))
                    .field(FieldSpec::text(format!("ALT{}", i), "*"))
                    .field(FieldSpec::text(format!("CPU{}", i), "OPTIONNAME")),
            }
        })
        .collect()
}

fn no_rows(_: &MutationState) -> Vec<SlotSpec> {
    Vec::new()
}

fn field_block(block_type: &str, tooltip: &str, at: &str) -> ShapeDescriptor {
    ShapeDescriptor::new(block_type)
        .statement(Some(FIELD_CHECK))
        .colour(FIELD_COLOUR)
        .tooltip(tooltip)
        .help_url(format!("{}#t={}", HELP_URL, at))
}

fn input_block(block_type: &str, tooltip: &str, named: bool, typed: bool) -> ShapeDescriptor {
    let mut shape = ShapeDescriptor::new(block_type);
    if named {
        shape = shape.field(FieldSpec::text(INPUT_NAME_KEY, "NAME"));
    }
    shape = shape
        .field(FieldSpec::choice("ALIGN", "LEFT"))
        .statement_slot("FIELDS", Some(FIELD_CHECK));
    if typed {
        shape = shape.value_slot("TYPE", Some("Type"));
    }
    shape
        .statement(Some(INPUT_CHECK))
        .colour(INPUT_COLOUR)
        .tooltip(tooltip)
}

fn factory_entries() -> Vec<BlockEntry> {
    vec![
        BlockEntry::new(
            ShapeDescriptor::new("factory_base")
                .field(FieldSpec::text("NAME", "block_type"))
                .field(FieldSpec::choice("INLINE", "AUTO"))
                .field(FieldSpec::choice("CONNECTIONS", "NONE"))
                .statement_slot("INPUTS", Some(INPUT_CHECK))
                .value_slot("TOOLTIP", Some("String"))
                .value_slot("HELPURL", Some("String"))
                .value_slot("COLOUR", Some("Colour"))
                .colour("120")
                .tooltip("Build a custom block by plugging fields, inputs and other blocks here.")
                .help_url(BLOCK_FACTORY_GUIDE)
                .mutation(
                    MutationShape::new(MutationKind::Connections, connection_rows)
                        .before("COLOUR")
                        .driven_by("CONNECTIONS"),
                ),
        )
        .javascript(factory_base),
        BlockEntry::new(
            input_block("input_value", "A value socket for horizontal connections.", true, true),
        )
        .javascript(input_value),
        BlockEntry::new(
            input_block(
                "input_object",
                "A statement socket for enclosed vertical stacks.",
                true,
                true,
            ),
        )
        .javascript(input_object),
        BlockEntry::new(
            input_block(
                "input_dummy",
                "For adding fields without any block connections.",
                false,
                false,
            ),
        )
        .javascript(input_dummy),
        BlockEntry::new(
            input_block(
                "input_end_row",
                "For adding fields on a separate row from any following inputs.",
                false,
                false,
            ),
        )
        .javascript(input_end_row),
        BlockEntry::new(
            field_block("field_static", "Static text that serves as a label.", "88")
                .field(FieldSpec::text("TEXT", "")),
        )
        .javascript(field_static),
        BlockEntry::new(
            field_block(
                "field_label_serializable",
                "Static text that serves as a label, and is saved to XML.",
                "88",
            )
            .field(FieldSpec::text("TEXT", ""))
            .field(FieldSpec::text(FIELD_NAME_KEY, "NAME")),
        )
        .javascript(field_label_serializable),
        BlockEntry::new(
            field_block("field_input", "An input field for the user to enter text.", "319")
                .field(FieldSpec::text("TEXT", "default"))
                .field(FieldSpec::text(FIELD_NAME_KEY, "NAME")),
        )
        .javascript(field_input),
        BlockEntry::new(
            field_block("field_number", "An input field for the user to enter a number.", "319")
                .field(FieldSpec::number("VALUE", 0.0))
                .field(FieldSpec::text(FIELD_NAME_KEY, "NAME"))
                .field(FieldSpec::number("MIN", f64::NEG_INFINITY))
                .field(FieldSpec::number("MAX", f64::INFINITY))
                .field(FieldSpec::number("PRECISION", 0.0)),
        )
        .javascript(field_number),
        BlockEntry::new(
            field_block("field_angle", "An input field for the user to enter an angle.", "372")
                .field(FieldSpec::number("ANGLE", 90.0))
                .field(FieldSpec::text(FIELD_NAME_KEY, "NAME")),
        )
        .javascript(field_angle),
        BlockEntry::new(
            field_block("field_dropdown", "Dropdown menu with a list of options.", "386")
                .field(FieldSpec::text(FIELD_NAME_KEY, "NAME"))
                .mutation(MutationShape::new(MutationKind::OptionKinds, option_rows)),
        )
        .javascript(field_dropdown),
        BlockEntry::new(
            field_block("field_checkbox", "Checkbox field.", "485")
                .field(FieldSpec::boolean("CHECKED", true))
                .field(FieldSpec::text(FIELD_NAME_KEY, "NAME")),
        )
        .javascript(field_checkbox),
        BlockEntry::new(
            field_block("field_colour", "Colour input field.", "495")
                .field(FieldSpec::colour("COLOUR", "#ff0000"))
                .field(FieldSpec::text(FIELD_NAME_KEY, "NAME")),
        )
        .javascript(field_colour),
        BlockEntry::new(
            field_block("field_variable", "Dropdown menu for variable names.", "510")
                .field(FieldSpec::text("TEXT", "item"))
                .field(FieldSpec::text(FIELD_NAME_KEY, "NAME")),
        )
        .javascript(field_variable),
        BlockEntry::new(
            field_block("field_image", "Static image (JPEG, PNG, GIF, SVG, BMP).", "567")
                .field(FieldSpec::text("SRC", IMAGE_SRC))
                .field(FieldSpec::number("WIDTH", 15.0))
                .field(FieldSpec::number("HEIGHT", 15.0))
                .field(FieldSpec::text("ALT", "*"))
                .field(FieldSpec::boolean("FLIP_RTL", false)),
        )
        .javascript(field_image),
        BlockEntry::new(ShapeDescriptor::new("imagestest").output(None).colour("255")),
    ]
}

pub fn register(registry: &mut BlockRegistry) -> Result<()> {
    for entry in factory_entries() {
        registry.register_entry(entry)?;
    }

    registry.register_entry(
        BlockEntry::new(
            ShapeDescriptor::new("input_statement")
                .value_slot("VALUE0", Some("String"))
                .value_slot("VALUE1", Some("String"))
                .value_slot("VALUE2", Some("String"))
                .output(Some("text"))
                .colour(FIELD_COLOUR)
                .tooltip("Returns an object holding the property values."),
        )
        .python(property_values)
        .javascript(property_values),
    )?;

    registry.register_entry(
        BlockEntry::new(
            ShapeDescriptor::new("properties_join")
                .field(FieldSpec::text("TEXT_NAME", "object"))
                .field(FieldSpec::text("TEXT_INPUT", "myObj"))
                .output(Some("String"))
                .tooltip("Combines the properties into one object."),
        )
        .python(properties_join)
        .javascript(properties_join),
    )?;

    registry.register_entry(
        BlockEntry::new(
            ShapeDescriptor::new("colour_hue")
                .field(FieldSpec::number("HUE", 0.0))
                .output(Some("Colour"))
                .tooltip("Paint the block with this colour.")
                .help_url(format!("{}#t=55", HELP_URL))
                .mutation(MutationShape::new(MutationKind::Colour, no_rows).driven_by("HUE")),
        )
        .python(colour_hue)
        .javascript(colour_hue),
    )?;

    Ok(())
}

/// Type check list read from the type blocks attached to `slot`
fn types_from(gen: &CodeGenerator<'_>, node: &Node, slot: &str) -> Result<Vec<String>> {
    let ws = gen.workspace();
    let Some(target) = node.slot_target(slot) else {
        return Ok(Vec::new());
    };
    let child = ws.node(target)?;
    if !child.enabled {
        return Ok(Vec::new());
    }
    match child.block_type.as_str() {
        "type_other" => Ok(vec![json_string(&gen.field_text(child, "TYPE"))]),
        "type_group" => {
            let mut types: Vec<String> = Vec::new();
            for member in child.slots.iter().filter(|s| s.kind == SlotKind::Value) {
                for t in types_from(gen, child, &member.name)? {
                    if !types.contains(&t) {
                        types.push(t);
                    }
                }
            }
            Ok(types)
        }
        other => {
            let entry = gen.registry().lookup(other)?;
            Ok(vec![entry
                .shape
                .value_type
                .as_deref()
                .map(json_string)
                .unwrap_or_else(|| "null".to_string())])
        }
    }
}

/// `setCheck` argument for `slot`, `None` when no type is attached
fn optional_types(gen: &CodeGenerator<'_>, node: &Node, slot: &str) -> Result<Option<String>> {
    let types = types_from(gen, node, slot)?;
    Ok(match types.as_slice() {
        [] => None,
        _ if types.iter().any(|t| t == "null") => Some("null".to_string()),
        [only] => Some(only.clone()),
        _ => Some(format!("[{}]", types.join(", "))),
    })
}

fn connection_line(
    gen: &CodeGenerator<'_>,
    node: &Node,
    function: &str,
    slot: &str,
) -> Result<String> {
    let check = optional_types(gen, node, slot)?
        .map(|types| format!(", {}", types))
        .unwrap_or_default();
    Ok(format!("{}this.{}(true{});\n", BODY_INDENT, function, check))
}

fn string_argument(gen: &mut CodeGenerator<'_>, node: &Node, slot: &str) -> Result<String> {
    let code = gen.value_to_code(node, slot, OutputClass::None)?;
    Ok(if code.is_empty() { "\"\"".to_string() } else { code })
}

fn factory_base(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    let name = gen.field_text(node, "NAME");
    let mut code = format!("Blockly.Blocks[{}] = {{\n  init: function() {{\n", gen.quote(&name));

    let inputs = gen.statement_body(node, "INPUTS")?;
    code.push_str(&prefix_lines(&inputs, BODY_INDENT));

    match gen.field_text(node, "INLINE").as_str() {
        "EXT" => code.push_str(&format!("{}this.setInputsInline(false);\n", BODY_INDENT)),
        "INT" => code.push_str(&format!("{}this.setInputsInline(true);\n", BODY_INDENT)),
        _ => {}
    }

    let mode = match &node.mutation {
        MutationState::Connections(mode) => *mode,
        _ => ConnectionMode::None,
    };
    match mode {
        ConnectionMode::Left => {
            code.push_str(&connection_line(gen, node, "setOutput", "OUTPUTTYPE")?)
        }
        ConnectionMode::Both => {
            code.push_str(&connection_line(gen, node, "setPreviousStatement", "TOPTYPE")?);
            code.push_str(&connection_line(gen, node, "setNextStatement", "BOTTOMTYPE")?);
        }
        ConnectionMode::Top => {
            code.push_str(&connection_line(gen, node, "setPreviousStatement", "TOPTYPE")?)
        }
        ConnectionMode::Bottom => {
            code.push_str(&connection_line(gen, node, "setNextStatement", "BOTTOMTYPE")?)
        }
        ConnectionMode::None => {}
    }

    let colour = gen.value_to_code(node, "COLOUR", OutputClass::None)?;
    if let Ok(hue) = colour.trim().parse::<f64>() {
        code.push_str(&format!("{}this.setColour({});\n", BODY_INDENT, hue.trunc()));
    }

    let tooltip = string_argument(gen, node, "TOOLTIP")?;
    let help_url = string_argument(gen, node, "HELPURL")?;
    code.push_str(&format!("{}this.setTooltip({});\n", BODY_INDENT, tooltip));
    code.push_str(&format!("{}this.setHelpUrl({});\n", BODY_INDENT, help_url));
    code.push_str("  }\n};\n");
    Ok(Fragment::statement(code))
}

fn input_code(
    node: &Node,
    gen: &mut CodeGenerator<'_>,
    method: &str,
    named: bool,
) -> Result<Fragment> {
    let name = if named {
        json_string(&gen.field_text(node, INPUT_NAME_KEY))
    } else {
        String::new()
    };
    let mut lines = vec![format!("this.{}({})", method, name)];
    if let Some(check) = optional_types(gen, node, "TYPE")? {
        lines.push(format!("    .setCheck({})", check));
    }
    let align = gen.field_text(node, "ALIGN");
    if !align.is_empty() && align != "LEFT" {
        lines.push(format!("    .setAlign(Blockly.inputs.Align.{})", align));
    }
    let fields = gen.statement_body(node, "FIELDS")?;
    lines.extend(fields.lines().map(|line| format!("    {}", line)));
    Ok(Fragment::statement(format!("{};\n", lines.join("\n"))))
}

fn input_value(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    input_code(node, gen, "appendValueInput", true)
}

fn input_object(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    input_code(node, gen, "appendStatementInput", true)
}

fn input_dummy(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    input_code(node, gen, "appendDummyInput", false)
}

fn input_end_row(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    input_code(node, gen, "appendEndRowInput", false)
}

fn append_field(field: String) -> Result<Fragment> {
    Ok(Fragment::statement(format!(".appendField({})\n", field)))
}

fn named_field(gen: &CodeGenerator<'_>, node: &Node, constructor: String) -> Result<Fragment> {
    let name = json_string(&gen.field_text(node, FIELD_NAME_KEY));
    append_field(format!("{}, {}", constructor, name))
}

fn field_static(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    append_field(json_string(&gen.field_text(node, "TEXT")))
}

fn field_label_serializable(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    let text = json_string(&gen.field_text(node, "TEXT"));
    named_field(gen, node, format!("new Blockly.FieldLabelSerializable({})", text))
}

fn field_input(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    let text = json_string(&gen.field_text(node, "TEXT"));
    named_field(gen, node, format!("new Blockly.FieldTextInput({})", text))
}

fn field_number(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    let number = |name: &str, default: f64| {
        node.field(name)
            .and_then(FieldValue::as_number)
            .unwrap_or(default)
    };
    let mut args = vec![gen.field_text(node, "VALUE")];
    let (min, max, precision) = (
        number("MIN", f64::NEG_INFINITY),
        number("MAX", f64::INFINITY),
        number("PRECISION", 0.0),
    );
    if min > f64::NEG_INFINITY || max < f64::INFINITY || precision != 0.0 {
        for value in [min, max, precision] {
            args.push(FieldValue::Number(value).as_text());
        }
    }
    named_field(gen, node, format!("new Blockly.FieldNumber({})", args.join(", ")))
}

fn field_angle(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    let angle = gen.field_text(node, "ANGLE");
    named_field(gen, node, format!("new Blockly.FieldAngle({})", angle))
}

fn field_dropdown(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    let text = |name: String| gen.field_text(node, &name);
    let number = |name: String| {
        node.field(&name)
            .and_then(FieldValue::as_number)
            .unwrap_or(15.0)
    };
    let options: Vec<String> = node
        .mutation
        .option_kinds()
        .iter()
        .enumerate()
        .map(|(i, kind)| {
            let user = match kind {
                OptionKind::Text => serde_json::Value::String(text(format!("USER{}", i))),
                OptionKind::Image => serde_json::json!({
                    "src": text(format!("SRC{}", i)),
                    "width": number(format!("WIDTH{}", i)),
                    "height": number(format!("HEIGHT{}", i)),
                    "alt": text(format!("ALT{}", i)),
                }),
            };
            serde_json::json!([user, text(format!("CPU{}", i))]).to_string()
        })
        .collect();
    named_field(
        gen,
        node,
        format!("new Blockly.FieldDropdown([{}])", options.join(", ")),
    )
}

fn field_checkbox(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    let checked = json_string(&gen.field_text(node, "CHECKED"));
    named_field(gen, node, format!("new Blockly.FieldCheckbox({})", checked))
}

fn field_colour(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    let colour = json_string(&gen.field_text(node, "COLOUR"));
    named_field(gen, node, format!("new Blockly.FieldColour({})", colour))
}

fn field_variable(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    let text = json_string(&gen.field_text(node, "TEXT"));
    named_field(gen, node, format!("new Blockly.FieldVariable({})", text))
}

fn field_image(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    let src = json_string(&gen.field_text(node, "SRC"));
    let alt = json_string(&gen.field_text(node, "ALT"));
    let flip = node
        .field("FLIP_RTL")
        .and_then(FieldValue::as_bool)
        .unwrap_or(false);
    append_field(format!(
        "new Blockly.FieldImage({}, {}, {}, {{ alt: {}, flipRtl: {} }})",
        src,
        gen.field_text(node, "WIDTH"),
        gen.field_text(node, "HEIGHT"),
        alt,
        flip
    ))
}

/// List of the attached property values, skipping empty slots
fn property_values(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    let mut values = Vec::new();
    for slot in ["VALUE0", "VALUE1", "VALUE2"] {
        let code = gen.value_to_code(node, slot, OutputClass::None)?;
        if !code.is_empty() {
            values.push(code);
        }
    }
    Ok(Fragment::value(format!("[{}]", values.join(", ")), OutputClass::Atomic))
}

fn properties_join(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    let name = gen.field_text(node, "TEXT_INPUT");
    Ok(Fragment::value(gen.quote(&name), OutputClass::Atomic))
}

fn colour_hue(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    Ok(Fragment::value(gen.field_text(node, "HUE"), OutputClass::Atomic))
}

/// Flag `factory_base` blocks whose NAME clashes with a standard block type
pub fn check_reserved_names(ws: &Workspace) -> Vec<Diagnostic> {
    ws.nodes()
        .filter(|node| node.block_type == "factory_base" && ws.is_effectively_enabled(node.id))
        .filter_map(|node| {
            let name = node.field_text("NAME")?;
            is_reserved(&name).then(|| Diagnostic {
                node: node.id,
                block_type: node.block_type.clone(),
                message: format!(
                    "Block type '{}' is already defined by the standard library.",
                    name
                ),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::registry::standard_registry;
    use bf_editor::{instantiate, MutationStore};
    use bf_model::NodeId;

    fn js(ws: &Workspace, root: NodeId) -> String {
        CodeGenerator::new(ws, standard_registry().unwrap(), Language::JavaScript)
            .generate(root)
            .unwrap()
    }

    #[test]
    fn test_empty_factory_base() {
        let mut ws = Workspace::new();
        let base = instantiate(&mut ws, standard_registry().unwrap(), "factory_base").unwrap();
        assert_eq!(
            js(&ws, base),
            "Blockly.Blocks['block_type'] = {\n  init: function() {\n    this.setTooltip(\"\");\n    this.setHelpUrl(\"\");\n  }\n};\n"
        );
    }

    #[test]
    fn test_factory_base_with_inputs_and_output() {
        let registry = standard_registry().unwrap();
        let mut ws = Workspace::new();
        let base = instantiate(&mut ws, registry, "factory_base").unwrap();
        ws.set_field(base, "NAME", FieldValue::text("math_add")).unwrap();
        ws.set_field(base, "INLINE", FieldValue::choice("INT")).unwrap();
        MutationStore::new(registry)
            .set_state(&mut ws, base, MutationState::Connections(ConnectionMode::Left))
            .unwrap();

        let input = instantiate(&mut ws, registry, "input_value").unwrap();
        ws.set_field(input, INPUT_NAME_KEY, FieldValue::text("A")).unwrap();
        let number = instantiate(&mut ws, registry, "type_number").unwrap();
        ws.attach(input, "TYPE", number).unwrap();
        let label = instantiate(&mut ws, registry, "field_static").unwrap();
        ws.set_field(label, "TEXT", FieldValue::text("add")).unwrap();
        ws.attach(input, "FIELDS", label).unwrap();
        ws.attach(base, "INPUTS", input).unwrap();

        let hue = instantiate(&mut ws, registry, "colour_hue").unwrap();
        ws.set_field(hue, "HUE", FieldValue::Number(230.0)).unwrap();
        ws.attach(base, "COLOUR", hue).unwrap();

        let code = js(&ws, base);
        assert!(code.starts_with("Blockly.Blocks['math_add'] = {\n"));
        assert!(code.contains(
            "    this.appendValueInput(\"A\")\n        .setCheck(\"Number\")\n        .appendField(\"add\");\n"
        ));
        assert!(code.contains("    this.setInputsInline(true);\n"));
        // OUTPUTTYPE holds the type_null shadow
        assert!(code.contains("    this.setOutput(true, null);\n"));
        assert!(code.contains("    this.setColour(230);\n"));
    }

    #[test]
    fn test_type_group_check_list() {
        let registry = standard_registry().unwrap();
        let mut ws = Workspace::new();
        let input = instantiate(&mut ws, registry, "input_value").unwrap();
        let group = instantiate(&mut ws, registry, "type_group").unwrap();
        for (slot, block_type) in [("TYPE0", "type_number"), ("TYPE1", "type_string")] {
            let child = instantiate(&mut ws, registry, block_type).unwrap();
            ws.attach(group, slot, child).unwrap();
        }
        ws.attach(input, "TYPE", group).unwrap();
        assert_eq!(
            js(&ws, input),
            "this.appendValueInput(\"NAME\")\n    .setCheck([\"Number\", \"String\"]);\n"
        );
    }

    #[test]
    fn test_dropdown_options() {
        let registry = standard_registry().unwrap();
        let mut ws = Workspace::new();
        let dropdown = instantiate(&mut ws, registry, "field_dropdown").unwrap();
        MutationStore::new(registry)
            .set_state(
                &mut ws,
                dropdown,
                MutationState::OptionKinds(vec![OptionKind::Text, OptionKind::Image]),
            )
            .unwrap();
        let code = js(&ws, dropdown);
        assert!(code
            .starts_with(".appendField(new Blockly.FieldDropdown([[\"option\",\"OPTIONNAME\"], [{"));
        assert!(code.contains("\"width\":15.0"));
        assert!(code.ends_with("]), \"NAME\")\n"));
    }

    #[test]
    fn test_number_field_limits() {
        let registry = standard_registry().unwrap();
        let mut ws = Workspace::new();
        let field = instantiate(&mut ws, registry, "field_number").unwrap();
        assert_eq!(
            js(&ws, field),
            ".appendField(new Blockly.FieldNumber(0), \"NAME\")\n"
        );
        ws.set_field(field, "MIN", FieldValue::Number(0.0)).unwrap();
        assert_eq!(
            js(&ws, field),
            ".appendField(new Blockly.FieldNumber(0, 0, Infinity, 0), \"NAME\")\n"
        );
    }

    #[test]
    fn test_reserved_name_is_flagged() {
        let registry = standard_registry().unwrap();
        let mut ws = Workspace::new();
        let base = instantiate(&mut ws, registry, "factory_base").unwrap();
        assert!(check_reserved_names(&ws).is_empty());
        ws.set_field(base, "NAME", FieldValue::text("type_group")).unwrap();
        let diagnostics = check_reserved_names(&ws);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].node, base);
    }
}
