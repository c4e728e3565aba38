//! Program blocks
//!
//! Free-form statements, comments, object setup and a few host helpers.

use super::{is_unset, json_string};
use crate::generator::CodeGenerator;
use crate::language::Language;
use crate::order::OutputClass;
use crate::registry::{BlockEntry, BlockRegistry, Fragment};
use crate::Result;
use bf_editor::FIELD_NAME_KEY;
use bf_model::{
    FieldSpec, MutationKind, MutationShape, MutationState, Node, ShapeDescriptor, SlotSpec,
};

const PROPERTY_COUNT: usize = 5;
const FUNCTION_COUNT: usize = 2;

fn terminator(language: Language) -> &'static str {
    match language {
        Language::Python => "",
        Language::JavaScript => ";",
    }
}

/// The TEXT field verbatim as one statement
fn verbatim(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    let text = gen.field_text(node, "TEXT");
    Ok(Fragment::statement(format!("{}{}\n", text, terminator(gen.language()))))
}

fn text_comment(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    let marker = match gen.language() {
        Language::Python => "#",
        Language::JavaScript => "//",
    };
    let text = gen.field_text(node, "TEXT");
    Ok(Fragment::statement(format!("{}{}\n", marker, text)))
}

/// Property assignments then method calls on one object. Each list stops at
/// its first unset name.
fn custom_object(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    let object = gen.field_text(node, "objectname");
    let end = terminator(gen.language());
    let mut code = String::new();

    for i in 1..=PROPERTY_COUNT {
        let name = gen.field_text(node, &format!("name{}", i));
        if is_unset(&name) {
            break;
        }
        let value = gen.field_text(node, &format!("value{}", i));
        code.push_str(&format!("{}.{}={}{}\n", object, name, value, end));
    }
    for i in 1..=FUNCTION_COUNT {
        let name = gen.field_text(node, &format!("funname{}", i));
        if is_unset(&name) {
            break;
        }
        code.push_str(&format!("{}.{}(){}\n", object, name, end));
    }
    Ok(Fragment::statement(code))
}

fn messagebox(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    let op = gen.field_text(node, "op");
    let message = json_string(&gen.field_text(node, "opmessage"));
    let code = match op.as_str() {
        "showinfo" => format!("messagebox.showinfo(\"信息\", {})\n", message),
        "showwarning" => format!("messagebox.showwarning(\"警告\", {})\n", message),
        "askokcancel" => format!("result = messagebox.askokcancel(\"确认\", {})\n", message),
        _ => return Ok(Fragment::statement("")),
    };
    gen.provide_definition("tkinter_messagebox", "from tkinter import messagebox");
    Ok(Fragment::statement(code))
}

fn open_file(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    let path = gen.quote(&super::normalize_path(&gen.field_text(node, "FILE")));
    let function = match gen.language() {
        Language::Python => "open",
        Language::JavaScript => "openFile",
    };
    Ok(Fragment::value(
        format!("{}({})", function, path),
        OutputClass::FunctionCall,
    ))
}

fn function_expression(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    let branch = gen.statement_to_code(node, "STACK")?;
    let name = gen.value_to_code(node, "NAME", OutputClass::Atomic)?;
    let count = node.mutation.count().unwrap_or(0);
    let mut args = Vec::with_capacity(count);
    for i in 0..count {
        args.push(gen.value_to_code(node, &format!("PARAM{}", i), OutputClass::Atomic)?);
    }
    Ok(Fragment::value(
        format!("yak.{}=function ({}) {{\n{}}}", name, args.join(", "), branch),
        OutputClass::Atomic,
    ))
}

fn param_rows(state: &MutationState) -> Vec<SlotSpec> {
    (0..state.count().unwrap_or(0))
        .map(|i| SlotSpec::value(format!("PARAM{}", i)))
        .collect()
}

fn dataset_option(node: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
    let value = gen.field_text(node, FIELD_NAME_KEY);
    Ok(Fragment::statement(format!("{}\n", value)))
}

fn statement_block(block_type: &str, colour: &str, tooltip: &str) -> ShapeDescriptor {
    ShapeDescriptor::new(block_type)
        .statement(None)
        .colour(colour)
        .tooltip(tooltip)
}

pub fn register(registry: &mut BlockRegistry) -> Result<()> {
    registry.register_entry(
        BlockEntry::new(
            statement_block("doStatement", "80", "Statements entered here run in order.")
                .field(FieldSpec::text("TEXT", "")),
        )
        .python(verbatim)
        .javascript(verbatim),
    )?;
    registry.register_entry(
        BlockEntry::new(
            statement_block("doReady", "80", "Dataset preparation statements, run in order.")
                .field(FieldSpec::text("TEXT", "abc")),
        )
        .python(verbatim)
        .javascript(verbatim),
    )?;
    registry.register_entry(
        BlockEntry::new(
            statement_block("textcomment", "60", "A comment line.")
                .field(FieldSpec::text("TEXT", "")),
        )
        .python(text_comment)
        .javascript(text_comment),
    )?;

    let mut object = statement_block(
        "custom_object",
        "290",
        "Set properties and call methods on an object.",
    )
    .field(FieldSpec::text("objectname", "obj"));
    for i in 1..=PROPERTY_COUNT {
        object = object
            .field(FieldSpec::text(format!("name{}", i), "none"))
            .field(FieldSpec::text(format!("value{}", i), ""));
    }
    for i in 1..=FUNCTION_COUNT {
        object = object.field(FieldSpec::text(format!("funname{}", i), "none"));
    }
    registry.register_entry(
        BlockEntry::new(object)
            .python(custom_object)
            .javascript(custom_object),
    )?;

    registry.register_entry(
        BlockEntry::new(
            statement_block("messagebox", "20", "Show a message dialog.")
                .field(FieldSpec::choice("op", "showinfo"))
                .field(FieldSpec::text("opmessage", "")),
        )
        .python(messagebox),
    )?;

    registry.register_entry(
        BlockEntry::new(
            ShapeDescriptor::new("open_file")
                .field(FieldSpec::text("FILE", ""))
                .output(Some("String"))
                .colour("230"),
        )
        .python(open_file)
        .javascript(open_file),
    )?;

    registry.register_entry(
        BlockEntry::new(
            ShapeDescriptor::new("js_function_expression")
                .value_slot("NAME", None)
                .slot(SlotSpec::dummy("END"))
                .statement_slot("STACK", None)
                .output(None)
                .colour("290")
                .tooltip("Function expression.")
                .mutation(MutationShape::new(MutationKind::ParamCount, param_rows).before("END")),
        )
        .javascript(function_expression),
    )?;

    for (block_type, default, tooltip) in [
        ("field_dropdown_option_text", "none", "Text datasets live under datasets/text."),
        ("field_dropdown_option_image", "NONE", "Image datasets live under datasets/images."),
    ] {
        registry.register_entry(
            BlockEntry::new(
                statement_block(block_type, "160", tooltip)
                    .field(FieldSpec::choice(FIELD_NAME_KEY, default)),
            )
            .python(dataset_option),
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::standard_registry;
    use bf_editor::{instantiate, MutationStore};
    use bf_model::{FieldValue, NodeId, Workspace};

    fn code(ws: &Workspace, root: NodeId, language: Language) -> String {
        CodeGenerator::new(ws, standard_registry().unwrap(), language)
            .generate(root)
            .unwrap()
    }

    fn block(ws: &mut Workspace, block_type: &str, fields: &[(&str, &str)]) -> NodeId {
        let id = instantiate(ws, standard_registry().unwrap(), block_type).unwrap();
        for (name, value) in fields {
            ws.set_field(id, name, FieldValue::text(*value)).unwrap();
        }
        id
    }

    #[test]
    fn test_statement_terminators() {
        let mut ws = Workspace::new();
        let stmt = block(&mut ws, "doStatement", &[("TEXT", "x = 1")]);
        let comment = block(&mut ws, "textcomment", &[("TEXT", " done")]);
        ws.connect_next(stmt, comment).unwrap();
        assert_eq!(code(&ws, stmt, Language::Python), "x = 1\n# done\n");
        assert_eq!(code(&ws, stmt, Language::JavaScript), "x = 1;\n// done\n");
    }

    #[test]
    fn test_custom_object_stops_at_first_unset_name() {
        let mut ws = Workspace::new();
        let obj = block(
            &mut ws,
            "custom_object",
            &[
                ("objectname", "car"),
                ("name1", "speed"),
                ("value1", "10"),
                ("name3", "colour"),
                ("funname1", "start"),
            ],
        );
        assert_eq!(code(&ws, obj, Language::Python), "car.speed=10\ncar.start()\n");
        assert_eq!(code(&ws, obj, Language::JavaScript), "car.speed=10;\ncar.start();\n");
    }

    #[test]
    fn test_messagebox_imports_once() {
        let mut ws = Workspace::new();
        let a = block(&mut ws, "messagebox", &[("opmessage", "hi")]);
        let b = block(&mut ws, "messagebox", &[("op", "askokcancel"), ("opmessage", "ok?")]);
        ws.connect_next(a, b).unwrap();
        let mut gen = CodeGenerator::new(&ws, standard_registry().unwrap(), Language::Python);
        let body = gen.generate(a).unwrap();
        assert_eq!(
            gen.finish(body, true),
            "from tkinter import messagebox\n\nmessagebox.showinfo(\"信息\", \"hi\")\nresult = messagebox.askokcancel(\"确认\", \"ok?\")\n"
        );
    }

    #[test]
    fn test_open_file_value() {
        let mut ws = Workspace::new();
        let open = block(&mut ws, "open_file", &[("FILE", r"data\a.txt")]);
        let mut gen = CodeGenerator::new(&ws, standard_registry().unwrap(), Language::JavaScript);
        assert_eq!(
            gen.generate_value(open).unwrap(),
            ("openFile('data/a.txt')".to_string(), OutputClass::FunctionCall)
        );
    }

    #[test]
    fn test_function_expression_params() {
        let registry = standard_registry().unwrap();
        let mut ws = Workspace::new();
        let func = instantiate(&mut ws, registry, "js_function_expression").unwrap();
        MutationStore::new(registry)
            .set_state(&mut ws, func, MutationState::ParamCount(2))
            .unwrap();
        let names: Vec<_> = ws.node(func).unwrap().slots.iter().map(|s| s.name.clone()).collect();
        assert_eq!(names, vec!["NAME", "PARAM0", "PARAM1", "END", "STACK"]);

        for (slot, text) in [("NAME", "handler"), ("PARAM0", "a"), ("PARAM1", "b")] {
            let child = block(&mut ws, "type_other", &[("TYPE", text)]);
            ws.attach(func, slot, child).unwrap();
        }
        let body = block(&mut ws, "doStatement", &[("TEXT", "run()")]);
        ws.attach(func, "STACK", body).unwrap();

        let mut gen = CodeGenerator::new(&ws, registry, Language::JavaScript);
        let (code, class) = gen.generate_value(func).unwrap();
        assert_eq!(code, "yak.handler=function (a, b) {\n  run();\n}");
        assert_eq!(class, OutputClass::Atomic);
    }

    #[test]
    fn test_dataset_option_is_python_only() {
        let mut ws = Workspace::new();
        let option = block(
            &mut ws,
            "field_dropdown_option_text",
            &[(FIELD_NAME_KEY, "datasets/text/1.csv")],
        );
        assert_eq!(code(&ws, option, Language::Python), "datasets/text/1.csv\n");
        assert_eq!(
            code(&ws, option, Language::JavaScript),
            "<<missing generator: field_dropdown_option_text>>\n"
        );
    }
}
