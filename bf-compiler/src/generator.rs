//! Generator dispatch over a block workspace
//!
//! Statement chains are walked head to tail; value slots are expanded
//! recursively by the generators that need them. Generation only reads the
//! workspace.

use crate::backend::{BackendFactory, LanguageBackend};
use crate::language::Language;
use crate::order::{needs_parens, OutputClass};
use crate::registry::{BlockRegistry, Fragment};
use crate::Result;
use bf_model::{Node, NodeId, Workspace};
use indexmap::IndexMap;
use tracing::{debug, warn};

pub const MISSING_GENERATOR_PREFIX: &str = "<<missing generator: ";

/// Placeholder emitted for a block type without a generator
pub fn missing_marker(block_type: &str) -> String {
    format!("{}{}>>", MISSING_GENERATOR_PREFIX, block_type)
}

/// Prefix every line of `text`
pub fn prefix_lines(text: &str, prefix: &str) -> String {
    text.split_inclusive('\n')
        .map(|line| format!("{}{}", prefix, line))
        .collect()
}

/// Strip trailing blanks from lines and leading empty lines
fn tidy(code: &str) -> String {
    let code: String = code
        .split_inclusive('\n')
        .map(|line| match line.strip_suffix('\n') {
            Some(body) => format!("{}\n", body.trim_end_matches([' ', '\t'])),
            None => line.to_string(),
        })
        .collect();
    code.trim_start_matches('\n').to_string()
}

pub struct CodeGenerator<'a> {
    ws: &'a Workspace,
    registry: &'a BlockRegistry,
    backend: Box<dyn LanguageBackend>,
    definitions: IndexMap<String, String>,
    missing: Vec<String>,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(ws: &'a Workspace, registry: &'a BlockRegistry, language: Language) -> Self {
        Self::with_backend(ws, registry, BackendFactory::backend_for(language))
    }

    pub fn with_backend(
        ws: &'a Workspace,
        registry: &'a BlockRegistry,
        backend: Box<dyn LanguageBackend>,
    ) -> Self {
        Self {
            ws,
            registry,
            backend,
            definitions: IndexMap::new(),
            missing: Vec::new(),
        }
    }

    pub fn language(&self) -> Language {
        self.backend.language()
    }

    pub fn backend(&self) -> &dyn LanguageBackend {
        self.backend.as_ref()
    }

    pub fn workspace(&self) -> &'a Workspace {
        self.ws
    }

    pub fn registry(&self) -> &'a BlockRegistry {
        self.registry
    }

    /// Block types that had no generator, in the order they were met
    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    fn node_fragment(&mut self, node: &'a Node) -> Result<Fragment> {
        let registry = self.registry;
        let entry = registry.lookup(&node.block_type)?;
        let language = self.language();
        match entry.generators.get(&language).copied() {
            Some(generator) => generator(node, self),
            None => {
                warn!(
                    "No {} generator for block type {} ({})",
                    language, node.block_type, node.id
                );
                self.missing.push(node.block_type.clone());
                let marker = missing_marker(&node.block_type);
                Ok(if entry.shape.is_value_block() {
                    Fragment::value(marker, OutputClass::Atomic)
                } else {
                    Fragment::statement(format!("{}\n", marker))
                })
            }
        }
    }

    /// Code for the statement chain starting at `root`. Disabled nodes are
    /// skipped and the chain continues after them.
    pub fn generate(&mut self, root: NodeId) -> Result<String> {
        let ws = self.ws;
        ws.node(root)?;
        let mut code = String::new();
        for id in ws.chain(root) {
            let node = ws.node(id)?;
            if !node.enabled {
                continue;
            }
            match self.node_fragment(node)? {
                Fragment::Statement(text) => code.push_str(&text),
                Fragment::Value(text, _) => {
                    code.push_str(&self.backend.scrub_naked_value(&text))
                }
            }
        }
        Ok(code)
    }

    /// Expand one value node
    pub fn generate_value(&mut self, id: NodeId) -> Result<(String, OutputClass)> {
        let node = self.ws.node(id)?;
        if !node.enabled {
            return Ok((String::new(), OutputClass::None));
        }
        match self.node_fragment(node)? {
            Fragment::Value(code, class) => Ok((code, class)),
            Fragment::Statement(code) => Ok((code.trim_end().to_string(), OutputClass::None)),
        }
    }

    /// Code of the value attached to `slot`, parenthesized when it binds
    /// more loosely than `outer`. Empty when nothing is attached.
    pub fn value_to_code(&mut self, node: &Node, slot: &str, outer: OutputClass) -> Result<String> {
        let Some(target) = node.slot_target(slot) else {
            return Ok(String::new());
        };
        let (code, inner) = self.generate_value(target)?;
        if code.is_empty() {
            return Ok(code);
        }
        if needs_parens(inner, outer) {
            Ok(format!("({})", code))
        } else {
            Ok(code)
        }
    }

    /// Unindented code of the chain attached to `slot`
    pub fn statement_body(&mut self, node: &Node, slot: &str) -> Result<String> {
        match node.slot_target(slot) {
            Some(target) => self.generate(target),
            None => Ok(String::new()),
        }
    }

    /// Code of the chain attached to `slot`, indented one level
    pub fn statement_to_code(&mut self, node: &Node, slot: &str) -> Result<String> {
        let body = self.statement_body(node, slot)?;
        Ok(prefix_lines(&body, self.backend.indent()))
    }

    /// Field value as generators read it; empty when absent
    pub fn field_text(&self, node: &Node, name: &str) -> String {
        node.field_text(name).unwrap_or_default()
    }

    pub fn quote(&self, text: &str) -> String {
        self.backend.quote(text)
    }

    /// Register a definition emitted once ahead of the generated code.
    /// The first definition under a key wins.
    pub fn provide_definition(&mut self, key: impl Into<String>, code: impl Into<String>) {
        self.definitions.entry(key.into()).or_insert_with(|| code.into());
    }

    pub fn definitions(&self) -> Vec<&str> {
        self.definitions.values().map(String::as_str).collect()
    }

    pub fn finish(&self, code: String, emit_definitions: bool) -> String {
        if emit_definitions {
            self.backend.finish(&code, &self.definitions())
        } else {
            code
        }
    }

    /// Code for every top-level chain, in node id order
    pub fn generate_workspace(&mut self, emit_definitions: bool) -> Result<String> {
        let ws = self.ws;
        let mut chunks = Vec::new();
        for top in ws.top_nodes() {
            let code = self.generate(top)?;
            if !code.is_empty() {
                chunks.push(code);
            }
        }
        let code = tidy(&chunks.join("\n"));
        debug!(
            "Generated {} chain(s) of {}, {} missing generator(s)",
            chunks.len(),
            self.language(),
            self.missing.len()
        );
        Ok(self.finish(code, emit_definitions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{standard_registry, BlockEntry};
    use bf_editor::instantiate;
    use bf_model::{FieldValue, ShapeDescriptor};

    fn statement(ws: &mut Workspace, text: &str) -> NodeId {
        let id = instantiate(ws, standard_registry().unwrap(), "doStatement").unwrap();
        ws.set_field(id, "TEXT", FieldValue::text(text)).unwrap();
        id
    }

    #[test]
    fn test_chain_skips_disabled_nodes() {
        let mut ws = Workspace::new();
        let a = statement(&mut ws, "a()");
        let b = statement(&mut ws, "b()");
        let c = statement(&mut ws, "c()");
        ws.connect_next(a, b).unwrap();
        ws.connect_next(b, c).unwrap();
        ws.set_enabled(b, false).unwrap();

        let mut generator = CodeGenerator::new(&ws, standard_registry().unwrap(), Language::Python);
        assert_eq!(generator.generate(a).unwrap(), "a()\nc()\n");
    }

    #[test]
    fn test_missing_generator_marker() {
        let registry = standard_registry().unwrap();
        let mut ws = Workspace::new();
        let id = instantiate(&mut ws, registry, "ai_framework").unwrap();

        let mut generator = CodeGenerator::new(&ws, registry, Language::JavaScript);
        assert_eq!(
            generator.generate(id).unwrap(),
            "<<missing generator: ai_framework>>\n"
        );
        assert_eq!(generator.missing(), ["ai_framework".to_string()]);
    }

    #[test]
    fn test_value_marker_is_atomic() {
        let registry = standard_registry().unwrap();
        let mut ws = Workspace::new();
        let id = instantiate(&mut ws, registry, "imagestest").unwrap();
        let mut generator = CodeGenerator::new(&ws, registry, Language::Python);
        assert_eq!(
            generator.generate_value(id).unwrap(),
            ("<<missing generator: imagestest>>".to_string(), OutputClass::Atomic)
        );
    }

    #[test]
    fn test_definitions_are_deduplicated() {
        fn uses_import(_: &Node, gen: &mut CodeGenerator<'_>) -> Result<Fragment> {
            gen.provide_definition("import_os", "import os");
            Ok(Fragment::statement("os.getcwd()\n"))
        }
        let mut registry = BlockRegistry::new();
        registry
            .register_entry(
                BlockEntry::new(ShapeDescriptor::new("cwd").statement(None)).python(uses_import),
            )
            .unwrap();
        let mut ws = Workspace::new();
        let a = instantiate(&mut ws, &registry, "cwd").unwrap();
        let b = instantiate(&mut ws, &registry, "cwd").unwrap();
        ws.connect_next(a, b).unwrap();

        let mut generator = CodeGenerator::new(&ws, &registry, Language::Python);
        let code = generator.generate_workspace(true).unwrap();
        assert_eq!(code, "import os\n\nos.getcwd()\nos.getcwd()\n");
    }

    #[test]
    fn test_prefix_lines() {
        assert_eq!(prefix_lines("a\nb\n", "  "), "  a\n  b\n");
        assert_eq!(prefix_lines("", "  "), "");
    }

    #[test]
    fn test_tidy_trailing_whitespace() {
        assert_eq!(tidy("\nx = 1  \ny\t\n"), "x = 1\ny\n");
    }
}
