//! Block type registry
//!
//! Maps a block type to its shape and to one generator per target language.
//! The standard library is registered once per process and is read-only
//! afterwards.

use crate::generator::CodeGenerator;
use crate::language::Language;
use crate::order::OutputClass;
use crate::{CompilerError, Result};
use bf_model::{Node, ShapeCatalog, ShapeDescriptor};
use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;
use tracing::{debug, info};

/// Code produced for one node
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Statement(String),
    Value(String, OutputClass),
}

impl Fragment {
    pub fn statement(code: impl Into<String>) -> Self {
        Fragment::Statement(code.into())
    }

    pub fn value(code: impl Into<String>, class: OutputClass) -> Self {
        Fragment::Value(code.into(), class)
    }

    pub fn code(&self) -> &str {
        match self {
            Fragment::Statement(code) | Fragment::Value(code, _) => code,
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Fragment::Value(..))
    }
}

/// Generator for one block type in one language
pub type GeneratorFn = fn(&Node, &mut CodeGenerator<'_>) -> Result<Fragment>;

/// Shape plus generators of one block type
#[derive(Debug, Clone)]
pub struct BlockEntry {
    pub shape: ShapeDescriptor,
    pub generators: BTreeMap<Language, GeneratorFn>,
}

impl BlockEntry {
    pub fn new(shape: ShapeDescriptor) -> Self {
        Self {
            shape,
            generators: BTreeMap::new(),
        }
    }

    pub fn generator(mut self, language: Language, generator: GeneratorFn) -> Self {
        self.generators.insert(language, generator);
        self
    }

    pub fn python(self, generator: GeneratorFn) -> Self {
        self.generator(Language::Python, generator)
    }

    pub fn javascript(self, generator: GeneratorFn) -> Self {
        self.generator(Language::JavaScript, generator)
    }

    pub fn languages(&self) -> Vec<Language> {
        self.generators.keys().copied().collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BlockRegistry {
    entries: IndexMap<String, BlockEntry>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the standard block library
    pub fn standard() -> Result<Self> {
        let mut registry = Self::new();
        crate::blocks::register_standard(&mut registry)?;
        info!("Registered {} standard block types", registry.len());
        Ok(registry)
    }

    pub fn register(
        &mut self,
        shape: ShapeDescriptor,
        generators: impl IntoIterator<Item = (Language, GeneratorFn)>,
    ) -> Result<()> {
        let mut entry = BlockEntry::new(shape);
        entry.generators.extend(generators);
        self.register_entry(entry)
    }

    pub fn register_entry(&mut self, entry: BlockEntry) -> Result<()> {
        let block_type = entry.shape.block_type.clone();
        if self.entries.contains_key(&block_type) {
            return Err(CompilerError::DuplicateBlock { block_type });
        }
        debug!(
            "Registering {} ({} generator(s))",
            block_type,
            entry.generators.len()
        );
        self.entries.insert(block_type, entry);
        Ok(())
    }

    pub fn get(&self, block_type: &str) -> Option<&BlockEntry> {
        self.entries.get(block_type)
    }

    /// Entry for `block_type`; an unknown type is a configuration error
    pub fn lookup(&self, block_type: &str) -> Result<&BlockEntry> {
        self.get(block_type)
            .ok_or_else(|| CompilerError::unregistered(block_type))
    }

    /// Generator for `(block_type, language)`, `None` when the type has no
    /// generator for that language
    pub fn generator(&self, block_type: &str, language: Language) -> Result<Option<GeneratorFn>> {
        Ok(self.lookup(block_type)?.generators.get(&language).copied())
    }

    pub fn block_types(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = &BlockEntry> {
        self.entries.values()
    }

    pub fn languages_for(&self, block_type: &str) -> Result<Vec<Language>> {
        Ok(self.lookup(block_type)?.languages())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ShapeCatalog for BlockRegistry {
    fn shape(&self, block_type: &str) -> Option<&ShapeDescriptor> {
        self.get(block_type).map(|entry| &entry.shape)
    }
}

static STANDARD_REGISTRY: OnceLock<std::result::Result<BlockRegistry, String>> = OnceLock::new();
static RESERVED_TYPES: OnceLock<BTreeSet<String>> = OnceLock::new();

/// Process-wide registry of the standard block library
pub fn standard_registry() -> Result<&'static BlockRegistry> {
    STANDARD_REGISTRY
        .get_or_init(|| BlockRegistry::standard().map_err(|e| e.to_string()))
        .as_ref()
        .map_err(|message| CompilerError::Registry {
            message: message.clone(),
        })
}

/// Block type names taken by the standard library
pub fn reserved_block_types() -> &'static BTreeSet<String> {
    RESERVED_TYPES.get_or_init(|| {
        standard_registry()
            .map(|registry| registry.block_types().map(str::to_string).collect())
            .unwrap_or_default()
    })
}

pub fn is_reserved(block_type: &str) -> bool {
    reserved_block_types().contains(block_type)
}
