//! Blockforge code generation
//!
//! Turns a block workspace into Python or JavaScript source. Each block type
//! is registered with its shape and one generator per target language; the
//! code generator walks statement chains and nested value expressions and
//! joins the fragments in traversal order.

pub mod backend;
pub mod blocks;
pub mod config;
pub mod generator;
pub mod language;
pub mod order;
pub mod registry;

// Re-export main types
pub use backend::{BackendFactory, JavaScriptBackend, LanguageBackend, PythonBackend};
pub use config::{CompilerConfig, ConfigError, LanguageConfig, LintConfig};
pub use generator::{CodeGenerator, MISSING_GENERATOR_PREFIX};
pub use language::Language;
pub use order::{needs_parens, OutputClass};
pub use registry::{
    reserved_block_types, standard_registry, BlockEntry, BlockRegistry, Fragment, GeneratorFn,
};

use bf_model::{NodeId, Workspace};

pub type Result<T> = std::result::Result<T, CompilerError>;

/// Compiler errors
#[derive(Debug, thiserror::Error)]
pub enum CompilerError {
    #[error("Unregistered block type: {block_type}")]
    UnregisteredType { block_type: String },

    #[error("Block type registered twice: {block_type}")]
    DuplicateBlock { block_type: String },

    #[error("Block registry error: {message}")]
    Registry { message: String },

    #[error("Invalid target: {target}")]
    InvalidTarget { target: String },

    #[error("Code generation failed: {message}")]
    Generation { message: String },

    #[error("Model error: {0}")]
    Model(#[from] bf_model::ModelError),

    #[error("Edit error: {0}")]
    Edit(#[from] bf_editor::EditError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompilerError {
    pub fn unregistered(block_type: impl Into<String>) -> Self {
        Self::UnregisteredType {
            block_type: block_type.into(),
        }
    }

    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }

    /// Whether this is the fatal unregistered-type condition, however it
    /// was wrapped on the way up
    pub fn is_unregistered(&self) -> bool {
        match self {
            CompilerError::UnregisteredType { .. } => true,
            CompilerError::Model(bf_model::ModelError::UnregisteredType { .. }) => true,
            CompilerError::Edit(e) => e.is_unregistered(),
            _ => false,
        }
    }
}

/// Compiler builder for fluent configuration
pub struct CompilerBuilder {
    config: CompilerConfig,
}

impl CompilerBuilder {
    pub fn new() -> Self {
        Self {
            config: CompilerConfig::default(),
        }
    }

    pub fn language(mut self, language: Language) -> Self {
        self.config.default_language = language.as_str().to_string();
        self
    }

    pub fn emit_definitions(mut self, enabled: bool) -> Self {
        self.config.emit_definitions = enabled;
        self
    }

    pub fn indent(mut self, language: Language, indent: impl Into<String>) -> Self {
        self.config
            .languages
            .entry(language.as_str().to_string())
            .or_default()
            .indent = Some(indent.into());
        self
    }

    pub fn build(self) -> Result<Compiler> {
        Compiler::new(self.config)
    }
}

impl Default for CompilerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Main compiler interface over the standard block registry
pub struct Compiler {
    config: CompilerConfig,
    registry: &'static BlockRegistry,
}

impl Compiler {
    pub fn new(config: CompilerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            registry: standard_registry()?,
        })
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    pub fn registry(&self) -> &'static BlockRegistry {
        self.registry
    }

    /// Language used when the caller does not name one
    pub fn default_language(&self) -> Result<Language> {
        Ok(self.config.default_language.parse()?)
    }

    fn code_generator<'w>(&self, ws: &'w Workspace, language: Language) -> CodeGenerator<'w> {
        let mut backend = BackendFactory::backend_for(language);
        if let Some(indent) = self.config.indent_for(language) {
            backend.set_indent(indent.to_string());
        }
        CodeGenerator::with_backend(ws, self.registry, backend)
    }

    /// Generate code for the statement chain starting at `root`
    pub fn generate(&self, ws: &Workspace, root: NodeId, language: Language) -> Result<String> {
        let mut generator = self.code_generator(ws, language);
        let code = generator.generate(root)?;
        Ok(generator.finish(code, self.config.emit_definitions))
    }

    /// Generate every top-level chain of the workspace
    pub fn generate_workspace(&self, ws: &Workspace, language: Language) -> Result<String> {
        self.code_generator(ws, language)
            .generate_workspace(self.config.emit_definitions)
    }

    /// Get available targets
    pub fn available_targets(&self) -> Vec<String> {
        BackendFactory::available_backends()
            .into_iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn update_config(&mut self, config: CompilerConfig) -> Result<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }
}

/// Convenience functions
pub mod convenience {
    use super::*;

    /// Generate a statement chain with the standard registry and default
    /// configuration, definitions included
    pub fn generate(ws: &Workspace, root: NodeId, language: Language) -> Result<String> {
        Compiler::new(CompilerConfig::default())?.generate(ws, root, language)
    }

    /// Expand a single value node
    pub fn generate_value(
        ws: &Workspace,
        node: NodeId,
        language: Language,
    ) -> Result<(String, OutputClass)> {
        CodeGenerator::new(ws, standard_registry()?, language).generate_value(node)
    }

    /// Generate the whole workspace with the given configuration
    pub fn generate_workspace(
        ws: &Workspace,
        language: Language,
        config: &CompilerConfig,
    ) -> Result<String> {
        Compiler::new(config.clone())?.generate_workspace(ws, language)
    }
}
