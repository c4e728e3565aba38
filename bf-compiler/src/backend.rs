//! Per-language output conventions

use crate::language::Language;
use crate::Result;

pub const DEFAULT_INDENT: &str = "  ";

/// Language-specific pieces of code emission shared by all generators
pub trait LanguageBackend {
    fn language(&self) -> Language;

    /// Prefix for one level of nested statements
    fn indent(&self) -> &str;

    fn set_indent(&mut self, indent: String);

    /// Turn a value fragment that stands alone into a full statement
    fn scrub_naked_value(&self, line: &str) -> String;

    /// String literal for `text`
    fn quote(&self, text: &str) -> String;

    /// Single-line comment
    fn comment(&self, text: &str) -> String;

    /// Prepend collected definitions to the generated body
    fn finish(&self, code: &str, definitions: &[&str]) -> String {
        if definitions.is_empty() {
            return code.to_string();
        }
        format!("{}\n\n{}", definitions.join("\n"), code)
    }
}

fn escape_single_quoted(text: &str) -> String {
    let escaped = text
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('\'', "\\'");
    format!("'{}'", escaped)
}

#[derive(Debug, Clone)]
pub struct PythonBackend {
    indent: String,
}

impl PythonBackend {
    pub fn new() -> Self {
        Self {
            indent: DEFAULT_INDENT.to_string(),
        }
    }
}

impl Default for PythonBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageBackend for PythonBackend {
    fn language(&self) -> Language {
        Language::Python
    }

    fn indent(&self) -> &str {
        &self.indent
    }

    fn set_indent(&mut self, indent: String) {
        self.indent = indent;
    }

    fn scrub_naked_value(&self, line: &str) -> String {
        format!("{}\n", line)
    }

    fn quote(&self, text: &str) -> String {
        escape_single_quoted(text)
    }

    fn comment(&self, text: &str) -> String {
        format!("# {}\n", text)
    }
}

#[derive(Debug, Clone)]
pub struct JavaScriptBackend {
    indent: String,
}

impl JavaScriptBackend {
    pub fn new() -> Self {
        Self {
            indent: DEFAULT_INDENT.to_string(),
        }
    }
}

impl Default for JavaScriptBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageBackend for JavaScriptBackend {
    fn language(&self) -> Language {
        Language::JavaScript
    }

    fn indent(&self) -> &str {
        &self.indent
    }

    fn set_indent(&mut self, indent: String) {
        self.indent = indent;
    }

    fn scrub_naked_value(&self, line: &str) -> String {
        format!("{};\n", line)
    }

    fn quote(&self, text: &str) -> String {
        escape_single_quoted(text)
    }

    fn comment(&self, text: &str) -> String {
        format!("// {}\n", text)
    }
}

/// Backend factory
pub struct BackendFactory;

impl BackendFactory {
    /// Create a backend for the named target
    pub fn create_backend(target: &str) -> Result<Box<dyn LanguageBackend>> {
        Ok(Self::backend_for(target.parse()?))
    }

    pub fn backend_for(language: Language) -> Box<dyn LanguageBackend> {
        match language {
            Language::Python => Box::new(PythonBackend::new()),
            Language::JavaScript => Box::new(JavaScriptBackend::new()),
        }
    }

    /// List all available backends
    pub fn available_backends() -> Vec<&'static str> {
        Language::ALL.iter().map(|l| l.as_str()).collect()
    }
}
