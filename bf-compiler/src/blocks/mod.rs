//! Standard block library
//!
//! Shapes and generators for the block factory, type, program and AI
//! pipeline blocks.

pub mod ai;
pub mod factory;
pub mod program;
pub mod types;

use crate::registry::BlockRegistry;
use crate::Result;

/// Register every standard block type
pub fn register_standard(registry: &mut BlockRegistry) -> Result<()> {
    types::register(registry)?;
    factory::register(registry)?;
    program::register(registry)?;
    ai::register(registry)?;
    Ok(())
}

/// JSON string literal, the way block definitions spell names and labels
pub(crate) fn json_string(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

/// Option values that stand for "nothing selected"
pub(crate) fn is_unset(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case("none")
}

pub(crate) fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_string_escapes() {
        assert_eq!(json_string("a \"b\""), r#""a \"b\"""#);
    }

    #[test]
    fn test_unset_values() {
        assert!(is_unset(""));
        assert!(is_unset("NONE"));
        assert!(!is_unset("sklearn"));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(r"C:\data\x.csv"), "C:/data/x.csv");
    }
}
