//! Output classes for value fragments
//!
//! A value generator reports how tightly its fragment binds so the parent
//! can decide whether the child needs parentheses.

use serde::{Deserialize, Serialize};

/// Binding strength of a value fragment, tightest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OutputClass {
    Atomic,
    Member,
    FunctionCall,
    Unary,
    Multiplicative,
    Additive,
    Relational,
    LogicalNot,
    LogicalAnd,
    LogicalOr,
    Conditional,
    Union,
    Assignment,
    None,
}

impl OutputClass {
    pub fn precedence(self) -> u8 {
        self as u8
    }

    /// Same-class nesting that reads the same with or without parentheses
    fn is_associative_with(self, outer: OutputClass) -> bool {
        matches!(
            (self, outer),
            (OutputClass::Member, OutputClass::Member)
                | (OutputClass::FunctionCall, OutputClass::Member)
                | (OutputClass::LogicalAnd, OutputClass::LogicalAnd)
                | (OutputClass::LogicalOr, OutputClass::LogicalOr)
                | (OutputClass::Union, OutputClass::Union)
                | (OutputClass::Additive, OutputClass::Additive)
        )
    }
}

/// Whether a child of class `inner` must be wrapped when placed in a
/// position that binds as `outer`
pub fn needs_parens(inner: OutputClass, outer: OutputClass) -> bool {
    if matches!(
        (inner, outer),
        (OutputClass::Atomic, OutputClass::Atomic) | (OutputClass::None, OutputClass::None)
    ) {
        return false;
    }
    if inner.is_associative_with(outer) {
        return false;
    }
    outer <= inner
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_looser_child_is_wrapped() {
        assert!(needs_parens(OutputClass::Additive, OutputClass::Multiplicative));
        assert!(!needs_parens(OutputClass::Multiplicative, OutputClass::Additive));
    }

    #[test]
    fn test_associative_pairs_are_not_wrapped() {
        assert!(!needs_parens(OutputClass::Union, OutputClass::Union));
        assert!(!needs_parens(OutputClass::FunctionCall, OutputClass::Member));
        assert!(needs_parens(OutputClass::Relational, OutputClass::Relational));
    }

    #[test]
    fn test_atomic_and_none_pass_through() {
        assert!(!needs_parens(OutputClass::Atomic, OutputClass::Atomic));
        assert!(!needs_parens(OutputClass::None, OutputClass::None));
        assert!(!needs_parens(OutputClass::Atomic, OutputClass::None));
        assert!(needs_parens(OutputClass::Union, OutputClass::Atomic));
    }
}
