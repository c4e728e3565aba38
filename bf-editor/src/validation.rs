//! Workspace lint checks
//!
//! Checks are advisory: they annotate nodes with a warning and never block
//! editing or generation.

use bf_model::{MutationState, NodeId, Workspace};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

pub const FIELD_NAME_KEY: &str = "FIELDNAME";
pub const INPUT_NAME_KEY: &str = "INPUTNAME";

pub const EMPTY_DROPDOWN_MESSAGE: &str = "Drop down menu must have at least one option.";

/// Warning attached to one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub node: NodeId,
    pub block_type: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.node, self.block_type, self.message)
    }
}

/// Result of a lint pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LintReport {
    pub diagnostics: Vec<Diagnostic>,
    /// Nodes whose warning was set or cleared by this pass
    pub changed: Vec<NodeId>,
}

impl LintReport {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

fn noun_for(field_key: &str) -> &str {
    match field_key {
        FIELD_NAME_KEY => "field",
        INPUT_NAME_KEY => "input",
        other => other,
    }
}

pub fn duplicate_message(count: usize, field_key: &str) -> String {
    format!(
        "There are {} {} blocks with this name.",
        count,
        noun_for(field_key)
    )
}

/// Flag every node whose `field_key` value is shared with another enabled
/// node.
///
/// Names compare case-folded. Only enabled nodes (not inside a disabled
/// enclosing node) count toward a name's occurrences. Blank names are never
/// counted and never flagged. Quadratic in the number of nodes.
pub fn check_duplicate_names(ws: &Workspace, field_key: &str) -> BTreeMap<NodeId, Option<String>> {
    let mut results = BTreeMap::new();
    for node in ws.nodes() {
        let Some(value) = node.field(field_key) else {
            continue;
        };
        let name = value.as_text().to_lowercase();

        let mut count = 0;
        if !name.is_empty() {
            for other in ws.nodes() {
                let Some(other_value) = other.field(field_key) else {
                    continue;
                };
                let other_name = other_value.as_text();
                if !other_name.is_empty()
                    && ws.is_effectively_enabled(other.id)
                    && other_name.to_lowercase() == name
                {
                    count += 1;
                }
            }
        }

        let message = (count > 1).then(|| duplicate_message(count, field_key));
        results.insert(node.id, message);
    }
    results
}

/// Flag dropdown nodes that have no options left
pub fn check_dropdown_options(ws: &Workspace) -> BTreeMap<NodeId, Option<String>> {
    ws.nodes()
        .filter_map(|node| match &node.mutation {
            MutationState::OptionKinds(kinds) => {
                Some((node.id, kinds.is_empty().then(|| EMPTY_DROPDOWN_MESSAGE.to_string())))
            }
            _ => None,
        })
        .collect()
}

/// Run every check and write the outcome into each node's warning.
///
/// A dropdown without options reports that instead of any name clash.
/// Nodes no check applies to have their warning cleared.
pub fn lint_workspace(ws: &mut Workspace, name_keys: &[&str]) -> LintReport {
    let mut verdicts: BTreeMap<NodeId, Option<String>> =
        ws.ids().into_iter().map(|id| (id, None)).collect();

    for key in name_keys.iter().rev() {
        for (id, message) in check_duplicate_names(ws, key) {
            if message.is_some() {
                verdicts.insert(id, message);
            }
        }
    }
    for (id, message) in check_dropdown_options(ws) {
        if message.is_some() {
            verdicts.insert(id, message);
        }
    }

    let mut report = LintReport::default();
    for (id, message) in verdicts {
        let Ok(node) = ws.node_mut(id) else { continue };
        if node.warning != message {
            node.warning = message.clone();
            report.changed.push(id);
        }
        if let Some(message) = message {
            report.diagnostics.push(Diagnostic {
                node: id,
                block_type: node.block_type.clone(),
                message,
            });
        }
    }

    debug!(
        "Lint found {} warning(s), {} node(s) changed",
        report.diagnostics.len(),
        report.changed.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use bf_model::{FieldValue, OptionKind, Slot, SlotKind};

    fn named(ws: &mut Workspace, key: &str, name: &str) -> NodeId {
        let id = ws.add_node("field_input").unwrap();
        ws.node_mut(id)
            .unwrap()
            .fields
            .insert(key.to_string(), FieldValue::text(name));
        id
    }

    #[test]
    fn test_case_folded_duplicates() {
        let mut ws = Workspace::new();
        let a = named(&mut ws, FIELD_NAME_KEY, "x");
        let b = named(&mut ws, FIELD_NAME_KEY, "X");
        let c = named(&mut ws, FIELD_NAME_KEY, "y");

        let results = check_duplicate_names(&ws, FIELD_NAME_KEY);
        assert_eq!(
            results[&a].as_deref(),
            Some("There are 2 field blocks with this name.")
        );
        assert!(results[&b].is_some());
        assert_eq!(results[&c], None);
    }

    #[test]
    fn test_disabling_one_clears_both() {
        let mut ws = Workspace::new();
        let a = named(&mut ws, FIELD_NAME_KEY, "x");
        let b = named(&mut ws, FIELD_NAME_KEY, "X");
        ws.set_enabled(b, false).unwrap();

        let results = check_duplicate_names(&ws, FIELD_NAME_KEY);
        assert_eq!(results[&a], None);
        assert_eq!(results[&b], None);
    }

    #[test]
    fn test_inherited_disable_excludes_nested_nodes() {
        let mut ws = Workspace::new();
        let outer = ws.add_node("factory_base").unwrap();
        ws.node_mut(outer)
            .unwrap()
            .slots
            .push(Slot::new("INPUTS", SlotKind::Statement, None));
        let a = named(&mut ws, INPUT_NAME_KEY, "NAME");
        let b = named(&mut ws, INPUT_NAME_KEY, "name");
        ws.attach(outer, "INPUTS", a).unwrap();

        assert!(check_duplicate_names(&ws, INPUT_NAME_KEY)[&b].is_some());
        ws.set_enabled(outer, false).unwrap();
        assert!(check_duplicate_names(&ws, INPUT_NAME_KEY)[&b].is_none());
    }

    #[test]
    fn test_blank_names_are_ignored() {
        let mut ws = Workspace::new();
        let a = named(&mut ws, FIELD_NAME_KEY, "");
        let b = named(&mut ws, FIELD_NAME_KEY, "");
        let results = check_duplicate_names(&ws, FIELD_NAME_KEY);
        assert_eq!(results[&a], None);
        assert_eq!(results[&b], None);
    }

    #[test]
    fn test_lint_sets_and_clears_warnings() {
        let mut ws = Workspace::new();
        let a = named(&mut ws, FIELD_NAME_KEY, "dup");
        let b = named(&mut ws, FIELD_NAME_KEY, "dup");

        let report = lint_workspace(&mut ws, &[FIELD_NAME_KEY, INPUT_NAME_KEY]);
        assert_eq!(report.diagnostics.len(), 2);
        assert!(ws.node(a).unwrap().warning.is_some());

        ws.set_field(b, FIELD_NAME_KEY, FieldValue::text("other")).unwrap();
        let report = lint_workspace(&mut ws, &[FIELD_NAME_KEY, INPUT_NAME_KEY]);
        assert!(report.is_clean());
        assert_eq!(report.changed, vec![a, b]);
        assert_eq!(ws.node(a).unwrap().warning, None);
    }

    #[test]
    fn test_empty_dropdown_wins_over_name_clash() {
        let mut ws = Workspace::new();
        let dropdown = named(&mut ws, FIELD_NAME_KEY, "NAME");
        ws.node_mut(dropdown).unwrap().mutation = MutationState::OptionKinds(vec![]);
        let _other = named(&mut ws, FIELD_NAME_KEY, "NAME");

        lint_workspace(&mut ws, &[FIELD_NAME_KEY]);
        assert_eq!(
            ws.node(dropdown).unwrap().warning.as_deref(),
            Some(EMPTY_DROPDOWN_MESSAGE)
        );

        ws.node_mut(dropdown).unwrap().mutation =
            MutationState::OptionKinds(vec![OptionKind::Text]);
        lint_workspace(&mut ws, &[FIELD_NAME_KEY]);
        assert_eq!(
            ws.node(dropdown).unwrap().warning.as_deref(),
            Some("There are 2 field blocks with this name.")
        );
    }
}
