//! Workspace display command

use crate::utils::{load_config, load_workspace, print_header};
use anyhow::Result;
use bf_model::{MutationState, NodeId, SlotKind, Workspace};
use colored::*;
use std::path::Path;

/// Display the workspace as a tree of chains and slots
pub async fn show_command(input: &Path, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let mut ws = load_workspace(input).await?;
    let keys: Vec<&str> = config.lint.name_keys.iter().map(String::as_str).collect();
    bf_editor::lint_workspace(&mut ws, &keys);

    print_header(&format!("{} ({} blocks)", input.display(), ws.len()));
    for top in ws.top_nodes() {
        print_chain(&ws, top, "");
    }
    Ok(())
}

fn print_chain(ws: &Workspace, head: NodeId, prefix: &str) {
    for id in ws.chain(head) {
        print_node(ws, id, prefix);
    }
}

fn print_node(ws: &Workspace, id: NodeId, prefix: &str) {
    let Some(node) = ws.get(id) else { return };

    let mut line = format!(
        "{}{} {}",
        prefix,
        id.to_string().dimmed(),
        node.block_type.cyan().bold()
    );
    if node.shadow {
        line.push_str(&" (shadow)".dimmed().to_string());
    }
    if !node.enabled {
        line.push_str(&" (disabled)".red().to_string());
    }
    if node.mutation != MutationState::None {
        line.push_str(&format!(" {}", format!("{:?}", node.mutation).magenta()));
    }
    println!("{}", line);

    let inner = format!("{}    ", prefix);
    for (name, value) in &node.fields {
        println!("{}{} = {}", inner, name, value.as_text().green());
    }
    if let Some(warning) = &node.warning {
        println!("{}{} {}", inner, "!".yellow().bold(), warning.yellow());
    }

    for slot in &node.slots {
        let kind = match slot.kind {
            SlotKind::Value => "value",
            SlotKind::Statement => "statement",
            SlotKind::Dummy => "row",
        };
        let check = slot
            .check
            .as_deref()
            .map(|c| format!(" <{}>", c))
            .unwrap_or_default();
        println!("{}[{}] {}{}", inner, slot.name.bold(), kind.dimmed(), check.dimmed());
        for (name, value) in &slot.fields {
            println!("{}    {} = {}", inner, name, value.as_text().green());
        }
        if let Some(target) = slot.target {
            let nested = format!("{}    ", inner);
            match slot.kind {
                SlotKind::Statement => print_chain(ws, target, &nested),
                _ => print_node(ws, target, &nested),
            }
        }
    }
}
