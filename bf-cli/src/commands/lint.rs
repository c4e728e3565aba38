//! Workspace lint command

use crate::utils::{load_config, load_workspace, print_header};
use anyhow::{bail, Result};
use bf_compiler::blocks::factory::check_reserved_names;
use bf_editor::lint_workspace;
use colored::*;
use std::path::Path;

pub async fn lint_command(
    input: &Path,
    keys: Option<Vec<String>>,
    config: Option<&Path>,
) -> Result<()> {
    let config = load_config(config)?;
    let mut ws = load_workspace(input).await?;

    let keys = keys.unwrap_or_else(|| config.lint.name_keys.clone());
    let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
    let mut diagnostics = lint_workspace(&mut ws, &keys).diagnostics;
    diagnostics.extend(check_reserved_names(&ws));

    if diagnostics.is_empty() {
        println!("{} {}", "✓".green(), "No warnings");
        return Ok(());
    }

    print_header(&format!("{} warning(s) in {}", diagnostics.len(), input.display()));
    for diagnostic in &diagnostics {
        println!(
            "  {} {} {}",
            diagnostic.node.to_string().dimmed(),
            diagnostic.block_type.cyan(),
            diagnostic.message.yellow()
        );
    }

    if config.lint.deny_warnings {
        bail!("{} warning(s) with deny_warnings set", diagnostics.len());
    }
    Ok(())
}
