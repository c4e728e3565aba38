//! Document upgrade command

use crate::utils::{print_success, read_document, write_output};
use anyhow::{Context, Result};
use bf_compiler::standard_registry;
use bf_editor::WorkspaceDocument;
use std::path::Path;

/// Rewrite a document in the current format. Loading goes through the
/// mutation store, which upgrades legacy records.
pub async fn upgrade_command(input: &Path, output: Option<&Path>) -> Result<()> {
    let doc = read_document(input).await?;
    let ws = doc
        .into_workspace(standard_registry()?)
        .with_context(|| format!("Failed to load workspace from: {}", input.display()))?;
    let upgraded = WorkspaceDocument::from_workspace(&ws)?;

    let target = output.unwrap_or(input);
    write_output(Some(target), &upgraded.to_json()?).await?;
    print_success(&format!(
        "Upgraded {} block(s) into {}",
        ws.len(),
        target.display()
    ));
    Ok(())
}
