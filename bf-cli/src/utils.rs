//! Helpers shared by the commands

use anyhow::{Context, Result};
use bf_compiler::{standard_registry, CompilerConfig};
use bf_editor::WorkspaceDocument;
use bf_model::Workspace;
use colored::*;
use std::path::Path;
use tracing::debug;

/// Configuration picked up from the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "blockforge.toml";

/// Load `blockforge.toml` from the working directory when present, with the
/// file named on the command line layered over it
pub fn load_config(path: Option<&Path>) -> Result<CompilerConfig> {
    load_layered_config(Path::new(DEFAULT_CONFIG_FILE), path)
}

fn load_layered_config(base: &Path, path: Option<&Path>) -> Result<CompilerConfig> {
    let mut config = CompilerConfig::default();
    if base.exists() {
        config.merge(
            CompilerConfig::from_file(base)
                .with_context(|| format!("Failed to load config from: {}", base.display()))?,
        );
    }
    if let Some(path) = path.filter(|p| *p != base) {
        config.merge(
            CompilerConfig::from_file(path)
                .with_context(|| format!("Failed to load config from: {}", path.display()))?,
        );
    }
    config.validate()?;
    debug!("Using configuration: {:?}", config);
    Ok(config)
}

pub async fn read_document(path: &Path) -> Result<WorkspaceDocument> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read: {}", path.display()))?;
    WorkspaceDocument::from_json(&content)
        .with_context(|| format!("Invalid workspace document: {}", path.display()))
}

/// Read a document and build its workspace against the standard registry
pub async fn load_workspace(path: &Path) -> Result<Workspace> {
    let doc = read_document(path).await?;
    let ws = doc
        .into_workspace(standard_registry()?)
        .with_context(|| format!("Failed to load workspace from: {}", path.display()))?;
    Ok(ws)
}

/// Write to `path`, or to stdout when no path is given
pub async fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(path, content)
                .await
                .with_context(|| format!("Failed to write: {}", path.display()))?;
        }
        None => print!("{}", content),
    }
    Ok(())
}

/// Print a styled header
pub fn print_header(title: &str) {
    println!("{}", title.bold().underline());
}

/// Print a warning message with consistent styling
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "Warning:".yellow().bold(), message);
}

/// Print a success message with consistent styling
pub fn print_success(message: &str) {
    eprintln!("{} {}", "Success:".green().bold(), message);
}
