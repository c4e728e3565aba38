//! Configuration file creation

use crate::utils::print_success;
use anyhow::{bail, Result};
use bf_compiler::config::presets;
use bf_compiler::CompilerConfig;
use std::path::Path;

pub async fn init_config_command(output: &Path, preset: &str, force: bool) -> Result<()> {
    if output.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", output.display());
    }
    let config = match preset {
        "default" => CompilerConfig::default(),
        "python" => presets::python_default(),
        "javascript" | "js" => presets::javascript_default(),
        other => bail!("Unknown preset: {} (expected default, python or javascript)", other),
    };
    config.to_file(output)?;
    print_success(&format!("Wrote configuration to {}", output.display()));
    Ok(())
}
