//! Code generation command

use crate::utils::{load_config, load_workspace, print_success, print_warning, write_output};
use anyhow::{Context, Result};
use bf_compiler::{Compiler, Language, MISSING_GENERATOR_PREFIX};
use bf_model::NodeId;
use std::path::Path;
use tracing::info;

pub async fn generate_command(
    input: &Path,
    lang: Option<&str>,
    root: Option<u32>,
    output: Option<&Path>,
    config: Option<&Path>,
) -> Result<()> {
    let compiler = Compiler::new(load_config(config)?)?;
    let language: Language = match lang {
        Some(lang) => lang.parse()?,
        None => compiler.default_language()?,
    };
    let ws = load_workspace(input).await?;

    let code = match root {
        Some(id) => compiler
            .generate(&ws, NodeId::new(id), language)
            .with_context(|| format!("Failed to generate from node {}", id))?,
        None => compiler.generate_workspace(&ws, language)?,
    };
    info!("Generated {} bytes of {}", code.len(), language);

    let missing = code.matches(MISSING_GENERATOR_PREFIX).count();
    if missing > 0 {
        print_warning(&format!(
            "{} block(s) have no {} generator",
            missing, language
        ));
    }

    write_output(output, &code).await?;
    if let Some(path) = output {
        print_success(&format!("Wrote {} code to {}", language, path.display()));
    }
    Ok(())
}
