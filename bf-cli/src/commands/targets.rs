//! Target language listing

use anyhow::Result;
use bf_compiler::{BackendFactory, Language};
use colored::*;

pub async fn targets_command() -> Result<()> {
    println!("{}", "Available targets:".bold());
    for name in BackendFactory::available_backends() {
        let language: Language = name.parse()?;
        println!("  {} (.{})", name.cyan(), language.file_extension());
    }
    Ok(())
}
