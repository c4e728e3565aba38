//! Block registry listing

use crate::utils::print_header;
use anyhow::Result;
use bf_compiler::{standard_registry, Language};
use bf_model::MutationKind;
use colored::*;

pub async fn blocks_command(lang: Option<&str>) -> Result<()> {
    let registry = standard_registry()?;
    let filter: Option<Language> = lang.map(str::parse::<Language>).transpose()?;

    let entries: Vec<_> = registry
        .entries()
        .filter(|entry| filter.map_or(true, |l| entry.generators.contains_key(&l)))
        .collect();

    print_header(&format!("{} block type(s)", entries.len()));
    for entry in entries {
        let languages: Vec<&str> = entry.languages().into_iter().map(Language::as_str).collect();
        let languages = if languages.is_empty() {
            "no generators".red().to_string()
        } else {
            languages.join(", ").green().to_string()
        };
        let mutation = match entry.shape.mutation_kind() {
            MutationKind::None => String::new(),
            kind => format!(" {}", kind.to_string().magenta()),
        };
        println!(
            "  {:<32} {}{}",
            entry.shape.block_type.cyan(),
            languages,
            mutation
        );
    }
    Ok(())
}
