//! Blockforge CLI - generate code from block workspaces and inspect them

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use tracing::{error, info};

mod commands;
mod utils;

use commands::*;

/// Blockforge CLI
#[derive(Parser)]
#[command(name = "bf")]
#[command(about = "Generate Python or JavaScript from Blockforge workspaces")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate code from a workspace document
    Generate {
        /// Workspace document (.json)
        input: PathBuf,
        /// Target language (python, javascript)
        #[arg(short, long)]
        lang: Option<String>,
        /// Generate only the chain starting at this node id, as printed by
        /// `bf show` (ids are reassigned in document order on load)
        #[arg(short, long)]
        root: Option<u32>,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Report duplicate names, empty dropdowns and reserved block names
    Lint {
        /// Workspace document (.json)
        input: PathBuf,
        /// Name fields to check, comma separated
        #[arg(short, long, value_delimiter = ',')]
        keys: Option<Vec<String>>,
    },

    /// Display the blocks of a workspace as a tree
    Show {
        /// Workspace document (.json)
        input: PathBuf,
    },

    /// List registered block types
    Blocks {
        /// Only list blocks with a generator for this language
        #[arg(short, long)]
        lang: Option<String>,
    },

    /// List available target languages
    Targets,

    /// Load a document, upgrading legacy mutation records, and write it back
    Upgrade {
        /// Workspace document (.json)
        input: PathBuf,
        /// Output file (defaults to input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write a configuration file
    InitConfig {
        /// Destination path
        #[arg(short, long, default_value = "blockforge.toml")]
        output: PathBuf,
        /// Preset (default, python, javascript)
        #[arg(short, long, default_value = "default")]
        preset: String,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose)?;

    // Execute command
    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Generate {
            input,
            lang,
            root,
            output,
        } => generate_command(&input, lang.as_deref(), root, output.as_deref(), config).await,
        Commands::Lint { input, keys } => lint_command(&input, keys, config).await,
        Commands::Show { input } => show_command(&input, config).await,
        Commands::Blocks { lang } => blocks_command(lang.as_deref()).await,
        Commands::Targets => targets_command().await,
        Commands::Upgrade { input, output } => upgrade_command(&input, output.as_deref()).await,
        Commands::InitConfig {
            output,
            preset,
            force,
        } => init_config_command(&output, &preset, force).await,
    };

    match result {
        Ok(()) => {
            info!("Command completed successfully");
            Ok(())
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_root_help_points_at_show_ids() {
        let cmd = Cli::command();
        let generate = cmd.find_subcommand("generate").unwrap();
        let root = generate
            .get_arguments()
            .find(|arg| arg.get_id() == "root")
            .unwrap();
        assert!(root.get_help().unwrap().to_string().contains("bf show"));
    }

    #[test]
    fn test_generate_arguments_parse() {
        let cli = Cli::parse_from(["bf", "generate", "ws.json", "--root", "3", "-l", "js"]);
        match cli.command {
            Commands::Generate { root, lang, .. } => {
                assert_eq!(root, Some(3));
                assert_eq!(lang.as_deref(), Some("js"));
            }
            _ => panic!("expected generate"),
        }
    }
}
