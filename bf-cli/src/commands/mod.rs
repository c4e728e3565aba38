//! Command implementations for the bf CLI

pub mod blocks;
pub mod generate;
pub mod init_config;
pub mod lint;
pub mod show;
pub mod targets;
pub mod upgrade;

// Re-export command functions
pub use blocks::blocks_command;
pub use generate::generate_command;
pub use init_config::init_config_command;
pub use lint::lint_command;
pub use show::show_command;
pub use targets::targets_command;
pub use upgrade::upgrade_command;
