//! CLI interface module
//!
//! This module provides command-line interface functionality for visitrack.

pub mod commands;

use std::fmt;

use crate::cli::{Commands, ConfigCommands};
use crate::codec::TokenCodec;
use crate::config::get_config;
use commands::{config_generate, decode_token, encode_id, show_visitor, whoami};

#[derive(Debug)]
pub enum CliError {
    StorageError(String),
    ParseError(String),
    CommandError(String),
}

impl CliError {
    /// Format as simple output
    pub fn format_simple(&self) -> String {
        match self {
            CliError::StorageError(msg) => format!("Storage error: {}", msg),
            CliError::ParseError(msg) => format!("Parse error: {}", msg),
            CliError::CommandError(msg) => format!("Command error: {}", msg),
        }
    }

    /// Format as colored output
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        match self {
            CliError::StorageError(msg) => {
                format!("{} {}", "Storage error:".red().bold(), msg.white())
            }
            CliError::ParseError(msg) => {
                format!("{} {}", "Parse error:".yellow().bold(), msg.white())
            }
            CliError::CommandError(msg) => {
                format!("{} {}", "Command error:".red().bold(), msg.white())
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for CliError {}

impl From<crate::errors::VisitrackError> for CliError {
    fn from(err: crate::errors::VisitrackError) -> Self {
        if err.is_persistence_failure() {
            CliError::StorageError(err.message().to_string())
        } else {
            CliError::CommandError(err.to_string())
        }
    }
}

/// 按配置构建编码器
fn codec_from_config() -> Result<TokenCodec, CliError> {
    let config = get_config();
    if config.visitor.hashids_key.trim().is_empty() {
        return Err(CliError::CommandError(
            "visitor.hashids_key is required".to_string(),
        ));
    }
    Ok(TokenCodec::new(
        &config.visitor.hashids_key,
        config.visitor.hashids_min_length,
    )?)
}

/// Run a CLI command from clap-parsed input
///
/// `Serve` is handled by the caller.
pub async fn run_cli_command(cmd: Commands) -> Result<(), CliError> {
    match cmd {
        Commands::Config {
            action: ConfigCommands::Generate { output_path, force },
        } => config_generate(output_path, force),

        Commands::Encode { visitor_id } => encode_id(&codec_from_config()?, visitor_id),

        Commands::Decode { token } => decode_token(&codec_from_config()?, &token),

        Commands::Show { target } => show_visitor(&codec_from_config()?, &target).await,

        Commands::Whoami => whoami().await,

        Commands::Serve => Err(CliError::CommandError(
            "serve is not a CLI command".to_string(),
        )),
    }
}
