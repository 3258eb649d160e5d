//! Command-line interface definitions using clap
//!
//! This module defines the CLI structure for visitrack using clap's derive macros.

use clap::{Parser, Subcommand};

/// Visitrack - cookie-backed repeat visitor identification
#[derive(Parser)]
#[command(name = "visitrack")]
#[command(version)]
#[command(about = "Cookie-backed repeat visitor identification service", long_about = None)]
pub struct Cli {
    /// Configuration file path (default: config.toml)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP server (default when no command is given)
    Serve,

    /// Encode a visitor id into its cookie token
    Encode {
        /// Visitor id (positive integer)
        visitor_id: u64,
    },

    /// Decode a cookie token back into the visitor id
    Decode {
        /// Cookie token
        token: String,
    },

    /// Print the stored visitor record as JSON
    ///
    /// Accepts either a numeric visitor id or a cookie token.
    /// A token is verified against the stored token before printing.
    Show {
        /// Visitor id or cookie token
        target: String,
    },

    /// Resolve the current process as a visitor (always a non-interactive client)
    Whoami,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

/// Configuration management commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Generate {
        /// Output path (default: config.example.toml)
        output_path: Option<String>,

        /// Force overwrite without confirmation
        #[arg(long)]
        force: bool,
    },
}

impl Commands {
    /// 是否需要加载完整配置（密钥、数据库）
    pub fn needs_config(&self) -> bool {
        !matches!(self, Commands::Config { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_server() {
        let cli = Cli::try_parse_from(["visitrack"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["visitrack", "encode", "42", "-c", "prod.toml"]).unwrap();
        assert_eq!(cli.config.as_deref(), Some("prod.toml"));
        assert_eq!(cli.command, Some(Commands::Encode { visitor_id: 42 }));
    }

    #[test]
    fn test_config_generate_does_not_need_config() {
        let cli = Cli::try_parse_from(["visitrack", "config", "generate", "out.toml"]).unwrap();
        let command = cli.command.unwrap();
        assert!(!command.needs_config());
        assert_eq!(
            command,
            Commands::Config {
                action: ConfigCommands::Generate {
                    output_path: Some("out.toml".into()),
                    force: false
                }
            }
        );
        assert!(Commands::Whoami.needs_config());
    }

    #[test]
    fn test_encode_rejects_negative_id() {
        assert!(Cli::try_parse_from(["visitrack", "encode", "-1"]).is_err());
    }
}
