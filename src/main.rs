use clap::Parser;
use colored::Colorize;

use visitrack::cli::{Cli, Commands};
use visitrack::config::{get_config, init_config};
use visitrack::system::logging::init_logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Serve);

    if command.needs_config()
        && let Err(e) = init_config(cli.config.as_deref())
    {
        eprintln!("{}", e.format_colored());
        std::process::exit(1);
    }

    if command == Commands::Serve {
        let _guard = init_logging(&get_config().logging)?;
        if let Err(e) = visitrack::runtime::modes::run_server().await {
            tracing::error!("Server exited with error: {:#}", e);
            eprintln!("{} {:#}", "[ERROR]".red().bold(), e);
            std::process::exit(1);
        }
        return Ok(());
    }

    if let Err(e) = visitrack::runtime::modes::run_cli(command).await {
        eprintln!("{}", e.format_colored());
        std::process::exit(1);
    }
    Ok(())
}
