use clap::Parser;
use stakeflow::adapter::inbound::cli::command::{Cli, Commands};
use stakeflow::adapter::inbound::cli::{run, show};
use stakeflow::infrastructure::config::settings::Config;
use tracing::error;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {e}", cli.config.display());
            std::process::exit(1);
        }
    };

    config.init_logging();

    let result = match &cli.command {
        Commands::Run(args) => run::execute(config, args).await,
        Commands::Show(args) => show::execute(&config, args).await,
    };

    if let Err(e) = result {
        error!(error = %e, "Fatal error");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
