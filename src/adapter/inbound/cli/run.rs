//! Handler for the `run` command.

use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::adapter::inbound::cli::command::RunArgs;
use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::runtime;

/// Execute the run command. Ctrl-C lets the current tick finish, then stops.
pub async fn execute(config: Config, args: &RunArgs) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Interrupt received, stopping after the current tick");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => warn!(error = %e, "Failed to listen for interrupt"),
        }
        // A dropped sender also stops the loop.
        std::future::pending::<()>().await;
    });

    runtime::run_with_shutdown(config, shutdown_rx, args.ephemeral).await
}
