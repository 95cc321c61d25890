//! Captor CLI and REST API entry point.
//!
//! Binary name: `captor`
//!
//! Parses CLI arguments, loads configuration, initializes logging, database
//! and services, then dispatches to the appropriate command handler or
//! starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use captor_infra::config::{load_config, resolve_data_dir};
use captor_observe::tracing_setup::{init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "captor", &mut std::io::stdout());
        return Ok(());
    }

    let data_dir = resolve_data_dir();
    let mut config = load_config(&data_dir).await;
    if let Some(filter) = cli.log_filter() {
        config.logging.filter = filter.to_string();
    }

    init_tracing(&config.logging).map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = async {
        let state = AppState::init(data_dir, config).await?;
        run(cli, state).await
    }
    .await;

    shutdown_tracing();
    result
}

async fn run(cli: Cli, state: AppState) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { port, host } => {
            let host = host.unwrap_or_else(|| state.server.host.clone());
            let port = port.unwrap_or(state.server.port);
            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            tracing::info!(%addr, "Captor API listening");
            if !cli.quiet {
                println!(
                    "  {} {} listening on {}",
                    console::style("⚡").bold(),
                    state.app_name,
                    console::style(format!("http://{addr}")).cyan()
                );
                println!("  {}", console::style("Press Ctrl+C to stop").dim());
            }

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            tracing::info!("Server stopped");
        }

        Commands::Status => {
            cli::status::status(&state, cli.json).await?;
        }

        Commands::Agents { user } => {
            cli::agent::list_agents(&state, &user, cli.json).await?;
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
