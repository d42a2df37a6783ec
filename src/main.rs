use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ticket_desk::auth::Credentials;
use ticket_desk::config::config;
use ticket_desk::{is_production, AppState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Store {
    Postgres,
    Memory,
}

#[derive(Parser)]
#[command(name = "ticket-desk")]
#[command(about = "Ticket tracking API server")]
#[command(version)]
struct Args {
    #[arg(long, help = "Port to listen on (overrides PORT)")]
    port: Option<u16>,

    #[arg(long, value_enum, default_value_t = Store::Postgres, help = "Backing store for users and tickets")]
    store: Store,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ticket_desk=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();

    // Initialize configuration (this loads the config singleton)
    let config = config();
    config.validate()?;
    info!("Starting ticket desk in {:?} mode", config.environment);

    let credentials = Credentials::from_config(&config.security)?;
    let state = match args.store {
        Store::Postgres => AppState::postgres(config, credentials).await?,
        Store::Memory => {
            if is_production!() {
                warn!("In-memory store selected in production; data will not survive a restart");
            }
            AppState::in_memory(credentials)
        }
    };

    let app = ticket_desk::app(state, config);

    let bind_addr = match args.port {
        Some(port) => format!("{}:{}", config.server.host, port),
        None => config.bind_address(),
    };
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Server is running on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
