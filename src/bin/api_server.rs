// API Server Binary Entry Point
//
// Usage: cargo run --features api --bin api_server

use deal_feasibility::{create_router, AppState, DataPaths};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (structured logging)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    // Default log level: info for our crate, warn for others
                    "deal_feasibility=info,tower_http=debug,axum=debug,warn".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting API server...");

    let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string());
    let deals_csv = std::env::var("DEALS_CSV").unwrap_or_else(|_| "deals.csv".to_string());
    let tiers_csv = std::env::var("TIERS_CSV").unwrap_or_else(|_| "mao_tiers.csv".to_string());
    let adjacency_json = std::env::var("ADJACENCY_JSON").unwrap_or_else(|_| "adjacency.json".to_string());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    tracing::info!("Configuration:");
    tracing::info!("  DATA_DIR: {}", data_dir);
    tracing::info!("  DEALS_CSV: {}", deals_csv);
    tracing::info!("  TIERS_CSV: {}", tiers_csv);
    tracing::info!("  ADJACENCY_JSON: {}", adjacency_json);
    tracing::info!("  PORT: {}", port);

    let paths = DataPaths::in_dir(&data_dir, &deals_csv, &tiers_csv, &adjacency_json);

    tracing::info!("Initializing application state...");
    let state = AppState::new(paths).await?;
    tracing::info!("Application state initialized successfully");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
