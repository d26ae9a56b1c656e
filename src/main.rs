use std::env;
use std::path::{Path, PathBuf};

use axum::Router;
use tokio::net::TcpListener;

use anyhow::anyhow;

use cicerone::{ServiceConfig, routes, seed, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Initialize crypto provider for TLS connections
    // This must be done before any TLS connections are attempted
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install default crypto provider"))?;

    // Handle CLI commands
    let mut args = env::args();
    let _ = args.next();
    let mut config_path: Option<PathBuf> = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "seed" => {
                let script = args
                    .next()
                    .ok_or_else(|| anyhow!("`seed` requires a script path"))?;
                if let Some(extra) = args.next() {
                    anyhow::bail!("Unexpected argument '{extra}' after the seed script");
                }
                seed::run(Path::new(&script)).await?;
                return Ok(());
            }
            "-c" | "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                config_path = Some(PathBuf::from(path));
            }
            other => {
                anyhow::bail!(
                    "Unknown argument '{other}'. Supported: seed <script.json>, --config <file>"
                );
            }
        }
    }

    // Load configuration
    let config = match &config_path {
        Some(path) => ServiceConfig::from_file(path).map_err(|e| anyhow!(e.to_string()))?,
        None => ServiceConfig::from_env().map_err(|e| anyhow!(e.to_string()))?,
    };
    let address = config.address();
    println!("Starting server on {address}");

    // Create application state
    let app_state = AppState::new(config)
        .await
        .map_err(|e| anyhow!(e.to_string()))?;

    // Create narration API routes
    let api_routes = routes::api::create_api_router();

    // Create public health check routes
    let public_routes = Router::new()
        .route("/", axum::routing::get(cicerone::handlers::api::health_check))
        .route(
            "/api/health",
            axum::routing::get(cicerone::handlers::api::health_check),
        );

    let app = public_routes.merge(api_routes).with_state(app_state);

    // Create listener
    let listener = TcpListener::bind(&address).await?;

    println!("Server listening on {address}");

    // Start server
    axum::serve(listener, app).await?;

    Ok(())
}
