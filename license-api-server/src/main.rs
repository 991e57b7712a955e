//! License API server
//!
//! Verifies license keys and turns authenticated payment webhooks into
//! signed license keys.
//!
//! Usage:
//!   JWT_SECRET=... STRIPE_WEBHOOK_SECRET=... license-api-server --port 8787
//!
//! The server is stateless; secrets are read once at startup.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use license_api_core::SigningSecret;
use license_api_server::{AppState, build_router};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "license-api-server")]
#[command(about = "License key issuance and verification API")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8787")]
    port: u16,

    /// Secret used to sign and verify license keys
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    jwt_secret: String,

    /// Payment provider webhook signing secret
    #[arg(long, env = "STRIPE_WEBHOOK_SECRET", hide_env_values = true)]
    webhook_secret: String,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_state(self) -> Result<AppState> {
        AppState::from_secrets(
            SigningSecret::from(self.jwt_secret),
            SigningSecret::from(self.webhook_secret),
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    info!("License API starting...");
    let port = args.port;
    let state = Arc::new(args.into_state()?);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .with_context(|| format!("failed to bind port {port}"))?;
    info!("HTTP API listening on port {}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("HTTP server failed")?;

    Ok(())
}
