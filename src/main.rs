//! Imaging Gateway Server: DICOM upload intake and job tracking in front of
//! a remote processing service.
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use gateway_api::AppState;
use gateway_auth::{Authenticator, JwtEncoder};
use gateway_cache::{CacheManager, JobStore};
use gateway_core::config::AppConfig;
use gateway_core::error::AppError;
use gateway_core::traits::processing::ProcessingClient;
use gateway_entity::user::{Identity, UserRole};
use gateway_upstream::client::UpstreamClient;

#[derive(Debug, Parser)]
#[command(name = "gateway-server", version, about = "Imaging upload and job tracking gateway")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Print a bearer token signed with the configured secret
    IssueToken {
        /// User ID
        #[arg(long)]
        id: String,
        /// Email address
        #[arg(long)]
        email: String,
        /// Role name, e.g. "Radiologist" or "IT Administrator"
        #[arg(long)]
        role: String,
        /// Display name
        #[arg(long)]
        name: String,
        /// Hospital
        #[arg(long)]
        hospital: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    let result = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            init_logging(&config);
            run(config).await
        }
        Command::IssueToken {
            id,
            email,
            role,
            name,
            hospital,
        } => issue_token(&config, id, email, &role, name, hospital),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "Server error");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Load configuration from files and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("GATEWAY_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.server.environment,
        "Starting Imaging Gateway"
    );
    let config = Arc::new(config);

    // ── Step 1: Initialize cache ─────────────────────────────────
    tracing::info!(provider = %config.cache.provider, "Initializing cache");
    let cache = CacheManager::new(&config.cache).await?;

    // ── Step 2: Job store ────────────────────────────────────────
    let store = JobStore::new(cache, config.cache.job_ttl_seconds);
    match store.rebuild_indexes().await {
        Ok(count) => tracing::info!(count, "Job store ready"),
        Err(e) => tracing::warn!(error = %e, "Could not rebuild job indexes"),
    }

    // ── Step 3: Processing service client ────────────────────────
    let upstream = Arc::new(UpstreamClient::new());
    upstream.init(&config.upstream).await?;

    // ── Step 4: Authentication ───────────────────────────────────
    let authenticator = Arc::new(Authenticator::new(&config.auth)?);
    if !config.server.is_development() && config.auth.jwt_secret == "CHANGE_ME_IN_PRODUCTION" {
        tracing::warn!("auth.jwt_secret is the built-in default; set GATEWAY__AUTH__JWT_SECRET");
    }

    // ── Step 5: Application state and router ─────────────────────
    let state = AppState::new(
        Arc::clone(&config),
        store,
        Arc::clone(&upstream) as Arc<dyn ProcessingClient>,
        authenticator,
    );
    let jobs = Arc::clone(&state.jobs);
    let app = gateway_api::build_router(state);

    // ── Step 6: Start HTTP server ────────────────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::configuration(format!("Failed to bind {addr}: {e}")))?;
    tracing::info!(addr = %addr, upstream = %config.upstream.base_url, "Imaging Gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown...");
        })
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    // ── Step 7: Wait for in-flight forwards ──────────────────────
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    if !jobs.shutdown(grace).await {
        tracing::warn!(
            pending = jobs.in_flight(),
            "Some uploads were not forwarded before shutdown"
        );
    }

    // ── Step 8: Release the processing service client ────────────
    upstream.shutdown().await;

    tracing::info!("Imaging Gateway shut down gracefully");
    Ok(())
}

/// Sign and print a token for the given identity
fn issue_token(
    config: &AppConfig,
    id: String,
    email: String,
    role: &str,
    name: String,
    hospital: Option<String>,
) -> Result<(), AppError> {
    let identity = Identity {
        id,
        email,
        role: UserRole::from(role),
        name,
        hospital,
    };
    let issued = JwtEncoder::new(&config.auth).issue(&identity)?;
    println!("{}", issued.token);
    eprintln!("expires at {}", issued.expires_at.to_rfc3339());
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
}
