use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use walletgate_api::auth::{self, AppState, AppStateInner};
use walletgate_api::middleware::require_auth;

mod cleanup;

/// How often the background sweep reclaims expired challenges.
const SWEEP_INTERVAL_SECS: u64 = 60;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "walletgate=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("WALLETGATE_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let domain = std::env::var("WALLETGATE_DOMAIN").unwrap_or_else(|_| "localhost".into());
    let db_path = std::env::var("WALLETGATE_DB_PATH").unwrap_or_else(|_| "walletgate.db".into());
    let host = std::env::var("WALLETGATE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("WALLETGATE_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;

    // Init database
    let db = walletgate_db::Database::open(&PathBuf::from(&db_path))?;

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret,
        domain,
    });

    // Best-effort reclamation of expired challenges and stale revocations
    tokio::spawn(cleanup::run_sweep_loop(state.clone(), SWEEP_INTERVAL_SECS));

    // Routes
    let public_routes = Router::new()
        .route("/auth/web3/challenge", post(auth::challenge))
        .route("/auth/web3", post(auth::authenticate))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/auth/web3/logout", post(auth::logout))
        .route("/user", get(auth::current_user))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Walletgate server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
