use std::{env, net::SocketAddr};

use axum::Router;
use common::utils::logging::init_logging_default;
use dotenvy::dotenv;
use migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::auth::{ServerAuthConfig, ServerState};
use crate::routes;

/// Initialize logging via shared common utils
fn init_logging() {
    init_logging_default();
}

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

/// Load host/port from configs or env vars, with sensible fallbacks
fn load_bind_addr(cfg: Option<&configs::AppConfig>) -> anyhow::Result<SocketAddr> {
    let (host, port) = match cfg {
        Some(cfg) => (cfg.server.host.clone(), cfg.server.port),
        None => {
            let host = env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
            let port = env::var("SERVER_PORT")
                .ok()
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(8081);
            (host, port)
        }
    };
    Ok(format!("{}:{}", host, port).parse()?)
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    // Optional config.toml; env vars cover the rest
    let cfg = configs::AppConfig::load_and_validate().ok();

    // DB connection
    let db = match cfg.as_ref() {
        Some(cfg) => models::db::connect_with(&cfg.database).await?,
        None => models::db::connect().await?,
    };

    // Schema and RBAC/admin seeding are idempotent
    migration::Migrator::up(&db, None).await?;
    service::bootstrap::run(&db).await?;

    // JWT secret
    let jwt_secret = cfg
        .as_ref()
        .map(|c| c.auth.jwt_secret.clone())
        .filter(|s| !s.trim().is_empty())
        .or_else(|| env::var("JWT_SECRET").ok())
        .unwrap_or_else(|| "dev-secret-change-me".to_string());
    let token_ttl_hours = cfg.as_ref().map(|c| c.auth.token_ttl_hours).unwrap_or(12);

    let state = ServerState {
        db,
        auth: ServerAuthConfig { jwt_secret, token_ttl_hours },
    };

    // Build router
    let app: Router = routes::build_router(build_cors(), state);

    // Bind and serve
    let addr = load_bind_addr(cfg.as_ref())?;
    info!(%addr, "starting server crate");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
