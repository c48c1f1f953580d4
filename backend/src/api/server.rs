//! Static file server for the dashboard data.
//!
//! Serves the normalized outputs read-only, the way the dashboard fetches them.
//!
//! # Endpoints
//!
//! | Method | Path                              | Description                 |
//! |--------|-----------------------------------|-----------------------------|
//! | GET    | `/health`                         | Health check                |
//! | GET    | `/data/<year>/orcado.csv`         | Budget records              |
//! | GET    | `/data/<year>/realizado.csv`      | Actuals                     |
//! | GET    | `/data/metadata/equipamentos.json`| Equipment catalog           |

use axum::{
    http::{header, Method},
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::Path;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use super::logs::log_info;
use crate::error::{ServerError, ServerResult};

/// Routes for a data root.
pub fn router(data_dir: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .nest_service("/data", ServeDir::new(data_dir))
        .layer(cors)
}

/// Serve `data_dir` under `/data` until the process stops.
pub async fn start_server(data_dir: &Path, port: u16) -> ServerResult<()> {
    if !data_dir.is_dir() {
        return Err(ServerError::MissingDir(data_dir.to_path_buf()));
    }

    let app = router(data_dir);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    log_info(format!("🚀 Serving {} on http://localhost:{}", data_dir.display(), port));
    log_info("   GET /data/...  - Dashboard data files");
    log_info("   GET /health    - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "orcamento",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health() {
        let Json(body) = health().await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "orcamento");
    }

    #[tokio::test]
    async fn test_missing_data_dir() {
        let err = start_server(Path::new("/nonexistent/orcamento-data"), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::MissingDir(_)));
    }
}
