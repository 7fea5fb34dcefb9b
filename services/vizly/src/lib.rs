pub mod auth;
pub mod config;
pub mod dataset_store;
pub mod dataset_summary;
pub mod error;
pub mod media;
pub mod routes_auth;
pub mod routes_history;
pub mod routes_upload;
pub mod state;
pub mod types;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::{routing::{get, post}, Json, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::AppConfig;
use crate::state::SharedState;

pub fn router(state: SharedState) -> Router {
    let cors = cors_layer(&state.config);
    let body_limit = state.config.max_upload_bytes;

    let upload = get(routes_upload::upload_info).post(routes_upload::post_upload);

    Router::new()
        .route("/", get(home))
        .route("/api/upload/", upload.clone())
        .route("/api/upload", upload)
        .route("/api/history/", get(routes_history::get_history))
        .route("/api/history", get(routes_history::get_history))
        .route("/api/token/", post(routes_auth::obtain_token))
        .route("/api/token", post(routes_auth::obtain_token))
        .route("/api/token/refresh/", post(routes_auth::refresh_token))
        .route("/api/token/refresh", post(routes_auth::refresh_token))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

async fn home() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Welcome to Vizly API, backend is running successfully!"
    }))
}

fn cors_layer(cfg: &AppConfig) -> CorsLayer {
    if cfg.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = cfg
        .cors_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
