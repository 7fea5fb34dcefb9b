use axum::extract::State;
use axum::Json;
use tracing::{info, warn};

use crate::auth::{credentials_match, TokenKind};
use crate::error::ApiError;
use crate::state::SharedState;
use crate::types::{AccessToken, RefreshRequest, TokenPair, TokenRequest};

pub async fn obtain_token(
    State(state): State<SharedState>,
    Json(req): Json<TokenRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let cfg = &state.config;
    if !credentials_match(&req.username, &req.password, &cfg.username, &cfg.password) {
        warn!(username=%req.username, "auth: bad credentials");
        return Err(ApiError::InvalidCredentials);
    }

    info!(username=%req.username, "auth: token issued");
    Ok(Json(state.tokens.issue_pair(&req.username)))
}

pub async fn refresh_token(
    State(state): State<SharedState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<AccessToken>, ApiError> {
    let claims = state.tokens.verify(&req.refresh, TokenKind::Refresh)?;
    Ok(Json(AccessToken {
        access: state.tokens.issue(&claims.sub, TokenKind::Access),
    }))
}
