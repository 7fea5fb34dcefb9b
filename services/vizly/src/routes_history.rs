use axum::extract::State;
use axum::Json;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::SharedState;
use crate::types::HistoryItem;

pub async fn get_history(
    State(state): State<SharedState>,
    _user: AuthUser,
) -> Result<Json<Vec<HistoryItem>>, ApiError> {
    let records = state.store.recent(state.config.retention_cap).await?;
    Ok(Json(records.into_iter().map(HistoryItem::from).collect()))
}
