use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use tracing::{info, warn};

use crate::auth::AuthUser;
use crate::dataset_summary::summarize;
use crate::error::ApiError;
use crate::state::SharedState;
use crate::types::{UploadInfo, UploadResponse};

const FILE_FIELD: &str = "file";

pub async fn upload_info() -> Json<UploadInfo> {
    Json(UploadInfo {
        message: "Use POST to upload CSV file",
        note: "You must be logged in to upload.",
    })
}

pub async fn post_upload(
    State(state): State<SharedState>,
    user: AuthUser,
    mp: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let (name, bytes) = read_file_field(mp?).await?;
    if bytes.is_empty() {
        return Err(ApiError::EmptyFile);
    }

    // parse + summarize off the async runtime
    let reader = state.reader.clone();
    let preview_rows = state.config.preview_rows;
    let input = bytes.clone();
    let parsed = tokio::task::spawn_blocking(move || {
        let table = reader.read(&input)?;
        let summary = summarize(&table)?;
        Ok::<_, ApiError>((summary, table.head(preview_rows)))
    })
    .await
    .map_err(|e| ApiError::Internal(e.into()))?;

    let (summary, data_preview) = match parsed {
        Ok(v) => v,
        Err(e) => {
            info!(user=%user.username, "upload: rejected: {e}");
            return Err(e);
        }
    };

    let file = state.media.save_upload(name.as_deref(), &bytes).await?;

    let inserted = match state
        .store
        .insert_with_retention(&file, &summary, state.config.retention_cap)
        .await
    {
        Ok(v) => v,
        Err(e) => {
            // rolled back: the new file has no record
            if let Err(rm) = state.media.remove(&file).await {
                warn!(file=%file, "upload: orphan file left behind: {rm:?}");
            }
            return Err(e.into());
        }
    };

    for ev in &inserted.evicted {
        if let Err(e) = state.media.remove(&ev.file).await {
            warn!(id=ev.id, file=%ev.file, "upload: evicted file not removed: {e:?}");
        }
        info!(id=ev.id, "upload: evicted");
    }

    info!(
        id=inserted.record.id,
        user=%user.username,
        rows=summary.total_count,
        "upload: stored"
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "File uploaded successfully",
            summary,
            data_preview,
        }),
    ))
}

/// Pull the single `file` field out of the form; other fields are ignored.
async fn read_file_field(mut mp: Multipart) -> Result<(Option<String>, Bytes), ApiError> {
    let mut file: Option<(Option<String>, Bytes)> = None;

    while let Some(field) = mp.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        if file.is_some() {
            return Err(ApiError::TooManyFiles);
        }
        let name = field.file_name().map(str::to_owned);
        let bytes = field.bytes().await?;
        file = Some((name, bytes));
    }

    file.ok_or(ApiError::MissingFile)
}
