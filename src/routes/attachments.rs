use axum::extract::{Path, State};
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use crate::auth::extractor::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::state::SharedState;

/// Stream a stored upload back to a reviewer. The recorded filename is offered for
/// download; a row whose blob has gone missing is a 404, not a 500.
pub async fn download(
    _auth: AuthUser,
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let attachment = db::attachments::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound("Attachment not found".to_string()))?;

    let Some(blob) = state.storage.get(&attachment.storage_key).await? else {
        tracing::warn!(
            "Attachment {id} is recorded but {} has no object at {}",
            state.storage.name(),
            attachment.storage_key
        );
        return Err(AppError::NotFound("File is no longer available".to_string()));
    };

    let content_type = HeaderValue::from_str(&blob.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        attachment.filename.replace(['"', '\\'], "_")
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        blob.bytes,
    )
        .into_response())
}
