use axum::extract::{Multipart, State};
use axum::Json;
use bytes::Bytes;
use chrono::Utc;

use crate::errors::AppError;
use crate::intake::{process_upload, IntakePreview};
use crate::state::AppState;

const FILE_FIELD: &str = "file";

/// POST /api/v1/uploads
///
/// Multipart body with one `file` part (PDF, DOCX, TXT or a ZIP of them).
/// Returns the extracted records for review; nothing is stored.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IntakePreview>, AppError> {
    let mut upload: Option<(String, Bytes)> = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| "upload.pdf".to_string());
        let bytes = field.bytes().await?;
        upload = Some((file_name, bytes));
        break;
    }

    let Some((file_name, bytes)) = upload else {
        return Err(AppError::Validation(format!(
            "multipart field '{FILE_FIELD}' is required"
        )));
    };
    if bytes.is_empty() {
        return Err(AppError::Validation(format!("{file_name} is empty")));
    }

    let today = Utc::now().date_naive();
    let preview = process_upload(
        state.extractor.as_ref(),
        &file_name,
        bytes,
        state.config.max_upload_bytes,
        today,
    )
    .await?;
    Ok(Json(preview))
}
