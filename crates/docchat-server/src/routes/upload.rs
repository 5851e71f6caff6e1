use axum::Json;
use axum::extract::{Multipart, State};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use docchat_core::models::document::DocumentContext;

use crate::error::ApiError;
use crate::state::AppState;

/// Characters of extracted text echoed back to the client. The
/// preview always ends in an ellipsis, even for short documents.
const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    #[serde(rename = "fileName")]
    pub file_name: String,
    #[serde(rename = "conversationId")]
    pub conversation_id: Uuid,
    pub content_preview: String,
}

/// Accept a PDF, extract its text, and bind it to a conversation.
///
/// The conversation id is taken from the optional `conversationId`
/// field or freshly generated. The document store is only written
/// after extraction fully succeeds; a failed upload leaves any
/// previously stored document untouched.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut conversation_id: Option<Uuid> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                if field.content_type() != Some("application/pdf") {
                    return Err(ApiError::BadRequest(
                        "file must be a PDF (content-type application/pdf)".to_string(),
                    ));
                }
                let file_name = field.file_name().unwrap_or("upload.pdf").to_string();
                let bytes = field.bytes().await?;
                if bytes.len() > state.config.max_upload_bytes {
                    return Err(ApiError::BadRequest(format!(
                        "file exceeds the {} MiB upload limit",
                        state.config.max_upload_bytes / (1024 * 1024)
                    )));
                }
                file = Some((file_name, bytes.to_vec()));
            }
            Some("conversationId") => {
                let raw = field.text().await?;
                let id = raw
                    .trim()
                    .parse()
                    .map_err(|_| ApiError::BadRequest(format!("invalid conversationId: {raw:?}")))?;
                conversation_id = Some(id);
            }
            _ => {}
        }
    }

    let Some((file_name, bytes)) = file else {
        return Err(ApiError::BadRequest("missing file field".to_string()));
    };
    let conversation_id = conversation_id.unwrap_or_else(Uuid::new_v4);

    info!(%conversation_id, file_name, bytes = bytes.len(), "processing upload");

    // Extraction is CPU-bound and can take seconds for large files;
    // keep it off the async workers.
    let text = tokio::task::spawn_blocking(move || docchat_extract::extract_text(&bytes))
        .await
        .map_err(|e| ApiError::Extraction(e.to_string()))??;

    let mut content_preview: String = text.chars().take(PREVIEW_CHARS).collect();
    content_preview.push_str("...");

    state
        .documents
        .put(DocumentContext::new(conversation_id, &file_name, text));

    info!(%conversation_id, "document context stored");

    Ok(Json(UploadResponse {
        message: "File uploaded and processed successfully.".to_string(),
        file_name,
        conversation_id,
        content_preview,
    }))
}
