use axum::Json;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::OwnedMutexGuard;
use tracing::{info, warn};
use uuid::Uuid;

use docchat_core::prompt::build_prompt;
use docchat_model::backend::{BackendKind, TokenStream};

use crate::error::{ApiError, ApiJson};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(rename = "conversationId")]
    pub conversation_id: Uuid,
    /// Per-request backend override.
    pub model: Option<BackendKind>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

/// One chat turn: validate input, resolve the conversation's document
/// and history, invoke the backend in the configured response mode,
/// and record the completed turn.
///
/// A conversation without an uploaded document is served with a
/// generic assistant persona rather than rejected. Any failure leaves
/// the document store and conversation memory untouched.
pub async fn chat(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ChatRequest>,
) -> Result<Response, ApiError> {
    if request.message.trim().is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".to_string()));
    }

    let backend = state.backends.select(request.model)?;
    let conversation_id = request.conversation_id;

    // Serialize turns per conversation so concurrent requests cannot
    // interleave their memory appends.
    let guard = state
        .locks
        .for_conversation(conversation_id)
        .lock_owned()
        .await;

    let document = state.documents.get(conversation_id);
    let history = state.memory.history(conversation_id);

    info!(
        %conversation_id,
        model = backend.model_name(),
        has_document = document.is_some(),
        history_len = history.len(),
        "chat turn"
    );

    let prompt = build_prompt(
        document.as_ref(),
        &history,
        &request.message,
        state.config.max_document_chars,
    );

    if state.config.stream_responses {
        let tokens = backend.stream(&prompt).await?;
        let body = Body::from_stream(stream_turn(
            state.clone(),
            conversation_id,
            request.message,
            tokens,
            guard,
        ));
        Ok((
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            body,
        )
            .into_response())
    } else {
        let answer = backend.complete(&prompt).await?;
        state
            .memory
            .append(conversation_id, &request.message, &answer);
        Ok(Json(ChatResponse { response: answer }).into_response())
    }
}

/// Forward model fragments as response chunks, then record the turn.
///
/// The memory append runs strictly after the final fragment. When the
/// client disconnects, axum drops this stream: the partial turn is
/// discarded (never recorded) and dropping `guard` releases the
/// conversation. A mid-stream backend failure ends the body after the
/// fragments already delivered; those are not retracted.
fn stream_turn(
    state: AppState,
    conversation_id: Uuid,
    user_message: String,
    mut tokens: TokenStream,
    guard: OwnedMutexGuard<()>,
) -> impl Stream<Item = Result<Bytes, std::io::Error>> + Send {
    async_stream::stream! {
        let _guard = guard;
        let mut assembled = String::new();

        while let Some(item) = tokens.next().await {
            match item {
                Ok(fragment) => {
                    assembled.push_str(&fragment);
                    yield Ok(Bytes::from(fragment));
                }
                Err(e) => {
                    warn!(%conversation_id, error = %e, "model stream interrupted");
                    yield Err(std::io::Error::other(e.to_string()));
                    return;
                }
            }
        }

        state
            .memory
            .append(conversation_id, &user_message, &assembled);
        info!(%conversation_id, chars = assembled.len(), "streamed turn recorded");
    }
}
