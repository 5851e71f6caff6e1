use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use docchat_extract::error::ExtractError;
use docchat_model::error::ModelError;

/// Unified API error type for all route handlers.
///
/// Internal detail is reduced to a short `details` string; nothing
/// here is fatal to the process.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Extraction(String),
    Model(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, None),
            ApiError::Extraction(details) => {
                tracing::error!(details = %details, "file processing failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "failed to process file".to_string(),
                    Some(details),
                )
            }
            ApiError::Model(details) => {
                tracing::error!(details = %details, "chat backend failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "chat backend error".to_string(),
                    Some(details),
                )
            }
        };

        (status, Json(ErrorBody { error, details })).into_response()
    }
}

impl From<ExtractError> for ApiError {
    fn from(e: ExtractError) -> Self {
        ApiError::Extraction(e.to_string())
    }
}

impl From<ModelError> for ApiError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::UnknownBackend(backend) => {
                ApiError::BadRequest(format!("unknown backend: {backend}"))
            }
            other => ApiError::Model(other.to_string()),
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for ApiError {
    fn from(e: axum::extract::multipart::MultipartError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

/// `axum::Json` with its rejection mapped into [`ApiError`], so a
/// malformed or incomplete request body gets the same `{error}` JSON
/// shape as every other 400 instead of axum's plain-text default.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}
