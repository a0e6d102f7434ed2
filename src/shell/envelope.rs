// The JSON envelope every response wears:
//   { "success": true,  "data": ..., "meta": ... }
//   { "success": false, "error": { "code": <status>, "message": ... } }

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;

use crate::application::errors::ApiError;

pub fn ok<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(json!({ "success": true, "data": data }))).into_response()
}

pub fn created<T: Serialize>(data: T) -> Response {
    (
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": data })),
    )
        .into_response()
}

pub fn ok_with_meta<T: Serialize, M: Serialize>(data: T, meta: M) -> Response {
    (
        StatusCode::OK,
        Json(json!({ "success": true, "data": data, "meta": meta })),
    )
        .into_response()
}

/// An `ApiError` on its way out of the edge.
#[derive(Debug)]
pub struct ApiFailure(pub ApiError);

impl ApiFailure {
    /// Internal errors are rewritten to `failed to <verb>` so store details
    /// never leak; every other kind renders its message verbatim.
    pub fn opaque(err: ApiError, verb: &str) -> Self {
        match err {
            ApiError::Internal(msg) => {
                tracing::error!(%msg, verb, "request failed");
                Self(ApiError::Internal(format!("failed to {verb}")))
            }
            other => Self(other),
        }
    }
}

impl From<ApiError> for ApiFailure {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            Json(json!({
                "success": false,
                "error": { "code": status.as_u16(), "message": self.0.to_string() }
            })),
        )
            .into_response()
    }
}
