use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

/// Envelope wrapping every endpoint's result.
///
/// `statusCode` mirrors the HTTP status, except that `204 No Content` is
/// delivered with HTTP 200 so the envelope body can still be sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status_code: u16,
    pub is_success: bool,
    pub error_messages: Vec<String>,
    #[schema(value_type = Option<Object>)]
    pub result: Option<serde_json::Value>,
}

impl ApiResponse {
    pub fn success(status: StatusCode) -> Self {
        Self {
            status_code: status.as_u16(),
            is_success: true,
            error_messages: Vec::new(),
            result: None,
        }
    }

    pub fn with_result<T: Serialize>(status: StatusCode, result: &T) -> Result<Self, AppError> {
        let result = serde_json::to_value(result).map_err(anyhow::Error::from)?;
        Ok(Self {
            result: Some(result),
            ..Self::success(status)
        })
    }

    pub fn failure(status: StatusCode, error_messages: Vec<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            is_success: false,
            error_messages,
            result: None,
        }
    }

    fn http_status(&self) -> StatusCode {
        match StatusCode::from_u16(self.status_code) {
            Ok(status) if status == StatusCode::NO_CONTENT => StatusCode::OK,
            Ok(status) => status,
            Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (self.http_status(), Json(self)).into_response()
    }
}
