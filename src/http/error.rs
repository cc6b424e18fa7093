//! Rendering of domain errors as JSON responses.
//!
//! Body shape: `{"error": {"kind": "...", "message": "...", "productId": "..."}}`,
//! where `productId` is only present for stock failures.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::Error;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDetail {
    kind: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    product_id: Option<Uuid>,
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::EmptyCart
            | Self::InsufficientStock { .. }
            | Self::OrderNotCancellable
            | Self::InvalidStatus(_)
            | Self::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Store and internal details stay in the logs.
        let message = match &self {
            Self::Persistence(_) | Self::Internal(_) => {
                tracing::error!(error = %self, kind = self.kind(), "Request failed");
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };
        let product_id = match &self {
            Self::InsufficientStock { product_id } => Some(*product_id),
            _ => None,
        };

        let body = ErrorBody {
            error: ErrorDetail {
                kind: self.kind(),
                message,
                product_id,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}
