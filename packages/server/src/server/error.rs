//! API error envelope.
//!
//! Every failure surfaces as `{"error": <code>, "message": <text>}` with an
//! appropriate status. Internal errors are logged with detail but the
//! response body stays generic.

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use retrieval::{ExtractError, PipelineError};
use serde_json::json;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            code: "unauthorized",
            message: "missing or invalid authentication token".to_string(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            code: "not_found",
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "internal_error",
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = self.code, message = %self.message, "request failed");
        }
        let body = Json(json!({
            "error": self.code,
            "message": self.message,
        }));
        (self.status, body).into_response()
    }
}

impl From<ExtractError> for ApiError {
    fn from(e: ExtractError) -> Self {
        match e {
            ExtractError::InvalidFormat => {
                ApiError::bad_request("invalid_file", "file is not a valid PDF")
            }
            ExtractError::EmptyContent => {
                ApiError::bad_request("empty_document", "no extractable text in document")
            }
            ExtractError::FetchFailed { .. } | ExtractError::Parse(_) => {
                ApiError::bad_request("extraction_failed", e.to_string())
            }
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        let message = e.to_string();
        match e {
            PipelineError::Extract(extract) => extract.into(),
            PipelineError::Embed(_) | PipelineError::Store(_) => Self {
                status: StatusCode::BAD_GATEWAY,
                code: "retrieval_failed",
                message,
            },
            PipelineError::Generate(_) => Self {
                status: StatusCode::BAD_GATEWAY,
                code: "generation_failed",
                message,
            },
            PipelineError::Blob(_) | PipelineError::JsonParse(_) => ApiError::internal(message),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        ApiError::internal(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retrieval::{EmbedError, GenerateError};

    #[test]
    fn retrieval_and_generation_failures_get_distinct_codes() {
        let retrieval: ApiError =
            PipelineError::Embed(EmbedError::Provider { status: 503 }).into();
        assert_eq!(retrieval.status, StatusCode::BAD_GATEWAY);
        assert_eq!(retrieval.code, "retrieval_failed");

        let generation: ApiError =
            PipelineError::Generate(GenerateError::Provider { status: 500 }).into();
        assert_eq!(generation.status, StatusCode::BAD_GATEWAY);
        assert_eq!(generation.code, "generation_failed");
    }

    #[test]
    fn invalid_pdf_is_a_client_error() {
        let err: ApiError = ExtractError::InvalidFormat.into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "invalid_file");
    }
}
