//! HTTP translation of [`GleanError`].

use crate::error::GleanError;
use axum::extract::rejection::JsonRejection;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

/// JSON error body returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attempts: Vec<String>,
}

impl ErrorBody {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            attempts: Vec::new(),
        }
    }

    fn details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl GleanError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            GleanError::InvalidUrl(_)
            | GleanError::InvalidInput(_)
            | GleanError::WebhookVerification(_) => StatusCode::BAD_REQUEST,
            GleanError::Unauthorized => StatusCode::UNAUTHORIZED,
            GleanError::Forbidden(_) | GleanError::TranscriptsDisabled { .. } => {
                StatusCode::FORBIDDEN
            }
            GleanError::NotFound(_) | GleanError::NoTranscriptAvailable { .. } => {
                StatusCode::NOT_FOUND
            }
            GleanError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            GleanError::Provider(_) | GleanError::ResponseParse(_) => StatusCode::BAD_GATEWAY,
            GleanError::Config(_)
            | GleanError::ProviderUnconfigured(_)
            | GleanError::Io(_)
            | GleanError::Json(_)
            | GleanError::TomlParse(_)
            | GleanError::Http(_)
            | GleanError::Database(_)
            | GleanError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(self) -> ErrorBody {
        match self {
            GleanError::InvalidUrl(input) => {
                ErrorBody::new("Invalid YouTube URL").details(input)
            }
            GleanError::InvalidInput(msg) => ErrorBody::new("Invalid request").details(msg),
            GleanError::WebhookVerification(msg) => {
                ErrorBody::new("Webhook verification failed").details(msg)
            }
            GleanError::Unauthorized => ErrorBody::new("Unauthorized"),
            GleanError::Forbidden(msg) => ErrorBody::new("Forbidden").details(msg),
            GleanError::NotFound(msg) => ErrorBody::new("Not found").details(msg),
            GleanError::TranscriptsDisabled { attempts, .. } => ErrorBody {
                attempts,
                ..ErrorBody::new("Transcripts are disabled for this video")
            },
            GleanError::NoTranscriptAvailable { attempts, .. } => ErrorBody {
                attempts,
                ..ErrorBody::new("No transcript available for this video")
            },
            err @ GleanError::RateLimited { .. } => ErrorBody::new(err.to_string()),
            GleanError::Provider(msg) | GleanError::ResponseParse(msg) => {
                ErrorBody::new("Failed to analyze transcript").details(msg)
            }
            GleanError::ProviderUnconfigured(msg) => {
                ErrorBody::new("AI provider is not configured").details(msg)
            }
            GleanError::Config(msg) => ErrorBody::new("Server configuration error").details(msg),
            other => {
                error!("Internal error: {}", other);
                ErrorBody::new("Internal server error")
            }
        }
    }
}

impl IntoResponse for GleanError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let retry_after = match &self {
            GleanError::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        };

        if status.is_server_error() {
            warn!("Request failed with {}: {}", status, self);
        }

        let mut response = (status, Json(self.body())).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

impl From<JsonRejection> for GleanError {
    fn from(rejection: JsonRejection) -> Self {
        GleanError::InvalidInput(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            GleanError::InvalidUrl("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(GleanError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            GleanError::TranscriptsDisabled {
                video_id: "v".into(),
                attempts: vec![]
            }
            .status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            GleanError::NoTranscriptAvailable {
                video_id: "v".into(),
                attempts: vec![]
            }
            .status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GleanError::Provider("x".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            GleanError::ProviderUnconfigured("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = GleanError::RateLimited {
            retry_after_secs: 42,
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let body = GleanError::Internal("db path /secret".into()).body();
        assert_eq!(body.error, "Internal server error");
        assert!(body.details.is_none());
    }

    #[test]
    fn test_attempts_are_reported() {
        let body = GleanError::NoTranscriptAvailable {
            video_id: "v".into(),
            attempts: vec!["innertube [en] attempt 1: no transcript".into()],
        }
        .body();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["attempts"].as_array().unwrap().len(), 1);
        assert!(json.get("details").is_none());
    }
}
