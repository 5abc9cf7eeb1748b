use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{ser::SerializeMap, Serialize, Serializer};
use serde_json::json;

/// Failure of a single upstream (TMDb) call
///
/// Carries enough information for a caller to diagnose the failure without
/// retrying. Serializes to the `detail` object of a 502 response.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// The transport call itself failed (connection refused, timeout, DNS)
    #[error("Network error contacting TMDb: {detail}")]
    Network { detail: String },

    /// The body was not valid JSON
    #[error("Invalid response from TMDb (status {status_code})")]
    Decode { status_code: u16, text: String },

    /// The body parsed but the status was not 200
    #[error("TMDb returned status {status_code}: {message}")]
    Status { message: String, status_code: u16 },
}

impl Serialize for UpstreamError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            UpstreamError::Network { detail } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("error", "Network error contacting TMDb")?;
                map.serialize_entry("detail", detail)?;
                map.end()
            }
            UpstreamError::Decode { status_code, text } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("error", "Invalid response from TMDb")?;
                map.serialize_entry("status_code", status_code)?;
                map.serialize_entry("text", text)?;
                map.end()
            }
            UpstreamError::Status {
                message,
                status_code,
            } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("error", message)?;
                map.serialize_entry("status_code", status_code)?;
                map.end()
            }
        }
    }
}

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    /// The primary list call failed; the whole request is aborted
    #[error("{context}: {source}")]
    Aggregation {
        context: &'static str,
        source: UpstreamError,
    },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::MissingParameter(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::Aggregation { context, source } => (
                StatusCode::BAD_GATEWAY,
                json!({ "error": context, "detail": source }),
            ),
            AppError::HttpClient(_) => {
                (StatusCode::BAD_GATEWAY, json!({ "error": self.to_string() }))
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
